//! Records persisted by the app: the user profile, workouts and the theme

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locally persisted user profile.
///
/// `id` is assigned by the authentication provider; the name and phone fields
/// are entered by the user on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

impl User {
    /// A profile with empty name and phone fields for a freshly authenticated user
    pub fn placeholder(id: &str, email: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            email: email.unwrap_or_default().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Workout category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Strength,
    Cardio,
    Flexibility,
    #[serde(rename = "HIIT")]
    Hiit,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Cardio => "Cardio",
            Self::Flexibility => "Flexibility",
            Self::Hiit => "HIIT",
        }
    }

    /// Chip colour used by the list and detail screens
    pub fn color(&self) -> &'static str {
        match self {
            Self::Strength => "#FF6B6B",
            Self::Cardio => "#4ECDC4",
            Self::Flexibility => "#95E1D3",
            Self::Hiit => "#F38181",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workout difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Beginner => "#A8E6CF",
            Self::Intermediate => "#FFD93D",
            Self::Advanced => "#FF6B6B",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workout in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Duration in minutes
    pub duration: u32,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Estimated calories burned
    pub calories: u32,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// One-line summary shown under the title on the detail screen
    pub fn summary(&self) -> String {
        format!(
            "{} · {} · {} min · ~{} kcal",
            self.category, self.difficulty, self.duration, self.calories
        )
    }
}

/// Global colour theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}
