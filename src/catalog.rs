//! Workout catalog: seeded on first use, read-only afterwards

use chrono::{DateTime, Utc};
use log::info;

use crate::storage::StorageService;
use crate::types::{Category, Difficulty, Workout};

/// The five workouts written to an empty store, in display order.
pub fn initial_workouts(created_at: DateTime<Utc>) -> Vec<Workout> {
    let workout = |id: &str,
                   name: &str,
                   description: &str,
                   duration: u32,
                   category: Category,
                   difficulty: Difficulty,
                   calories: u32| Workout {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        duration,
        category,
        difficulty,
        calories,
        created_at,
    };

    vec![
        workout(
            "1",
            "Full Body Workout",
            "A complete full-body routine focused on strength and endurance",
            45,
            Category::Strength,
            Difficulty::Intermediate,
            350,
        ),
        workout(
            "2",
            "Cardio Blast",
            "High-intensity cardio session for burning calories",
            30,
            Category::Cardio,
            Difficulty::Advanced,
            400,
        ),
        workout(
            "3",
            "Yoga Flow",
            "Relaxing yoga session for flexibility and mental balance",
            60,
            Category::Flexibility,
            Difficulty::Beginner,
            180,
        ),
        workout(
            "4",
            "HIIT Training",
            "High-intensity interval training for maximum results",
            20,
            Category::Hiit,
            Difficulty::Advanced,
            300,
        ),
        workout(
            "5",
            "Morning Stretch",
            "Light stretching for a good start to the day",
            15,
            Category::Flexibility,
            Difficulty::Beginner,
            80,
        ),
    ]
}

/// Case-insensitive substring match on the workout name. A blank query
/// keeps every workout; order is preserved either way.
pub fn filter(workouts: &[Workout], query: &str) -> Vec<Workout> {
    if query.trim().is_empty() {
        return workouts.to_vec();
    }

    let needle = query.to_lowercase();
    workouts
        .iter()
        .filter(|workout| workout.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Clone)]
pub struct WorkoutCatalog {
    storage: StorageService,
}

impl WorkoutCatalog {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    /// All workouts. An empty store is seeded with [`initial_workouts`]
    /// first; a non-empty one is returned as stored.
    pub async fn list(&self) -> Vec<Workout> {
        let saved = self.storage.get_workouts().await;
        if !saved.is_empty() {
            return saved;
        }

        let seeded = initial_workouts(Utc::now());
        self.storage.set_workouts(&seeded).await;
        info!("Seeded workout catalog with {} workouts", seeded.len());
        seeded
    }

    pub async fn find(&self, id: &str) -> Option<Workout> {
        self.list().await.into_iter().find(|workout| workout.id == id)
    }

    pub async fn search(&self, query: &str) -> Vec<Workout> {
        filter(&self.list().await, query)
    }
}
