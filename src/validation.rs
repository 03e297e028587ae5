//! Form checks run before credentials or profile edits are submitted

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern compiles")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-\s()]{9,}$").expect("phone pattern compiles"));

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    FirstName,
    LastName,
    PhoneNumber,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::PhoneNumber => "phoneNumber",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every failed check of one form, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn add(&mut self, field: Field, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message for `field`, as shown under the input
    pub fn message(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field.as_str(), error.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add(Field::Email, "Email is required");
    } else if !EMAIL.is_match(email) {
        errors.add(Field::Email, "Invalid email format");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(Field::Password, "Password must be at least 6 characters");
    }
}

fn check_name(errors: &mut ValidationErrors, field: Field, label: &str, value: &str) {
    if value.is_empty() {
        errors.add(field, &format!("{} is required", label));
    } else if value.chars().count() < MIN_NAME_LEN {
        errors.add(field, &format!("{} must be at least 2 characters", label));
    }
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

pub fn validate_sign_up(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    if confirm_password.is_empty() {
        errors.add(Field::ConfirmPassword, "Please confirm the password");
    } else if confirm_password != password {
        errors.add(Field::ConfirmPassword, "Passwords do not match");
    }
    errors.into_result()
}

pub fn validate_profile(
    first_name: &str,
    last_name: &str,
    phone_number: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_name(&mut errors, Field::FirstName, "First name", first_name);
    check_name(&mut errors, Field::LastName, "Last name", last_name);
    if phone_number.is_empty() {
        errors.add(Field::PhoneNumber, "Phone number is required");
    } else if !PHONE.is_match(phone_number) {
        errors.add(Field::PhoneNumber, "Invalid phone number format");
    }
    errors.into_result()
}
