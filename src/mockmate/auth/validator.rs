//! Per-field rules for the credential form. Validation is pure: it never
//! touches the network and never fails, it reports.

use crate::mockmate::auth::{form::CredentialForm, types::FormMode};
use regex::Regex;
use secrecy::ExposeSecret;
use std::fmt;

pub const MIN_NAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Password,
    ProfileImage,
    Resume,
}

impl FormField {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
            Self::ProfileImage => "profile picture",
            Self::Resume => "resume",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: FormField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.reason)
    }
}

/// Outcome of validating a form; empty means every field passed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn error_for(&self, field: FormField) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }

    pub(crate) fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }
}

impl From<FieldError> for ValidationReport {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Validates the form according to its mode.
#[must_use]
pub fn validate(form: &CredentialForm) -> ValidationReport {
    let mut report = ValidationReport::default();

    if form.mode() == FormMode::SignUp {
        let name = form.name().trim();
        if name.is_empty() {
            report.push(FieldError::new(FormField::Name, "Name is required"));
        } else if name.chars().count() < MIN_NAME_LENGTH {
            report.push(FieldError::new(
                FormField::Name,
                format!("Name must be at least {MIN_NAME_LENGTH} characters"),
            ));
        }
    }

    let email = form.email().trim();
    if email.is_empty() {
        report.push(FieldError::new(FormField::Email, "Email is required"));
    } else if !valid_email(email) {
        report.push(FieldError::new(FormField::Email, "Invalid email address"));
    }

    let password = form.password().expose_secret();
    if password.is_empty() {
        report.push(FieldError::new(FormField::Password, "Password is required"));
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        report.push(FieldError::new(
            FormField::Password,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }

    report
}
