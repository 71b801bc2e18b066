use thiserror::Error;

/// Failures of an HTTP adapter call, already shaped for the user.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's own wording for an HTTP failure, the full display text
    /// for everything else.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_prefers_server_message() {
        let err = AppError::Http {
            status: 409,
            message: "User already exists".to_string(),
        };
        assert_eq!(err.reason(), "User already exists");
        assert_eq!(
            AppError::Timeout("slow".to_string()).reason(),
            "Timeout: slow"
        );
    }
}
