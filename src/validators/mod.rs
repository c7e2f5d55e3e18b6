pub mod email;
pub mod phone;

pub use email::validate_email;
pub use phone::{normalize_phone, validate_phone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    PhoneEmpty,
    PhoneInvalidLength,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Please enter your email address"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Please enter a valid email address"),
            Self::PhoneEmpty => write!(f, "Please enter your phone number"),
            Self::PhoneInvalidLength => write!(f, "Please enter a valid phone number"),
        }
    }
}

impl std::error::Error for ValidationError {}
