//! Credential checking behind a trait.
//!
//! Real authentication is a server-side concern; the portal only needs
//! something that turns a role and credentials into display data for the
//! session. [`DemoCredentialValidator`] is the non-production stand-in used
//! when no server is wired up.

use async_trait::async_trait;

use crate::session::{Role, UserData};
use crate::validators::normalize_phone;
use crate::{PortalError, SecretString};

/// What the login form collected.
///
/// Super-admins sign in with an email address; every other role with a
/// phone number. `secret` is the password or the OTP.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secret: SecretString,
}

impl Credentials {
    pub fn with_email(email: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            email: Some(email.into()),
            phone: None,
            secret: password.into(),
        }
    }

    pub fn with_phone(phone: impl Into<String>, secret: impl Into<SecretString>) -> Self {
        Self {
            email: None,
            phone: Some(phone.into()),
            secret: secret.into(),
        }
    }
}

/// The user a validator vouched for.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub role: Role,
    pub user_data: UserData,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Option<&str> {
        self.user_data.get("id").map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.user_data.get("name").map(String::as_str)
    }
}

#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Returns the signed-in user, or [`PortalError::InvalidCredentials`].
    async fn validate(
        &self,
        role: Role,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, PortalError>;
}

/// Delivers one-time passwords to a phone number.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, phone: &str) -> Result<(), PortalError>;
}

/// Fixed demo passwords. Never use outside demos and tests.
///
/// | Role | Login | Secret |
/// |------|-------|--------|
/// | super-admin | `admin@platform.com` | `admin123` |
/// | school-admin | any phone, 10+ digits | `123456` |
/// | teacher | any phone, 10+ digits | `teacher123` |
/// | parent-student | any phone, 10+ digits | `parent123` |
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCredentialValidator;

const DEMO_ADMIN_EMAIL: &str = "admin@platform.com";

impl DemoCredentialValidator {
    pub fn new() -> Self {
        Self
    }

    fn demo_secret(role: Role) -> &'static str {
        match role {
            Role::SuperAdmin => "admin123",
            Role::SchoolAdmin => "123456",
            Role::Teacher => "teacher123",
            Role::ParentStudent => "parent123",
        }
    }

    fn is_valid(role: Role, credentials: &Credentials) -> bool {
        let secret_matches = credentials.secret.expose_secret() == Self::demo_secret(role);

        let login_matches = match role {
            Role::SuperAdmin => credentials
                .email
                .as_deref()
                .is_some_and(|email| email.trim().eq_ignore_ascii_case(DEMO_ADMIN_EMAIL)),
            _ => credentials
                .phone
                .as_deref()
                .is_some_and(|phone| normalize_phone(phone).len() >= 10),
        };

        secret_matches && login_matches
    }

    fn user_data(role: Role, credentials: &Credentials) -> UserData {
        let phone = credentials.phone.as_deref().unwrap_or_default().trim();
        let suffix = phone_suffix(phone);

        let mut data = UserData::new();
        data.insert("role".to_owned(), role.as_str().to_owned());

        let mut put = |key: &str, value: String| {
            data.insert(key.to_owned(), value);
        };

        match role {
            Role::SuperAdmin => {
                put("id", "SA001".to_owned());
                put("name", "Super Admin".to_owned());
                put("email", DEMO_ADMIN_EMAIL.to_owned());
            }
            Role::SchoolAdmin => {
                put("id", format!("SCHADM_{suffix}"));
                put("name", "Principal (Demo)".to_owned());
                put("phone", phone.to_owned());
                put("school", "Greenwood High School".to_owned());
            }
            Role::Teacher => {
                put("id", format!("T_{suffix}"));
                put("name", format!("Teacher {suffix}"));
                put("phone", phone.to_owned());
                put("classes", "Class 8B, Class 5A".to_owned());
            }
            Role::ParentStudent => {
                put("id", format!("P_{suffix}"));
                put("name", format!("Parent {suffix}"));
                put("phone", phone.to_owned());
                put("studentId", format!("S_{suffix}"));
                put("studentName", format!("Student {suffix}"));
                put("studentClass", "Class 5A".to_owned());
            }
        }

        data
    }
}

#[async_trait]
impl CredentialValidator for DemoCredentialValidator {
    async fn validate(
        &self,
        role: Role,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, PortalError> {
        if !Self::is_valid(role, credentials) {
            return Err(PortalError::InvalidCredentials);
        }

        Ok(AuthenticatedUser {
            role,
            user_data: Self::user_data(role, credentials),
        })
    }
}

/// Accepts every send. Stands in for an SMS gateway in demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoOtpSender;

#[async_trait]
impl OtpSender for DemoOtpSender {
    async fn send(&self, phone: &str) -> Result<(), PortalError> {
        log::debug!(
            target: "campusgate",
            "msg=\"demo otp accepted\", phone_suffix={}",
            phone_suffix(phone)
        );
        Ok(())
    }
}

/// Last four characters of a phone number, `0000` when there's nothing.
pub(crate) fn phone_suffix(phone: &str) -> String {
    let phone = phone.trim();
    if phone.is_empty() {
        return "0000".to_owned();
    }
    let chars: Vec<char> = phone.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_super_admin_demo_login() {
        let validator = DemoCredentialValidator::new();

        let user = validator
            .validate(
                Role::SuperAdmin,
                &Credentials::with_email("Admin@Platform.com", "admin123"),
            )
            .await
            .unwrap();

        assert_eq!(user.id(), Some("SA001"));
        assert_eq!(user.name(), Some("Super Admin"));
        assert_eq!(user.user_data.get("role").map(String::as_str), Some("super-admin"));
    }

    #[tokio::test]
    async fn test_phone_roles_derive_ids_from_suffix() {
        let validator = DemoCredentialValidator::new();

        let teacher = validator
            .validate(Role::Teacher, &Credentials::with_phone("98765 43210", "teacher123"))
            .await
            .unwrap();
        assert_eq!(teacher.id(), Some("T_3210"));
        assert_eq!(teacher.name(), Some("Teacher 3210"));

        let admin = validator
            .validate(Role::SchoolAdmin, &Credentials::with_phone("9876543210", "123456"))
            .await
            .unwrap();
        assert_eq!(admin.id(), Some("SCHADM_3210"));
        assert_eq!(
            admin.user_data.get("school").map(String::as_str),
            Some("Greenwood High School")
        );

        let parent = validator
            .validate(
                Role::ParentStudent,
                &Credentials::with_phone("9123456789", "parent123"),
            )
            .await
            .unwrap();
        assert_eq!(parent.id(), Some("P_6789"));
        assert_eq!(parent.user_data.get("studentId").map(String::as_str), Some("S_6789"));
    }

    #[tokio::test]
    async fn test_rejects_wrong_secret_and_short_phone() {
        let validator = DemoCredentialValidator::new();

        let wrong_secret = validator
            .validate(Role::Teacher, &Credentials::with_phone("9876543210", "parent123"))
            .await;
        assert_eq!(wrong_secret.unwrap_err(), PortalError::InvalidCredentials);

        let short_phone = validator
            .validate(Role::Teacher, &Credentials::with_phone("98765", "teacher123"))
            .await;
        assert_eq!(short_phone.unwrap_err(), PortalError::InvalidCredentials);

        let wrong_email = validator
            .validate(
                Role::SuperAdmin,
                &Credentials::with_email("someone@platform.com", "admin123"),
            )
            .await;
        assert_eq!(wrong_email.unwrap_err(), PortalError::InvalidCredentials);
    }

    #[test]
    fn test_phone_suffix() {
        assert_eq!(phone_suffix("9876543210"), "3210");
        assert_eq!(phone_suffix("12"), "12");
        assert_eq!(phone_suffix("  "), "0000");
    }
}
