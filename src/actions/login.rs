use std::sync::Arc;

use crate::events::PortalEvent;
use crate::rate_limit::{self, RateLimitResult, RateLimiter};
use crate::storage::{BrowserStorage, KeyValueStore, keys};
use crate::validators::{validate_email, validate_phone};
use crate::{CredentialValidator, Credentials, PortalError, Role, Session, SessionStore};

/// Where a successful login goes next.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub session: Session,
    /// Landing page for the role, relative to the app root.
    pub redirect_to: &'static str,
}

/// Signs a user in for a role.
///
/// Field checks run first and never count against the throttle; every
/// attempt that reaches the validator does.
pub struct LoginAction<V: CredentialValidator> {
    validator: V,
    sessions: Arc<SessionStore>,
    limiter: RateLimiter,
    durable: Arc<dyn KeyValueStore>,
}

impl<V: CredentialValidator> LoginAction<V> {
    pub fn new(
        validator: V,
        sessions: Arc<SessionStore>,
        limiter: RateLimiter,
        storage: &BrowserStorage,
    ) -> Self {
        LoginAction {
            validator,
            sessions,
            limiter,
            durable: Arc::clone(&storage.durable),
        }
    }

    /// # Returns
    ///
    /// - `Ok(LoginSuccess)` - session stored, remember-me applied
    /// - `Err(PortalError::MissingField(_))` / `Err(PortalError::Validation(_))` - form incomplete
    /// - `Err(PortalError::Throttled { .. })` - attempted again too soon
    /// - `Err(PortalError::InvalidCredentials)` - rejected by the validator
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, fields(role = %role), err)
    )]
    pub async fn execute(
        &self,
        role: Role,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<LoginSuccess, PortalError> {
        check_fields(role, credentials)?;

        let events = self.sessions.events();
        let now = self.sessions.clock().utc();

        if let RateLimitResult::Limited { retry_after, message } =
            self.limiter.hit(rate_limit::LOGIN, "").await?
        {
            events
                .dispatch(PortalEvent::LoginThrottled { retry_after, at: now })
                .await;
            log::info!(
                target: "campusgate",
                "msg=\"login throttled\", retry_after={retry_after}"
            );
            return Err(PortalError::Throttled { retry_after, message });
        }

        let user = match self.validator.validate(role, credentials).await {
            Ok(user) => user,
            Err(e) => {
                events
                    .dispatch(PortalEvent::LoginFailed {
                        role,
                        reason: e.to_string(),
                        at: now,
                    })
                    .await;
                log::info!(
                    target: "campusgate",
                    "msg=\"login failed\", role={role}"
                );
                return Err(e);
            }
        };

        let session = self.sessions.set_session(role, user.user_data).await?;

        if remember_me {
            self.durable.set(keys::REMEMBER_ME, "true")?;
        } else {
            self.durable.remove(keys::REMEMBER_ME)?;
        }

        events
            .dispatch(PortalEvent::LoginSucceeded { role, at: now })
            .await;

        log::info!(
            target: "campusgate",
            "msg=\"login success\", role={role}, remember_me={remember_me}"
        );

        Ok(LoginSuccess {
            session,
            redirect_to: role.landing_page(),
        })
    }
}

fn check_fields(role: Role, credentials: &Credentials) -> Result<(), PortalError> {
    if role.uses_email_login() {
        let email = credentials.email.as_deref().unwrap_or_default().trim();
        if email.is_empty() {
            return Err(PortalError::MissingField("email address"));
        }
        validate_email(email)?;
        if credentials.secret.is_empty() {
            return Err(PortalError::MissingField("password"));
        }
    } else {
        let phone = credentials.phone.as_deref().unwrap_or_default().trim();
        if phone.is_empty() {
            return Err(PortalError::MissingField("phone number"));
        }
        validate_phone(phone)?;
        if credentials.secret.is_empty() {
            return Err(PortalError::MissingField("OTP or Password"));
        }
    }
    Ok(())
}
