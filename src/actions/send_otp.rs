use std::sync::Arc;

use mockable::Clock;

use crate::credentials::phone_suffix;
use crate::events::{EventRegistry, PortalEvent};
use crate::rate_limit::{self, RateLimiter};
use crate::validators::{normalize_phone, validate_phone};
use crate::{OtpSender, PortalError};

/// Sends a one-time password, at most once per window per phone number.
pub struct SendOtpAction<S: OtpSender> {
    sender: S,
    limiter: RateLimiter,
    events: Arc<EventRegistry>,
    clock: Arc<dyn Clock>,
}

impl<S: OtpSender> SendOtpAction<S> {
    pub fn new(
        sender: S,
        limiter: RateLimiter,
        events: Arc<EventRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        SendOtpAction {
            sender,
            limiter,
            events,
            clock,
        }
    }

    /// Formatting differences don't dodge the throttle: `+91 98765-43210`
    /// and `919876543210` share one slot. A failed delivery frees the slot
    /// so the user can retry at once.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "send_otp", skip_all, err)
    )]
    pub async fn execute(&self, phone: &str) -> Result<(), PortalError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(PortalError::MissingField("phone number"));
        }
        validate_phone(phone)?;

        let subject = normalize_phone(phone);
        self.limiter
            .hit(rate_limit::OTP, &subject)
            .await?
            .into_result()?;

        if let Err(e) = self.sender.send(phone).await {
            log::warn!(
                target: "campusgate",
                "msg=\"otp delivery failed\", phone_suffix={}, error=\"{e}\"",
                phone_suffix(&subject)
            );
            self.limiter.clear(rate_limit::OTP, &subject).await?;
            return Err(PortalError::OtpDeliveryFailed);
        }

        let suffix = phone_suffix(&subject);
        self.events
            .dispatch(PortalEvent::OtpSent {
                phone_suffix: suffix.clone(),
                at: self.clock.utc(),
            })
            .await;

        log::info!(
            target: "campusgate",
            "msg=\"otp sent\", phone_suffix={suffix}"
        );

        Ok(())
    }
}
