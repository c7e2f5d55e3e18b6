//! Login page actions.
//!
//! Each action is built once with its collaborators and exposes a single
//! `execute` method:
//!
//! | Action | Description |
//! |--------|-------------|
//! | [`LoginAction`] | Validates the form, throttles, signs in, applies remember-me |
//! | [`SendOtpAction`] | Sends a one-time password with a per-phone resend window |
//! | [`LogoutAction`] | Clears the session and returns to the login page |

pub mod login;
pub mod logout;
pub mod send_otp;

pub use login::{LoginAction, LoginSuccess};
pub use logout::LogoutAction;
pub use send_otp::SendOtpAction;
