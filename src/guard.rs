//! Per-page session and role check.
//!
//! [`AccessGuard::protect`] runs once per page render, before page-specific
//! logic. It never touches the login page, sends visitors without a session to
//! the login entry point, and otherwise fills user-info slots and hides
//! elements gated on another role.

use std::fmt;
use std::sync::Arc;

use crate::session::{Lookup, Session, SessionStore, is_login_page, login_path_for};

/// An element showing one field of the signed-in user (`data-user-info`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoSlot {
    pub element: String,
    /// Key looked up in the session's user data.
    pub key: String,
}

/// An element only meant for one role (`data-role`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
    pub element: String,
    /// Raw attribute value, compared against the role's kebab-case name.
    pub required_role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementError(pub String);

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ElementError {}

/// The annotated elements of the rendered page.
pub trait PageElements: Send + Sync {
    fn user_info_slots(&self) -> Vec<UserInfoSlot>;

    fn role_gates(&self) -> Vec<RoleGate>;

    /// Sets the element's text content (never markup).
    fn set_text(&self, element: &str, text: &str) -> Result<(), ElementError>;

    fn hide(&self, element: &str) -> Result<(), ElementError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The login page always renders, signed in or not.
    LoginPage,
    Redirected { to: String },
    Rendered {
        populated: usize,
        hidden: usize,
        /// Elements that could not be updated; each was logged.
        failures: usize,
    },
}

pub struct AccessGuard {
    sessions: Arc<SessionStore>,
}

impl AccessGuard {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "access_guard", skip_all)
    )]
    pub async fn protect(&self, page: &dyn PageElements) -> GuardOutcome {
        let navigator = self.sessions.navigator();
        let current_path = navigator.current_path();

        if is_login_page(&current_path) {
            return GuardOutcome::LoginPage;
        }

        let session = match self.sessions.lookup().await {
            Lookup::Live(session) => session,
            Lookup::Missing | Lookup::Expired => {
                let to = login_path_for(&current_path);
                log::info!(
                    target: "campusgate",
                    "msg=\"no session, redirecting\", from=\"{current_path}\", to=\"{to}\""
                );
                navigator.redirect(&to);
                return GuardOutcome::Redirected { to };
            }
        };

        let mut failures = 0;
        let populated = populate_user_info(page, &session, &mut failures);
        let hidden = hide_foreign_role_elements(page, &session, &mut failures);

        GuardOutcome::Rendered {
            populated,
            hidden,
            failures,
        }
    }
}

fn populate_user_info(page: &dyn PageElements, session: &Session, failures: &mut usize) -> usize {
    let mut populated = 0;

    for slot in page.user_info_slots() {
        let Some(value) = session.user_field(&slot.key).filter(|v| !v.is_empty()) else {
            continue;
        };

        match page.set_text(&slot.element, value) {
            Ok(()) => populated += 1,
            Err(e) => {
                *failures += 1;
                log::error!(
                    target: "campusgate",
                    "msg=\"error setting user info\", element=\"{}\", key=\"{}\", error=\"{e}\"",
                    slot.element,
                    slot.key
                );
            }
        }
    }

    populated
}

fn hide_foreign_role_elements(
    page: &dyn PageElements,
    session: &Session,
    failures: &mut usize,
) -> usize {
    let mut hidden = 0;

    for gate in page.role_gates() {
        if gate.required_role == session.role.as_str() {
            continue;
        }

        match page.hide(&gate.element) {
            Ok(()) => hidden += 1,
            Err(e) => {
                *failures += 1;
                log::error!(
                    target: "campusgate",
                    "msg=\"error updating role element\", element=\"{}\", error=\"{e}\"",
                    gate.element
                );
            }
        }
    }

    hidden
}
