//! Tab-scoped session lifecycle.
//!
//! A [`Session`] asserts which [`Role`] is signed in and until when. Exactly
//! one session exists per tab; it is created on login, read on every page
//! load and destroyed on logout or when found expired.

mod navigation;
mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use navigation::{LOGIN_PAGE, Navigator, is_login_page, login_path_for};
pub(crate) use store::Lookup;
pub use store::SessionStore;

/// Display fields of the signed-in user, looked up by exact key.
pub type UserData = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    ParentStudent,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::SchoolAdmin,
        Role::Teacher,
        Role::ParentStudent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::SchoolAdmin => "school-admin",
            Role::Teacher => "teacher",
            Role::ParentStudent => "parent-student",
        }
    }

    /// Page a freshly signed-in user is sent to, relative to the app root.
    pub fn landing_page(self) -> &'static str {
        match self {
            Role::SuperAdmin => "1 Sup_Admin-View/dashboard.html",
            Role::SchoolAdmin => "2 Sch_Admin-View/dashboard.html",
            Role::Teacher => "3 Teacher-View/dashboard.html",
            Role::ParentStudent => "4 P-S_View/dashboard.html",
        }
    }

    /// Super admins sign in with email and password; everyone else with a
    /// phone number and an OTP or password.
    pub fn uses_email_login(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// The persisted session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub role: Role,
    pub user_data: UserData,
    pub login_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is live up to and including `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn user_field(&self, key: &str) -> Option<&str> {
        self.user_data.get(key).map(String::as_str)
    }
}
