//! Session persistence and the authorization combinator.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;

use super::navigation::{Navigator, is_login_page, login_path_for};
use super::{Role, Session, UserData};
use crate::PortalError;
use crate::config::SessionConfig;
use crate::events::{EventRegistry, PortalEvent};
use crate::storage::{BrowserStorage, keys, read_json, write_json};

/// Result of reading the persisted record.
pub(crate) enum Lookup {
    Live(Session),
    Missing,
    /// Was present but past its expiry; already cleared.
    Expired,
}

/// Owns the session record in tab-scoped storage.
///
/// Construct one per tab and share it by reference with the access guard,
/// the login actions and any page logic that needs the current role.
pub struct SessionStore {
    storage: BrowserStorage,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    events: Arc<EventRegistry>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(
        storage: BrowserStorage,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        events: Arc<EventRegistry>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            storage,
            clock,
            navigator,
            events,
            lifetime: config.lifetime,
        }
    }

    /// Persists a new session for `role`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Only storage failures (quota, poisoned lock) are reported.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "set_session", skip_all, fields(role = %role), err)
    )]
    pub async fn set_session(&self, role: Role, user_data: UserData) -> Result<Session, PortalError> {
        let now = self.clock.utc();
        let session = Session {
            role,
            user_data,
            login_time: now,
            expires_at: now + self.lifetime,
        };

        write_json(self.storage.tab.as_ref(), keys::SESSION, &session)?;
        self.storage.tab.set(keys::AUTHENTICATED, "true")?;

        self.events
            .dispatch(PortalEvent::SessionStarted { role, at: now })
            .await;

        log::info!(
            target: "campusgate",
            "msg=\"session started\", role={role}"
        );

        Ok(session)
    }

    /// Returns the live session, if any.
    ///
    /// Missing and malformed records both read as `None`. An expired record
    /// is removed, and unless the current page is the login page the browser
    /// is sent to the login entry point.
    pub async fn get_session(&self) -> Option<Session> {
        match self.lookup().await {
            Lookup::Live(session) => Some(session),
            Lookup::Missing => None,
            Lookup::Expired => {
                let current_path = self.navigator.current_path();
                if !is_login_page(&current_path) {
                    self.navigator.redirect(&login_path_for(&current_path));
                }
                None
            }
        }
    }

    /// Reads the record without navigating. Expired and malformed records
    /// are cleared as a side effect.
    pub(crate) async fn lookup(&self) -> Lookup {
        let session = match read_json::<Session>(self.storage.tab.as_ref(), keys::SESSION) {
            Ok(Some(session)) => session,
            Ok(None) => return Lookup::Missing,
            Err(PortalError::SerializationError(e)) => {
                log::warn!(
                    target: "campusgate",
                    "msg=\"discarding malformed session record\", error=\"{e}\""
                );
                self.remove_records();
                return Lookup::Missing;
            }
            Err(e) => {
                log::error!(
                    target: "campusgate",
                    "msg=\"session storage unavailable\", error=\"{e}\""
                );
                return Lookup::Missing;
            }
        };

        let now = self.clock.utc();
        if !session.is_expired_at(now) {
            return Lookup::Live(session);
        }

        log::info!(
            target: "campusgate",
            "msg=\"session expired\", role={}",
            session.role
        );
        self.remove_records();
        self.events
            .dispatch(PortalEvent::SessionExpired {
                role: session.role,
                at: now,
            })
            .await;

        Lookup::Expired
    }

    /// Removes the session record, the authenticated flag and the durable
    /// remember-me preference. Safe to call when nothing is stored.
    pub async fn clear_session(&self) {
        self.remove_records();
        self.events
            .dispatch(PortalEvent::SessionCleared {
                at: self.clock.utc(),
            })
            .await;
    }

    /// True when a live session exists and the authenticated flag is set.
    pub async fn is_authenticated(&self) -> bool {
        self.get_session().await.is_some() && self.flag_set()
    }

    pub async fn role(&self) -> Option<Role> {
        self.get_session().await.map(|session| session.role)
    }

    /// Gatekeeper for page logic.
    ///
    /// Redirects to the login entry point and returns `false` when no one is
    /// signed in, or when `required_role` is given and doesn't match (after
    /// signalling [`PortalEvent::AccessDenied`]). Returns `true` when the
    /// caller may proceed.
    pub async fn require_auth(&self, required_role: Option<Role>) -> bool {
        let session = match self.lookup().await {
            Lookup::Live(session) if self.flag_set() => session,
            _ => {
                self.redirect_to_login();
                return false;
            }
        };

        if let Some(required) = required_role {
            if session.role != required {
                log::warn!(
                    target: "campusgate",
                    "msg=\"access denied\", required={required}, actual={}",
                    session.role
                );
                self.events
                    .dispatch(PortalEvent::AccessDenied {
                        required,
                        actual: session.role,
                        at: self.clock.utc(),
                    })
                    .await;
                self.redirect_to_login();
                return false;
            }
        }

        true
    }

    pub(crate) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub(crate) fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn redirect_to_login(&self) {
        let current_path = self.navigator.current_path();
        self.navigator.redirect(&login_path_for(&current_path));
    }

    fn flag_set(&self) -> bool {
        matches!(
            self.storage.tab.get(keys::AUTHENTICATED),
            Ok(Some(flag)) if flag == "true"
        )
    }

    fn remove_records(&self) {
        for result in [
            self.storage.tab.remove(keys::SESSION),
            self.storage.tab.remove(keys::AUTHENTICATED),
            self.storage.durable.remove(keys::REMEMBER_ME),
        ] {
            if let Err(e) = result {
                log::error!(
                    target: "campusgate",
                    "msg=\"failed to clear session state\", error=\"{e}\""
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, RecordingListener, RecordingNavigator};

    struct Fixture {
        store: SessionStore,
        storage: BrowserStorage,
        clock: Arc<ManualClock>,
        navigator: Arc<RecordingNavigator>,
        listener: RecordingListener,
    }

    fn fixture(path: &str) -> Fixture {
        let storage = BrowserStorage::in_memory();
        let clock = Arc::new(ManualClock::default());
        let navigator = Arc::new(RecordingNavigator::at(path));
        let listener = RecordingListener::new();
        let mut registry = EventRegistry::new();
        registry.listen(listener.clone());

        let store = SessionStore::new(
            storage.clone(),
            clock.clone(),
            navigator.clone(),
            Arc::new(registry),
            &SessionConfig::default(),
        );

        Fixture {
            store,
            storage,
            clock,
            navigator,
            listener,
        }
    }

    fn teacher_data() -> UserData {
        UserData::from([
            ("id".to_owned(), "T_3210".to_owned()),
            ("name".to_owned(), "Teacher 3210".to_owned()),
        ])
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let f = fixture("/3 Teacher-View/dashboard.html");

        let created = f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();
        assert_eq!(created.expires_at, created.login_time + Duration::hours(24));

        let session = f.store.get_session().await.unwrap();
        assert_eq!(session.role, Role::Teacher);
        assert_eq!(session.user_data, teacher_data());
        assert_eq!(
            f.storage.tab.get(keys::AUTHENTICATED).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(f.listener.names(), vec!["session.started"]);
    }

    #[tokio::test]
    async fn test_expired_session_is_cleared_and_redirects() {
        let f = fixture("/3 Teacher-View/dashboard.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();

        f.clock.advance(Duration::hours(24) + Duration::seconds(1));

        assert!(f.store.get_session().await.is_none());
        assert!(f.storage.tab.get(keys::SESSION).unwrap().is_none());
        assert!(f.storage.tab.get(keys::AUTHENTICATED).unwrap().is_none());
        assert_eq!(f.navigator.redirects(), vec!["../login.html".to_owned()]);

        // cleanup is permanent; no second redirect
        assert!(f.store.get_session().await.is_none());
        assert_eq!(f.navigator.redirects().len(), 1);
        assert!(f.listener.names().contains(&"session.expired"));
    }

    #[tokio::test]
    async fn test_session_live_at_exact_expiry() {
        let f = fixture("/3 Teacher-View/dashboard.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();

        f.clock.advance(Duration::hours(24));
        assert!(f.store.get_session().await.is_some());
    }

    #[tokio::test]
    async fn test_expiry_on_login_page_does_not_redirect() {
        let f = fixture("/login.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();
        f.clock.advance(Duration::days(2));

        assert!(f.store.get_session().await.is_none());
        assert!(f.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_record_reads_as_absent() {
        let f = fixture("/3 Teacher-View/dashboard.html");
        f.storage.tab.set(keys::SESSION, "{\"role\": 42").unwrap();

        assert!(f.store.get_session().await.is_none());
        assert!(f.storage.tab.get(keys::SESSION).unwrap().is_none());
        assert!(f.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_clear_session_is_idempotent() {
        let f = fixture("/4 P-S_View/dashboard.html");
        f.store
            .set_session(Role::ParentStudent, UserData::new())
            .await
            .unwrap();
        f.storage.durable.set(keys::REMEMBER_ME, "true").unwrap();

        f.store.clear_session().await;
        f.store.clear_session().await;

        assert!(f.store.get_session().await.is_none());
        assert!(f.storage.durable.get(keys::REMEMBER_ME).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_is_authenticated_requires_flag() {
        let f = fixture("/4 P-S_View/dashboard.html");
        f.store
            .set_session(Role::ParentStudent, UserData::new())
            .await
            .unwrap();
        assert!(f.store.is_authenticated().await);

        f.storage.tab.remove(keys::AUTHENTICATED).unwrap();
        assert!(!f.store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_require_auth_without_session_redirects() {
        let f = fixture("/2 Sch_Admin-View/dashboard.html");

        assert!(!f.store.require_auth(None).await);
        assert_eq!(f.navigator.redirects(), vec!["../login.html".to_owned()]);
    }

    #[tokio::test]
    async fn test_require_auth_role_mismatch() {
        let f = fixture("/2 Sch_Admin-View/dashboard.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();

        assert!(!f.store.require_auth(Some(Role::SchoolAdmin)).await);
        assert_eq!(f.navigator.redirects(), vec!["../login.html".to_owned()]);
        assert!(f.listener.names().contains(&"session.access_denied"));
    }

    #[tokio::test]
    async fn test_require_auth_matching_role() {
        let f = fixture("/3 Teacher-View/dashboard.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();

        assert!(f.store.require_auth(Some(Role::Teacher)).await);
        assert!(f.store.require_auth(None).await);
        assert!(f.navigator.redirects().is_empty());
        assert_eq!(f.store.role().await, Some(Role::Teacher));
    }

    #[tokio::test]
    async fn test_require_auth_on_expired_session_redirects_once() {
        let f = fixture("/3 Teacher-View/attendance.html");
        f.store.set_session(Role::Teacher, teacher_data()).await.unwrap();
        f.clock.advance(Duration::hours(25));

        assert!(!f.store.require_auth(Some(Role::Teacher)).await);
        assert_eq!(f.navigator.redirects(), vec!["../login.html".to_owned()]);
    }
}
