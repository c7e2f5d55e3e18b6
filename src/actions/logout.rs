use std::sync::Arc;

use crate::SessionStore;
use crate::events::PortalEvent;

/// Ends the current session and sends the browser to the login page.
pub struct LogoutAction {
    sessions: Arc<SessionStore>,
}

impl LogoutAction {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        LogoutAction { sessions }
    }

    /// Safe to run when nobody is signed in.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "logout", skip_all))]
    pub async fn execute(&self) {
        let role = self.sessions.role().await;
        self.sessions.clear_session().await;

        self.sessions
            .events()
            .dispatch(PortalEvent::LoggedOut {
                at: self.sessions.clock().utc(),
            })
            .await;

        log::info!(
            target: "campusgate",
            "msg=\"logout success\", role={}",
            role.map_or("none", |r| r.as_str())
        );

        self.sessions.redirect_to_login();
    }
}
