use crate::auth::{is_auth_path, AuthUser, LOGOUT_PATH, PROBE_PATH};
use crate::cookies::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Cookie carrying the CSRF token.
    pub csrf_cookie: String,
    /// Header the token is echoed in.
    pub csrf_header: String,
    pub login_route: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            csrf_cookie: "csrfToken".to_string(),
            csrf_header: "X-CSRF-Token".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

/// What survives between two runs of the client.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub cookies: CookieJar,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Client side view of the login session: cookies, the signed in user and
/// the route the client is currently on.
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    jar: CookieJar,
    user: RwLock<Option<AuthUser>>,
    location: RwLock<String>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self::restore(settings, SessionSnapshot::default())
    }

    pub fn restore(settings: SessionSettings, snapshot: SessionSnapshot) -> Self {
        Self {
            settings,
            jar: snapshot.cookies,
            user: RwLock::new(snapshot.user),
            location: RwLock::new("/".to_string()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cookies: self.jar.clone(),
            user: self.user(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn user(&self) -> Option<AuthUser> {
        read(&self.user).clone()
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        *write(&self.user) = user;
    }

    pub fn location(&self) -> String {
        read(&self.location).clone()
    }

    pub fn navigate<T: Into<String>>(&self, route: T) {
        *write(&self.location) = route.into();
    }

    /// Header to attach to a request for `path`, if any.
    pub fn csrf_header(&self, path: &str) -> Option<(&str, String)> {
        if is_auth_path(path) {
            return None;
        }
        let token = self.jar.get(&self.settings.csrf_cookie)?;
        Some((self.settings.csrf_header.as_str(), token))
    }

    /// Reacts to a 401 on `path`. Returns true when the session was dropped
    /// and the client was sent to the login route.
    ///
    /// The logout call, the start-up probe and anything that happens while
    /// already on the login route are left alone, otherwise they would loop.
    pub fn handle_unauthorized(&self, path: &str) -> bool {
        if path == LOGOUT_PATH || path == PROBE_PATH || self.location() == self.settings.login_route
        {
            log::debug!("401 on {} ignored", path);
            return false;
        }
        log::warn!("Session rejected on {}, logging out", path);
        self.clear();
        self.navigate(self.settings.login_route.clone());
        true
    }

    pub fn clear(&self) {
        self.jar.clear();
        self.set_user(None);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LOGIN_PATH;

    fn signed_in() -> Session {
        let session = Session::new(SessionSettings::default());
        session.jar().insert("csrfToken", "tok");
        session.jar().insert("token", "jwt");
        session.set_user(Some(AuthUser {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            ..Default::default()
        }));
        session
    }

    #[test]
    fn test_csrf_header() {
        let session = signed_in();
        assert_eq!(
            session.csrf_header("/batches"),
            Some(("X-CSRF-Token", "tok".to_string()))
        );
        assert_eq!(session.csrf_header(LOGIN_PATH), None);

        session.jar().clear();
        assert_eq!(session.csrf_header("/batches"), None);
    }

    #[test]
    fn test_unauthorized_logs_out() {
        let session = signed_in();
        assert!(session.handle_unauthorized("/students"));
        assert!(session.user().is_none());
        assert!(session.jar().is_empty());
        assert_eq!(session.location(), "/login");

        // already on the login route now
        assert!(!session.handle_unauthorized("/students"));
    }

    #[test]
    fn test_unauthorized_exemptions() {
        let session = signed_in();
        assert!(!session.handle_unauthorized(LOGOUT_PATH));
        assert!(!session.handle_unauthorized(PROBE_PATH));
        assert!(session.user().is_some());
        assert_eq!(session.location(), "/");
    }

    #[test]
    fn test_snapshot_roundtrip() -> anyhow::Result<()> {
        let session = signed_in();
        let json = serde_json::to_string(&session.snapshot())?;
        let restored = Session::restore(SessionSettings::default(), serde_json::from_str(&json)?);
        assert_eq!(restored.user(), session.user());
        assert_eq!(restored.jar().get("token").as_deref(), Some("jwt"));
        Ok(())
    }
}
