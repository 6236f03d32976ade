//! Explicit session handling over an external auth service.
//!
//! The session is a plain value. `SessionManager` is the only thing that
//! creates or clears it, and it tells registered listeners when it does.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::db::{Database, DbError};
use crate::lifecycle::Actor;
use crate::models::{Notification, Role, UserProfile};

/// Shown instead of the backend's wording when an email is taken.
pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "This email is already registered. Please sign in instead.";

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Backend message, passed through verbatim
    #[error("{0}")]
    Backend(String),

    #[error("{}", DUPLICATE_EMAIL_MESSAGE)]
    AlreadyRegistered,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("No profile for user {0}")]
    ProfileMissing(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome of a sign-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub user_id: String,
    /// Zero when the backend hides an existing account behind a fake user
    pub identities_count: usize,
}

/// Contract with the hosted auth backend.
pub trait AuthService: Send + Sync {
    /// Verify credentials. Returns the auth user id.
    fn sign_in(&self, email: &str, password: &str) -> AuthResult<String>;

    fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpResult>;

    fn sign_out(&self, user_id: &str) -> AuthResult<()>;
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Identity handed to transition checks.
    pub fn actor(&self) -> Actor {
        Actor::from(&self.profile)
    }
}

/// Session change, delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut { user_id: String },
}

/// Fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Owns the current session and the auth backend.
pub struct SessionManager<A: AuthService> {
    auth: A,
    current: Option<Session>,
    /// This session's realtime receiver; other sessions keep their own
    inbox: Option<broadcast::Receiver<Notification>>,
    listeners: Vec<Listener>,
}

impl<A: AuthService> SessionManager<A> {
    pub fn new(auth: A) -> Self {
        Self {
            auth,
            current: None,
            inbox: None,
            listeners: Vec::new(),
        }
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session, or `NotSignedIn`.
    pub fn require(&self) -> AuthResult<&Session> {
        self.current.as_ref().ok_or(AuthError::NotSignedIn)
    }

    /// Notification inserts for the signed-in user.
    pub fn inbox(&mut self) -> Option<&mut broadcast::Receiver<Notification>> {
        self.inbox.as_mut()
    }

    /// Register a session-change listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Sign in and load the profile.
    pub fn login(&mut self, db: &Database, email: &str, password: &str) -> AuthResult<&Session> {
        let user_id = self.auth.sign_in(email, password).map_err(|e| {
            tracing::warn!(email, error = %e, "sign-in failed");
            e
        })?;
        let profile = db
            .get_profile(&user_id)?
            .ok_or_else(|| AuthError::ProfileMissing(user_id.clone()))?;

        Ok(self.start(db, profile))
    }

    /// Sign up, create the profile with the chosen role and start a session.
    pub fn register(&mut self, db: &Database, registration: Registration) -> AuthResult<&Session> {
        let result = self
            .auth
            .sign_up(&registration.email, &registration.password)
            .map_err(friendly_sign_up_error)?;

        if result.identities_count == 0 {
            tracing::info!(email = %registration.email, "sign-up for existing account");
            return Err(AuthError::AlreadyRegistered);
        }

        let profile = UserProfile::new(
            result.user_id,
            registration.email,
            registration.full_name,
            registration.role,
        );
        if let Err(e) = db.insert_profile(&profile) {
            tracing::warn!(
                user_id = %profile.id,
                email = %profile.email,
                error = %e,
                "auth account created without a profile"
            );
            return Err(match e {
                DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    AuthError::AlreadyRegistered
                }
                other => AuthError::Database(other),
            });
        }

        Ok(self.start(db, profile))
    }

    /// Clear the session locally, then sign out remotely on a best-effort basis.
    pub fn logout(&mut self, db: &Database) {
        let Some(session) = self.current.take() else {
            return;
        };
        let user_id = session.profile.id;

        self.inbox = None;
        db.notify_hub().release_if_idle(&user_id);
        if let Err(e) = self.auth.sign_out(&user_id) {
            tracing::error!(user_id = %user_id, error = %e, "remote sign-out failed");
        }

        tracing::info!(user_id = %user_id, "signed out");
        self.emit(&SessionEvent::SignedOut { user_id });
    }

    fn start(&mut self, db: &Database, profile: UserProfile) -> &Session {
        let session = Session {
            profile,
            signed_in_at: Utc::now(),
        };
        self.inbox = Some(db.notify_hub().subscribe(&session.profile.id));
        tracing::info!(user_id = %session.profile.id, role = %session.profile.role, "signed in");
        self.emit(&SessionEvent::SignedIn(session.clone()));
        self.current.insert(session)
    }

    fn emit(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

fn friendly_sign_up_error(error: AuthError) -> AuthError {
    match error {
        AuthError::Backend(message) => {
            let lower = message.to_lowercase();
            if lower.contains("already registered") || lower.contains("already exists") {
                AuthError::AlreadyRegistered
            } else {
                AuthError::Backend(message)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory auth backend.
    #[derive(Default)]
    struct FakeAuth {
        users: Mutex<HashMap<String, (String, String)>>,
        hide_duplicates: bool,
        fail_sign_out: bool,
    }

    impl AuthService for FakeAuth {
        fn sign_in(&self, email: &str, password: &str) -> AuthResult<String> {
            let users = self.users.lock().unwrap();
            match users.get(email) {
                Some((id, pw)) if pw == password => Ok(id.clone()),
                _ => Err(AuthError::Backend("Invalid login credentials".into())),
            }
        }

        fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpResult> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                if self.hide_duplicates {
                    return Ok(SignUpResult {
                        user_id: uuid::Uuid::new_v4().to_string(),
                        identities_count: 0,
                    });
                }
                return Err(AuthError::Backend("User already registered".into()));
            }
            let id = uuid::Uuid::new_v4().to_string();
            users.insert(email.into(), (id.clone(), password.into()));
            Ok(SignUpResult {
                user_id: id,
                identities_count: 1,
            })
        }

        fn sign_out(&self, _user_id: &str) -> AuthResult<()> {
            if self.fail_sign_out {
                Err(AuthError::Backend("network down".into()))
            } else {
                Ok(())
            }
        }
    }

    fn registration(email: &str, role: Role) -> Registration {
        Registration {
            email: email.into(),
            password: "hunter22".into(),
            full_name: "Pat Example".into(),
            role,
        }
    }

    #[test]
    fn test_register_then_login() {
        let db = Database::open_in_memory().unwrap();
        let mut sessions = SessionManager::new(FakeAuth::default());

        let session = sessions
            .register(&db, registration("pat@example.com", Role::Vet))
            .unwrap();
        assert_eq!(session.role(), Role::Vet);
        let user_id = session.user_id().to_string();
        assert!(db.get_profile(&user_id).unwrap().is_some());

        sessions.logout(&db);
        assert!(sessions.current().is_none());
        assert!(matches!(sessions.require(), Err(AuthError::NotSignedIn)));

        let session = sessions.login(&db, "pat@example.com", "hunter22").unwrap();
        assert_eq!(session.user_id(), user_id);
        assert_eq!(session.actor(), Actor::new(user_id, Role::Vet));
    }

    #[test]
    fn test_duplicate_email_is_friendly() {
        let db = Database::open_in_memory().unwrap();
        let mut sessions = SessionManager::new(FakeAuth::default());
        sessions
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap();

        let err = sessions
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_EMAIL_MESSAGE);
    }

    #[test]
    fn test_hidden_duplicate_is_friendly() {
        let db = Database::open_in_memory().unwrap();
        let auth = FakeAuth {
            hide_duplicates: true,
            ..FakeAuth::default()
        };
        let mut sessions = SessionManager::new(auth);
        sessions
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap();

        let err = sessions
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
    }

    #[test]
    fn test_login_errors_pass_through() {
        let db = Database::open_in_memory().unwrap();
        let mut sessions = SessionManager::new(FakeAuth::default());

        let err = sessions.login(&db, "nobody@example.com", "x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(sessions.current().is_none());
    }

    #[test]
    fn test_login_without_profile() {
        let db = Database::open_in_memory().unwrap();
        let auth = FakeAuth::default();
        auth.sign_up("ghost@example.com", "pw").unwrap();
        let mut sessions = SessionManager::new(auth);

        assert!(matches!(
            sessions.login(&db, "ghost@example.com", "pw"),
            Err(AuthError::ProfileMissing(_))
        ));
    }

    #[test]
    fn test_logout_leaves_other_sessions_listening() {
        let db = Database::open_in_memory().unwrap();
        let auth = FakeAuth::default();
        let mut phone = SessionManager::new(auth);
        let user_id = phone
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap()
            .user_id()
            .to_string();
        let mut laptop_inbox = db.notify_hub().subscribe(&user_id);

        phone.logout(&db);
        assert!(phone.inbox().is_none());
        assert_eq!(db.notify_hub().channel_count(), 1);

        db.insert_notification(&Notification::new(user_id.clone(), "Booking approved", "See you soon"))
            .unwrap();
        assert_eq!(laptop_inbox.try_recv().unwrap().title, "Booking approved");

        let session = phone.login(&db, "pat@example.com", "hunter22").unwrap();
        assert_eq!(session.user_id(), user_id);
        db.insert_notification(&Notification::new(user_id.clone(), "Checked in", "Rex is settled"))
            .unwrap();
        assert_eq!(phone.inbox().unwrap().try_recv().unwrap().title, "Checked in");
    }

    #[test]
    fn test_profile_insert_failure_reports_duplicate() {
        let db = Database::open_in_memory().unwrap();
        db.insert_profile(&UserProfile::new(
            "existing".into(),
            "pat@example.com".into(),
            "Pat Existing".into(),
            Role::PetOwner,
        ))
        .unwrap();

        // The auth backend has never seen this email, so sign-up succeeds.
        let mut sessions = SessionManager::new(FakeAuth::default());
        let err = sessions
            .register(&db, registration("pat@example.com", Role::PetOwner))
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
        assert!(sessions.current().is_none());
        assert!(sessions.inbox().is_none());
    }

    #[test]
    fn test_listeners_and_best_effort_logout() {
        let db = Database::open_in_memory().unwrap();
        let auth = FakeAuth {
            fail_sign_out: true,
            ..FakeAuth::default()
        };
        let mut sessions = SessionManager::new(auth);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        sessions.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let user_id = sessions
            .register(&db, registration("pat@example.com", Role::Staff))
            .unwrap()
            .user_id()
            .to_string();
        sessions.logout(&db);
        // Logging out twice is a no-op
        sessions.logout(&db);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SessionEvent::SignedIn(s) if s.user_id() == user_id));
        assert_eq!(events[1], SessionEvent::SignedOut { user_id });
        assert!(sessions.current().is_none());
    }
}
