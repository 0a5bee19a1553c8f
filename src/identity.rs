//! The signed in user, as seen by the rest of the client.
//!
//! The view models never talk to an authentication service themselves. They
//! take an [Identity] from an [IdentityProvider], and do nothing until one is
//! available.

use std::{
    fmt::Display,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{Error, TokenCache};

/// The key that [SessionIdentityProvider] stores the session under.
pub const SESSION_KEY: &str = "tcash.session";

/// The stable identifier of a user, as assigned by the identity provider.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user ID.
    ///
    /// # Errors
    /// Returns [Error::EmptyField] if `id` is empty or only whitespace.
    pub fn new(id: &str) -> Result<Self, Error> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::EmptyField("user ID"));
        }

        Ok(Self(id.to_owned()))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signed in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The user's ID, used in the ledger API paths.
    pub id: UserId,
    /// The user's primary e-mail address, may be empty.
    pub primary_email: String,
    /// The session token to send to the ledger API, if the provider issued one.
    pub token: Option<String>,
}

impl Identity {
    /// Create an identity without a session token.
    pub fn new(id: UserId, primary_email: &str) -> Self {
        Self {
            id,
            primary_email: primary_email.trim().to_owned(),
            token: None,
        }
    }

    /// Attach a session token to the identity.
    pub fn with_token(mut self, token: &str) -> Self {
        let token = token.trim();
        self.token = (!token.is_empty()).then(|| token.to_owned());
        self
    }

    /// The name to greet the user by: the part of their e-mail address before
    /// the '@', or "User" if there is none.
    pub fn display_name(&self) -> &str {
        match self.primary_email.split('@').next() {
            Some(name) if !name.is_empty() => name,
            _ => "User",
        }
    }
}

/// Whether authentication has finished resolving, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState {
    /// The provider has finished checking for an existing session.
    pub is_loaded: bool,
    /// There is a signed in user.
    pub is_signed_in: bool,
}

/// Supplies the current user to the view models.
pub trait IdentityProvider {
    /// Whether authentication has resolved.
    fn auth_state(&self) -> AuthState;

    /// The signed in user, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// The signed in user, but only once the provider has loaded and reports
    /// a signed in session.
    ///
    /// View models should be given this, so that no request is made before
    /// authentication has resolved.
    fn ready_identity(&self) -> Option<Identity> {
        let state = self.auth_state();

        if state.is_loaded && state.is_signed_in {
            self.current_identity()
        } else {
            None
        }
    }
}

/// An identity provider that keeps the session in a [TokenCache], so that it
/// survives restarts.
///
/// The provider starts out not loaded; call [SessionIdentityProvider::restore]
/// to read any existing session.
pub struct SessionIdentityProvider {
    cache: Arc<dyn TokenCache>,
    session: RwLock<Session>,
}

#[derive(Default)]
struct Session {
    loaded: bool,
    identity: Option<Identity>,
}

impl SessionIdentityProvider {
    /// Create a provider that stores its session in `cache`.
    pub fn new(cache: Arc<dyn TokenCache>) -> Self {
        Self {
            cache,
            session: RwLock::new(Session::default()),
        }
    }

    /// Read the session stored in the cache, if any.
    ///
    /// A stored session that cannot be parsed is treated as signed out.
    pub fn restore(&self) {
        let identity = self
            .cache
            .get_token(SESSION_KEY)
            .and_then(|text| match serde_json::from_str::<Identity>(&text) {
                Ok(identity) => Some(identity),
                Err(error) => {
                    tracing::error!("Could not parse the stored session: {error}");
                    None
                }
            });

        self.set_session(Session {
            loaded: true,
            identity,
        });
    }

    /// Start a session for `identity` and store it in the cache.
    pub fn sign_in(&self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(text) => self.cache.save_token(SESSION_KEY, &text),
            Err(error) => tracing::error!("Could not serialize the session: {error}"),
        }

        tracing::info!("Signed in as {}", identity.id);
        self.set_session(Session {
            loaded: true,
            identity: Some(identity),
        });
    }

    /// End the current session and remove it from the cache.
    pub fn sign_out(&self) {
        self.cache.remove_token(SESSION_KEY);
        self.set_session(Session {
            loaded: true,
            identity: None,
        });
    }

    fn set_session(&self, session: Session) {
        match self.session.write() {
            Ok(mut current) => *current = session,
            Err(error) => tracing::error!("Could not acquire the session lock: {error}"),
        }
    }
}

impl IdentityProvider for SessionIdentityProvider {
    fn auth_state(&self) -> AuthState {
        match self.session.read() {
            Ok(session) => AuthState {
                is_loaded: session.loaded,
                is_signed_in: session.identity.is_some(),
            },
            Err(_) => AuthState::default(),
        }
    }

    fn current_identity(&self) -> Option<Identity> {
        self.session
            .read()
            .ok()
            .and_then(|session| session.identity.clone())
    }
}
