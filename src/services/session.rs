use crate::error::SessionError;
use crate::models::UserRecord;
use crate::services::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Persisted login state: the bearer token and the last known user record.
///
/// Read failures are logged and reported as "absent", which sends the page
/// back through the login redirect rather than into an error screen.
#[derive(Debug, Clone, Default)]
pub struct Session<S> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::error!("could not read session token: {}", e);
                None
            }
        }
    }

    pub fn cached_user(&self) -> Option<UserRecord> {
        let raw = match self.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::error!("could not read cached user: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Option<UserRecord>>(&raw) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("ignoring malformed cached user: {}", e);
                None
            }
        }
    }

    pub fn store_user(&self, user: &UserRecord) -> Result<(), SessionError> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &raw)
    }

    /// Removes both keys; the second removal is attempted even if the first fails.
    pub fn clear(&self) -> Result<(), SessionError> {
        let token = self.store.remove(TOKEN_KEY);
        let user = self.store.remove(USER_KEY);
        token.and(user)
    }
}
