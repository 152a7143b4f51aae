use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::db::Database;
use crate::model::User;

pub(crate) const SESSION_KEY: &str = "user";

/// Storage backing a [`Session`]. Implemented by the SQLite local store.
pub(crate) trait SessionStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn clear(&self, key: &str) -> Result<()>;
}

impl SessionStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.get_item(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.set_item(key, value)
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.remove_item(key).map(|_| ())
    }
}

/// The logged-in user, held in memory and mirrored to the store so the next
/// run can pick it up again.
pub(crate) struct Session<S> {
    store: S,
    user: Option<User>,
}

impl<S: SessionStore> Session<S> {
    pub(crate) fn new(store: S) -> Self {
        Self { store, user: None }
    }

    /// Rehydrates the stored user. Missing, unreadable or corrupt records all
    /// mean "no session"; a corrupt record is dropped from the store.
    pub(crate) fn restore(&mut self) -> Option<&User> {
        self.user = match self.store.load(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(%err, "discarding corrupt stored session");
                    if let Err(err) = self.store.clear(SESSION_KEY) {
                        warn!(%err, "failed to remove corrupt stored session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(%err, "failed to read stored session");
                None
            }
        };
        self.user.as_ref()
    }

    pub(crate) fn login(&mut self, user: User) -> Result<&User> {
        let encoded = serde_json::to_string(&user)?;
        self.store.save(SESSION_KEY, &encoded)?;
        info!(user_id = user.id, "session started");
        Ok(self.user.insert(user))
    }

    /// The in-memory user is dropped even when clearing the store fails.
    pub(crate) fn logout(&mut self) -> Result<Option<User>> {
        let previous = self.user.take();
        self.store.clear(SESSION_KEY)?;
        if let Some(user) = &previous {
            info!(user_id = user.id, "session ended");
        }
        Ok(previous)
    }

    pub(crate) fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) fn require_user(&self) -> Result<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| anyhow!("not logged in. Run `studytrack login` first."))
    }
}
