use super::traits::KeyValueStore;
use crate::errors::CoreError;

/// Prefix of the per-company key holding the active chat session id.
pub const SESSION_KEY_PREFIX: &str = "chat_session_";

/// Maps each company to its active chat session id.
///
/// Backed by any `KeyValueStore`; durability is whatever the backing store
/// provides. There is no expiry: a mapping only goes away through
/// `forget`, which the chat controller calls when the backend rejects the
/// session.
pub struct SessionStore {
    backend: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Storage key for a company's session.
    #[must_use]
    pub fn key_for(company_id: i64) -> String {
        format!("{SESSION_KEY_PREFIX}{company_id}")
    }

    /// The stored session id for `company_id`, or `None` if the company has
    /// no conversation yet.
    pub fn resolve(&self, company_id: i64) -> Result<Option<String>, CoreError> {
        let value = self.backend.get(&Self::key_for(company_id))?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }

    /// Persist `session_id` as the active session of `company_id`,
    /// overwriting any previous one.
    ///
    /// A session id already bound to a different company is rejected.
    pub fn bind(&mut self, company_id: i64, session_id: &str) -> Result<(), CoreError> {
        if session_id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Session id must not be empty".into(),
            ));
        }
        if let Some(owner) = self.owner_of(session_id)? {
            if owner != company_id {
                return Err(CoreError::ValidationError(format!(
                    "Session {session_id} already belongs to company {owner}"
                )));
            }
        }
        self.backend.set(&Self::key_for(company_id), session_id)?;
        tracing::info!(company_id, session_id, "Bound chat session");
        Ok(())
    }

    /// Drop the mapping for `company_id`. No-op if there is none.
    pub fn forget(&mut self, company_id: i64) -> Result<(), CoreError> {
        self.backend.delete(&Self::key_for(company_id))?;
        tracing::info!(company_id, "Forgot chat session");
        Ok(())
    }

    /// The company a session id is bound to, if any.
    pub fn owner_of(&self, session_id: &str) -> Result<Option<i64>, CoreError> {
        for key in self.backend.keys()? {
            let Some(company) = key.strip_prefix(SESSION_KEY_PREFIX) else {
                continue;
            };
            let Ok(company_id) = company.parse::<i64>() else {
                continue;
            };
            if self.backend.get(&key)?.as_deref() == Some(session_id) {
                return Ok(Some(company_id));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("keys", &self.backend.keys().map(|k| k.len()).unwrap_or(0))
            .finish()
    }
}
