use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};
use std::sync::Mutex;

use crate::auth::tokens_file::FileTokenStore;
use crate::config::TokenBackend;

const SERVICE: &str = "mail_portal";

/// Fixed key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Persistent slot for the session's bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    /// Removing an absent token is not an error.
    fn clear(&self) -> Result<()>;
}

pub fn open_token_store(backend: TokenBackend) -> Result<Box<dyn TokenStore>> {
    Ok(match backend {
        TokenBackend::File => Box::new(FileTokenStore::open_default()?),
        TokenBackend::Keyring => Box::new(KeyringTokenStore),
    })
}

/// Token kept in the OS keyring.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE, TOKEN_KEY).map_err(|e| anyhow!(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .map_err(|e| anyhow!(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }
}

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let slot = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut slot = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
