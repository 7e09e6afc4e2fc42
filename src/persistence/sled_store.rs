use sled::Db;
use tracing::debug;

use crate::persistence::{CREDENTIAL_KEY, CredentialStore};
use crate::utils::error::PersistenceError;

#[derive(Clone)]
pub struct SledCredentialStore {
    db: Db,
}

impl SledCredentialStore {
    pub fn open(path: &str) -> Result<Self, PersistenceError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl CredentialStore for SledCredentialStore {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        match self.db.get(CREDENTIAL_KEY)? {
            Some(raw) => Ok(Some(String::from_utf8(raw.to_vec())?)),
            None => Ok(None),
        }
    }

    fn store(&self, token: &str) -> Result<(), PersistenceError> {
        self.db.insert(CREDENTIAL_KEY, token.as_bytes())?;
        self.db.flush()?;
        debug!("Credential stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.db.remove(CREDENTIAL_KEY)?;
        self.db.flush()?;
        debug!("Credential cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SledCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledCredentialStore")
            .field("db", &"sled::Db")
            .finish()
    }
}
