// lib/src/storage_engine/user_storage.rs

use async_trait::async_trait;
use sled::{Db, Tree};
use tracing::debug;
use uuid::Uuid;

use models::errors::RecordResult;
use models::medical::User;

use super::storage_utils::{decode_record, encode_record};

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Adds a user to the directory, replacing any user with the same id.
    async fn add_user(&self, user: &User) -> RecordResult<()>;
    /// Retrieves a user by their unique ID.
    async fn get_user_by_id(&self, id: &Uuid) -> RecordResult<Option<User>>;
}

/// Sled-backed implementation of the `UserDirectory` trait.
#[derive(Clone)]
pub struct SledUserStorage {
    tree: Tree,
}

impl SledUserStorage {
    /// Opens the Sled tree named "users".
    pub fn new(db: &Db) -> RecordResult<Self> {
        let tree = db.open_tree("users")?;
        Ok(Self { tree })
    }
}

#[async_trait]
impl UserDirectory for SledUserStorage {
    async fn add_user(&self, user: &User) -> RecordResult<()> {
        let user_bytes = encode_record(user)?;
        self.tree.insert(user.id.as_bytes(), user_bytes)?;
        debug!("Stored user {} ({})", user.id, user.role);
        Ok(())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> RecordResult<Option<User>> {
        match self.tree.get(id.as_bytes())? {
            Some(value_ivec) => Ok(Some(decode_record(&value_ivec)?)),
            None => Ok(None),
        }
    }
}
