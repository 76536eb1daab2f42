// rest_api/src/admin.rs

//! One-shot operator commands run by the binary instead of serving.

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use lib::storage_engine::{create_storage, StorageEngineType, UserDirectory};
use models::identifiers::parse_record_id;
use models::medical::{Actor, NewUser, Role, User};
use security::{issue_token, JwtSecret};

use crate::config::RestApiConfig;

/// Reads a JSON array of users to seed.
pub fn read_seed_users(path: &Path) -> Result<Vec<NewUser>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid seed file {}", path.display()))
}

/// Adds the users listed in `path` to `users`.
pub async fn seed_directory(users: &dyn UserDirectory, path: &Path) -> Result<Vec<User>> {
    let new_users = read_seed_users(path)?;
    let mut seeded = Vec::with_capacity(new_users.len());
    for new_user in new_users {
        let user = User::from_new_user(new_user);
        users
            .add_user(&user)
            .await
            .with_context(|| format!("Failed to store user {}", user.email))?;
        seeded.push(user);
    }
    info!("Seeded {} users from {}", seeded.len(), path.display());
    Ok(seeded)
}

/// Adds the users listed in `path` to the configured user directory and exits.
///
/// Only persistent engines are accepted: an in-memory directory would vanish
/// with this command. Use `seed_file` to seed a serving in-memory process.
pub async fn seed_users(config: &RestApiConfig, path: &Path) -> Result<Vec<User>> {
    if config.storage.engine_type()? == StorageEngineType::InMemory {
        bail!("In-memory storage does not outlive --seed-users; set seed_file (or PRESCRIPTIONS_SEED_FILE) to seed the server at startup");
    }
    let storage = create_storage(&config.storage).context("Failed to initialize storage for seeding")?;
    seed_directory(storage.users.as_ref(), path).await
}

/// Issues a bearer token for an existing user id, valid for the configured lifetime.
pub fn mint_token(config: &RestApiConfig, user_id: &str, role: &str) -> Result<String> {
    let id = parse_record_id(user_id).ok_or_else(|| anyhow!("Not a user id: {}", user_id))?;
    let role = role.parse::<Role>().map_err(|e| anyhow!(e))?;
    let secret = JwtSecret::new(config.auth.jwt_secret.clone());
    issue_token(&Actor::new(id, role), &secret, config.auth.token_ttl_hours)
        .map_err(|e| anyhow!("Failed to issue token: {}", e))
}
