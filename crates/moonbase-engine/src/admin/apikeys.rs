use std::sync::Arc;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Utc;
use moonbase_core::types::IdFactory;
use moonbase_sql::{SqlParam, SqlRow, SqlScalar};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use super::error::AdminError;
use crate::dyn_driver::DynSqlDriver;

/// System table holding API keys.
pub const APIKEYS_TABLE: &str = "moon_apikeys";

/// Prefix on every issued key, so keys are recognizable in logs and
/// configuration without being guessable.
const KEY_PREFIX: &str = "mb_";

/// API-key metadata as exposed over the API. Only the SHA-256 of the key
/// material is ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
}

/// A freshly created or rotated key. The plaintext is returned exactly
/// once, here, and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedApiKey {
    #[serde(flatten)]
    pub key: ApiKey,
    pub plaintext: String,
}

/// API-key management over the `moon_apikeys` system table.
pub struct ApiKeyService {
    driver: Arc<dyn DynSqlDriver>,
    ids: Arc<IdFactory>,
}

impl ApiKeyService {
    pub fn new(driver: Arc<dyn DynSqlDriver>, ids: Arc<IdFactory>) -> Self {
        Self { driver, ids }
    }

    /// Creates the system table when absent.
    pub async fn ensure_table(&self) -> Result<(), AdminError> {
        let d = self.driver.dialect();
        let string_type = d.sql_type(moonbase_core::types::ColumnType::String);
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({pkid}, {id}, \
             {name} {string_type} NOT NULL UNIQUE, \
             {key_hash} {string_type} NOT NULL UNIQUE, \
             {owner_id} CHAR(26) NOT NULL, \
             {created_at} {string_type} NOT NULL, \
             {last_used_at} {string_type})",
            table = d.quote(APIKEYS_TABLE),
            pkid = d.pkid_definition(),
            id = d.id_definition(),
            name = d.quote("name"),
            key_hash = d.quote("key_hash"),
            owner_id = d.quote("owner_id"),
            created_at = d.quote("created_at"),
            last_used_at = d.quote("last_used_at"),
        );
        self.driver.execute(&sql, &[]).await?;
        Ok(())
    }

    /// All keys, id order.
    pub async fn list(&self) -> Result<Vec<ApiKey>, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols} FROM {table} ORDER BY {id} ASC",
            cols = key_columns(d),
            table = d.quote(APIKEYS_TABLE),
            id = d.quote("id"),
        );
        let rows = self.driver.fetch_all(&sql, &[]).await?;
        Ok(rows.iter().filter_map(key_from_row).collect())
    }

    /// Issues a new key owned by `owner_id`.
    pub async fn create(&self, owner_id: &str, name: &str) -> Result<IssuedApiKey, AdminError> {
        validate_key_name(name)?;
        if self.name_taken(name).await? {
            return Err(AdminError::ApiKeyNameExists {
                name: name.to_string(),
            });
        }

        let plaintext = generate_key();
        let id = self.ids.next_id();
        let now = Utc::now().to_rfc3339();

        let d = self.driver.dialect();
        let sql = format!(
            "INSERT INTO {table} ({id}, {name}, {key_hash}, {owner_id}, {created_at}) \
             VALUES ({p1}, {p2}, {p3}, {p4}, {p5})",
            table = d.quote(APIKEYS_TABLE),
            id = d.quote("id"),
            name = d.quote("name"),
            key_hash = d.quote("key_hash"),
            owner_id = d.quote("owner_id"),
            created_at = d.quote("created_at"),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
            p3 = d.placeholder(3),
            p4 = d.placeholder(4),
            p5 = d.placeholder(5),
        );
        let params = vec![
            SqlParam::Text(id.as_str().to_string()),
            SqlParam::Text(name.to_string()),
            SqlParam::Text(hash_key(&plaintext)),
            SqlParam::Text(owner_id.to_string()),
            SqlParam::Text(now.clone()),
        ];
        self.driver.execute(&sql, &params).await.map_err(|e| {
            if e.is_unique_violation() {
                AdminError::ApiKeyNameExists {
                    name: name.to_string(),
                }
            } else {
                AdminError::Driver(e)
            }
        })?;

        info!(key = %id, name = %name, owner = %owner_id, "api key created");
        Ok(IssuedApiKey {
            key: ApiKey {
                id: id.as_str().to_string(),
                name: name.to_string(),
                owner_id: owner_id.to_string(),
                created_at: now,
                last_used_at: None,
            },
            plaintext,
        })
    }

    /// Deletes a key by id.
    pub async fn destroy(&self, id: &str) -> Result<(), AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "DELETE FROM {table} WHERE {id} = {p}",
            table = d.quote(APIKEYS_TABLE),
            id = d.quote("id"),
            p = d.placeholder(1),
        );
        let affected = self
            .driver
            .execute(&sql, &[SqlParam::Text(id.to_string())])
            .await?;
        if affected == 0 {
            return Err(AdminError::ApiKeyNotFound { id: id.to_string() });
        }
        info!(key = %id, "api key deleted");
        Ok(())
    }

    /// Replaces a key's material, invalidating the previous plaintext.
    pub async fn rotate(&self, id: &str) -> Result<IssuedApiKey, AdminError> {
        let existing = self.get(id).await?;
        let plaintext = generate_key();

        let d = self.driver.dialect();
        let sql = format!(
            "UPDATE {table} SET {key_hash} = {p1} WHERE {id} = {p2}",
            table = d.quote(APIKEYS_TABLE),
            key_hash = d.quote("key_hash"),
            id = d.quote("id"),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
        );
        let affected = self
            .driver
            .execute(
                &sql,
                &[
                    SqlParam::Text(hash_key(&plaintext)),
                    SqlParam::Text(id.to_string()),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(AdminError::ApiKeyNotFound { id: id.to_string() });
        }
        info!(key = %id, "api key rotated");
        Ok(IssuedApiKey {
            key: existing,
            plaintext,
        })
    }

    /// One key by id.
    pub async fn get(&self, id: &str) -> Result<ApiKey, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols} FROM {table} WHERE {id} = {p}",
            cols = key_columns(d),
            table = d.quote(APIKEYS_TABLE),
            id = d.quote("id"),
            p = d.placeholder(1),
        );
        let row = self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(id.to_string())])
            .await?;
        row.as_ref()
            .and_then(key_from_row)
            .ok_or_else(|| AdminError::ApiKeyNotFound { id: id.to_string() })
    }

    /// Resolves a presented key to its metadata and stamps `last_used_at`.
    /// Returns `None` for unknown keys.
    pub async fn verify(&self, presented: &str) -> Result<Option<ApiKey>, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols} FROM {table} WHERE {key_hash} = {p}",
            cols = key_columns(d),
            table = d.quote(APIKEYS_TABLE),
            key_hash = d.quote("key_hash"),
            p = d.placeholder(1),
        );
        let row = self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(hash_key(presented))])
            .await?;
        let Some(key) = row.as_ref().and_then(key_from_row) else {
            return Ok(None);
        };

        let touch = format!(
            "UPDATE {table} SET {last_used} = {p1} WHERE {id} = {p2}",
            table = d.quote(APIKEYS_TABLE),
            last_used = d.quote("last_used_at"),
            id = d.quote("id"),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
        );
        self.driver
            .execute(
                &touch,
                &[
                    SqlParam::Text(Utc::now().to_rfc3339()),
                    SqlParam::Text(key.id.clone()),
                ],
            )
            .await?;
        Ok(Some(key))
    }

    async fn name_taken(&self, name: &str) -> Result<bool, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {name} = {p}",
            id = d.quote("id"),
            table = d.quote(APIKEYS_TABLE),
            name = d.quote("name"),
            p = d.placeholder(1),
        );
        Ok(self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(name.to_string())])
            .await?
            .is_some())
    }
}

/// Key names: lowercase/digit first, then lowercase, digits, `-`, `_`,
/// 3-64 chars.
pub fn validate_key_name(name: &str) -> Result<(), AdminError> {
    let invalid = || AdminError::InvalidKeyName {
        name: name.to_string(),
    };
    if !(3..=64).contains(&name.len()) {
        return Err(invalid());
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return Err(invalid()),
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
        return Err(invalid());
    }
    Ok(())
}

/// 32 bytes of CSPRNG material, hex-encoded behind the key prefix.
fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", to_hex(&bytes))
}

fn hash_key(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    to_hex(&digest)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn key_columns(d: moonbase_sql::Dialect) -> String {
    ["id", "name", "owner_id", "created_at", "last_used_at"]
        .iter()
        .map(|c| d.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_from_row(row: &SqlRow) -> Option<ApiKey> {
    let text = |name: &str| match row.get(name)? {
        SqlScalar::Text(s) => Some(s.clone()),
        SqlScalar::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    };
    Some(ApiKey {
        id: text("id")?,
        name: text("name")?,
        owner_id: text("owner_id").unwrap_or_default(),
        created_at: text("created_at").unwrap_or_default(),
        last_used_at: text("last_used_at"),
    })
}
