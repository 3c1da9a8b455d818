use std::sync::Arc;

use chrono::Utc;
use moonbase_core::types::IdFactory;
use moonbase_sql::{SqlParam, SqlRow, SqlScalar};
use serde::Serialize;
use tracing::info;

use super::error::AdminError;
use super::password::PasswordHashing;
use super::token::Role;
use crate::dyn_driver::DynSqlDriver;

/// System table holding accounts. The `moon_` prefix keeps it out of the
/// collection namespace.
pub const USERS_TABLE: &str = "moon_users";

/// A user account as exposed over the API. The password hash never leaves
/// the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial update: unset fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Account management over the `moon_users` system table.
pub struct UserService {
    driver: Arc<dyn DynSqlDriver>,
    ids: Arc<IdFactory>,
    hasher: Arc<dyn PasswordHashing>,
}

impl UserService {
    pub fn new(
        driver: Arc<dyn DynSqlDriver>,
        ids: Arc<IdFactory>,
        hasher: Arc<dyn PasswordHashing>,
    ) -> Self {
        Self {
            driver,
            ids,
            hasher,
        }
    }

    /// Creates the system table when absent.
    pub async fn ensure_table(&self) -> Result<(), AdminError> {
        let d = self.driver.dialect();
        let string_type = d.sql_type(moonbase_core::types::ColumnType::String);
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({pkid}, {id}, \
             {username} {string_type} NOT NULL UNIQUE, \
             {email} {string_type} NOT NULL UNIQUE, \
             {password_hash} {string_type} NOT NULL, \
             {role} {string_type} NOT NULL, \
             {created_at} {string_type} NOT NULL, \
             {updated_at} {string_type} NOT NULL)",
            table = d.quote(USERS_TABLE),
            pkid = d.pkid_definition(),
            id = d.id_definition(),
            username = d.quote("username"),
            email = d.quote("email"),
            password_hash = d.quote("password_hash"),
            role = d.quote("role"),
            created_at = d.quote("created_at"),
            updated_at = d.quote("updated_at"),
        );
        self.driver.execute(&sql, &[]).await?;
        Ok(())
    }

    /// All accounts, id order.
    pub async fn list(&self) -> Result<Vec<User>, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols} FROM {table} ORDER BY {id} ASC",
            cols = user_columns(d),
            table = d.quote(USERS_TABLE),
            id = d.quote("id"),
        );
        let rows = self.driver.fetch_all(&sql, &[]).await?;
        Ok(rows.iter().filter_map(user_from_row).collect())
    }

    /// One account by id.
    pub async fn get(&self, id: &str) -> Result<User, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols} FROM {table} WHERE {id} = {p}",
            cols = user_columns(d),
            table = d.quote(USERS_TABLE),
            id = d.quote("id"),
            p = d.placeholder(1),
        );
        let row = self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(id.to_string())])
            .await?;
        row.as_ref()
            .and_then(user_from_row)
            .ok_or_else(|| AdminError::UserNotFound { id: id.to_string() })
    }

    /// Creates an account after field validation and uniqueness checks.
    pub async fn create(&self, new: NewUser) -> Result<User, AdminError> {
        validate_username(&new.username)?;
        validate_email(&new.email)?;
        validate_password(&new.password)?;

        if self.username_taken(&new.username, None).await? {
            return Err(AdminError::UsernameExists {
                username: new.username,
            });
        }
        if self.email_taken(&new.email, None).await? {
            return Err(AdminError::EmailExists { email: new.email });
        }

        let hash = self
            .hasher
            .hash(&new.password)
            .map_err(|e| AdminError::Driver(crate::driver::DriverError::other(e)))?;
        let id = self.ids.next_id();
        let now = Utc::now().to_rfc3339();

        let d = self.driver.dialect();
        let sql = format!(
            "INSERT INTO {table} ({id}, {username}, {email}, {password_hash}, {role}, {created_at}, {updated_at}) \
             VALUES ({p1}, {p2}, {p3}, {p4}, {p5}, {p6}, {p7})",
            table = d.quote(USERS_TABLE),
            id = d.quote("id"),
            username = d.quote("username"),
            email = d.quote("email"),
            password_hash = d.quote("password_hash"),
            role = d.quote("role"),
            created_at = d.quote("created_at"),
            updated_at = d.quote("updated_at"),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
            p3 = d.placeholder(3),
            p4 = d.placeholder(4),
            p5 = d.placeholder(5),
            p6 = d.placeholder(6),
            p7 = d.placeholder(7),
        );
        let params = vec![
            SqlParam::Text(id.as_str().to_string()),
            SqlParam::Text(new.username.clone()),
            SqlParam::Text(new.email.clone()),
            SqlParam::Text(hash),
            SqlParam::Text(new.role.as_str().to_string()),
            SqlParam::Text(now.clone()),
            SqlParam::Text(now.clone()),
        ];
        self.driver.execute(&sql, &params).await.map_err(|e| {
            if e.is_unique_violation() {
                if e.message.contains("email") {
                    AdminError::EmailExists {
                        email: new.email.clone(),
                    }
                } else {
                    AdminError::UsernameExists {
                        username: new.username.clone(),
                    }
                }
            } else {
                AdminError::Driver(e)
            }
        })?;

        info!(user = %id, username = %new.username, role = %new.role, "user created");
        Ok(User {
            id: id.as_str().to_string(),
            username: new.username,
            email: new.email,
            role: new.role,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Patches email and/or role. Self-modification is rejected; demoting
    /// the last admin is rejected under the same operation.
    pub async fn update(
        &self,
        acting_admin: &str,
        id: &str,
        patch: UserPatch,
    ) -> Result<User, AdminError> {
        if patch.email.is_none() && patch.role.is_none() {
            return Err(AdminError::InvalidFieldValue {
                field: "body".into(),
                reason: "no fields to update".into(),
            });
        }
        if acting_admin == id {
            return Err(AdminError::CannotModifySelf);
        }
        let target = self.get(id).await?;

        if let Some(new_role) = patch.role {
            let demoting_admin = target.role.is_admin() && !new_role.is_admin();
            if demoting_admin && self.count_by_role(Role::Admin).await? <= 1 {
                return Err(AdminError::CannotDeleteLastAdmin);
            }
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
            if self.email_taken(email, Some(id)).await? {
                return Err(AdminError::EmailExists {
                    email: email.clone(),
                });
            }
        }

        let d = self.driver.dialect();
        let now = Utc::now().to_rfc3339();
        let mut sets = Vec::new();
        let mut params = Vec::new();
        if let Some(email) = &patch.email {
            params.push(SqlParam::Text(email.clone()));
            sets.push(format!("{} = {}", d.quote("email"), d.placeholder(params.len())));
        }
        if let Some(role) = patch.role {
            params.push(SqlParam::Text(role.as_str().to_string()));
            sets.push(format!("{} = {}", d.quote("role"), d.placeholder(params.len())));
        }
        params.push(SqlParam::Text(now.clone()));
        sets.push(format!(
            "{} = {}",
            d.quote("updated_at"),
            d.placeholder(params.len())
        ));
        params.push(SqlParam::Text(id.to_string()));
        let sql = format!(
            "UPDATE {table} SET {sets} WHERE {id} = {p}",
            table = d.quote(USERS_TABLE),
            sets = sets.join(", "),
            id = d.quote("id"),
            p = d.placeholder(params.len()),
        );
        let affected = self.driver.execute(&sql, &params).await?;
        if affected == 0 {
            return Err(AdminError::UserNotFound { id: id.to_string() });
        }

        info!(user = %id, acting = %acting_admin, "user updated");
        let mut updated = target;
        if let Some(email) = patch.email {
            updated.email = email;
        }
        if let Some(role) = patch.role {
            updated.role = role;
        }
        updated.updated_at = now;
        Ok(updated)
    }

    /// Deletes an account. Self-deletion and deleting the last admin are
    /// rejected.
    pub async fn destroy(&self, acting_admin: &str, id: &str) -> Result<(), AdminError> {
        if acting_admin == id {
            return Err(AdminError::CannotModifySelf);
        }
        let target = self.get(id).await?;
        if target.role.is_admin() && self.count_by_role(Role::Admin).await? <= 1 {
            return Err(AdminError::CannotDeleteLastAdmin);
        }

        let d = self.driver.dialect();
        let sql = format!(
            "DELETE FROM {table} WHERE {id} = {p}",
            table = d.quote(USERS_TABLE),
            id = d.quote("id"),
            p = d.placeholder(1),
        );
        let affected = self
            .driver
            .execute(&sql, &[SqlParam::Text(id.to_string())])
            .await?;
        if affected == 0 {
            return Err(AdminError::UserNotFound { id: id.to_string() });
        }
        info!(user = %id, acting = %acting_admin, "user deleted");
        Ok(())
    }

    /// Replaces a user's password. Self-reset through the admin surface is
    /// rejected like any other self-modification.
    pub async fn reset_password(
        &self,
        acting_admin: &str,
        id: &str,
        new_password: &str,
    ) -> Result<(), AdminError> {
        if acting_admin == id {
            return Err(AdminError::CannotModifySelf);
        }
        validate_password(new_password)?;
        let hash = self
            .hasher
            .hash(new_password)
            .map_err(|e| AdminError::Driver(crate::driver::DriverError::other(e)))?;

        let d = self.driver.dialect();
        let sql = format!(
            "UPDATE {table} SET {ph} = {p1}, {updated} = {p2} WHERE {id} = {p3}",
            table = d.quote(USERS_TABLE),
            ph = d.quote("password_hash"),
            updated = d.quote("updated_at"),
            id = d.quote("id"),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
            p3 = d.placeholder(3),
        );
        let affected = self
            .driver
            .execute(
                &sql,
                &[
                    SqlParam::Text(hash),
                    SqlParam::Text(Utc::now().to_rfc3339()),
                    SqlParam::Text(id.to_string()),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(AdminError::UserNotFound { id: id.to_string() });
        }
        info!(user = %id, acting = %acting_admin, "password reset");
        Ok(())
    }

    /// Number of accounts holding a role.
    pub async fn count_by_role(&self, role: Role) -> Result<u64, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {role} = {p}",
            table = d.quote(USERS_TABLE),
            role = d.quote("role"),
            p = d.placeholder(1),
        );
        let row = self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(role.as_str().to_string())])
            .await?;
        Ok(row.map(|r| crate::projector::scalar_count(&r)).unwrap_or(0))
    }

    /// Checks username + password for login.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AdminError> {
        let d = self.driver.dialect();
        let sql = format!(
            "SELECT {cols}, {hash} FROM {table} WHERE {username} = {p}",
            cols = user_columns(d),
            hash = d.quote("password_hash"),
            table = d.quote(USERS_TABLE),
            username = d.quote("username"),
            p = d.placeholder(1),
        );
        let row = self
            .driver
            .fetch_optional(&sql, &[SqlParam::Text(username.to_string())])
            .await?;
        let Some(row) = row else {
            return Err(AdminError::InvalidCredentials);
        };
        let stored_hash = text_column(&row, "password_hash").unwrap_or_default();
        if !self.hasher.verify(password, &stored_hash) {
            return Err(AdminError::InvalidCredentials);
        }
        user_from_row(&row).ok_or(AdminError::InvalidCredentials)
    }
}

fn user_columns(d: moonbase_sql::Dialect) -> String {
    ["id", "username", "email", "role", "created_at", "updated_at"]
        .iter()
        .map(|c| d.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn text_column(row: &SqlRow, name: &str) -> Option<String> {
    match row.get(name)? {
        SqlScalar::Text(s) => Some(s.clone()),
        SqlScalar::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}

fn user_from_row(row: &SqlRow) -> Option<User> {
    Some(User {
        id: text_column(row, "id")?,
        username: text_column(row, "username")?,
        email: text_column(row, "email")?,
        role: text_column(row, "role")?.parse().ok()?,
        created_at: text_column(row, "created_at").unwrap_or_default(),
        updated_at: text_column(row, "updated_at").unwrap_or_default(),
    })
}

impl UserService {
    async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AdminError> {
        self.value_taken("username", username, exclude_id).await
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> Result<bool, AdminError> {
        self.value_taken("email", email, exclude_id).await
    }

    async fn value_taken(
        &self,
        column: &str,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AdminError> {
        let d = self.driver.dialect();
        let mut sql = format!(
            "SELECT {id} FROM {table} WHERE {column} = {p}",
            id = d.quote("id"),
            table = d.quote(USERS_TABLE),
            column = d.quote(column),
            p = d.placeholder(1),
        );
        let mut params = vec![SqlParam::Text(value.to_string())];
        if let Some(exclude) = exclude_id {
            params.push(SqlParam::Text(exclude.to_string()));
            sql.push_str(&format!(
                " AND {id} <> {p}",
                id = d.quote("id"),
                p = d.placeholder(2)
            ));
        }
        Ok(self.driver.fetch_optional(&sql, &params).await?.is_some())
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Usernames: lowercase letter first, then lowercase/digits/underscore,
/// 3-32 chars.
pub fn validate_username(username: &str) -> Result<(), AdminError> {
    if username.is_empty() {
        return Err(AdminError::MissingField {
            field: "username".into(),
        });
    }
    let mut chars = username.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_lowercase());
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_start || !valid_rest || !(3..=32).contains(&username.len()) {
        return Err(AdminError::InvalidFieldValue {
            field: "username".into(),
            reason: "must be 3-32 chars, lowercase letters, digits, underscores".into(),
        });
    }
    Ok(())
}

/// Emails: a single `@` with a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), AdminError> {
    let invalid = || AdminError::InvalidEmail {
        value: email.to_string(),
    };
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

/// Passwords: at least 8 chars with a letter and a digit.
pub fn validate_password(password: &str) -> Result<(), AdminError> {
    if password.len() < 8 {
        return Err(AdminError::WeakPassword {
            reason: "must be at least 8 characters".into(),
        });
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AdminError::WeakPassword {
            reason: "must contain at least one letter and one digit".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDriver;
    use moonbase_sql::Dialect;

    struct PlainHashing;

    impl PasswordHashing for PlainHashing {
        fn hash(&self, password: &str) -> Result<String, String> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("plain:{password}")
        }
    }

    fn setup() -> (Arc<ScriptedDriver>, UserService) {
        let driver = Arc::new(ScriptedDriver::new(Dialect::Sqlite));
        let service = UserService::new(
            driver.clone() as Arc<dyn DynSqlDriver>,
            Arc::new(IdFactory::new()),
            Arc::new(PlainHashing),
        );
        (driver, service)
    }

    fn user_row(id: &str, username: &str, role: &str) -> SqlRow {
        SqlRow::from_pairs(vec![
            ("id".into(), SqlScalar::Text(id.into())),
            ("username".into(), SqlScalar::Text(username.into())),
            (
                "email".into(),
                SqlScalar::Text(format!("{username}@example.com")),
            ),
            ("role".into(), SqlScalar::Text(role.into())),
            (
                "created_at".into(),
                SqlScalar::Text("2024-01-01T00:00:00+00:00".into()),
            ),
            (
                "updated_at".into(),
                SqlScalar::Text("2024-01-01T00:00:00+00:00".into()),
            ),
            (
                "password_hash".into(),
                SqlScalar::Text("plain:password1".into()),
            ),
        ])
    }

    fn count_row(n: i64) -> SqlRow {
        SqlRow::from_pairs(vec![("COUNT(*)".into(), SqlScalar::Int(n))])
    }

    fn new_user() -> NewUser {
        NewUser {
            username: "sam_dev".into(),
            email: "sam@example.com".into(),
            password: "password1".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_inserts_after_uniqueness_checks() {
        let (driver, service) = setup();
        driver.push_optional(None);
        driver.push_optional(None);
        let user = service.create(new_user()).await.unwrap();
        assert_eq!(user.username, "sam_dev");
        assert_eq!(user.role, Role::User);
        let log = driver.statements();
        assert_eq!(log.len(), 3);
        assert!(log[2].starts_with("INSERT INTO \"moon_users\""));
    }

    #[tokio::test]
    async fn create_rejects_taken_username() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAV", "sam_dev", "user")));
        let err = service.create(new_user()).await.unwrap_err();
        assert!(matches!(err, AdminError::UsernameExists { .. }));
    }

    #[tokio::test]
    async fn create_rejects_weak_password_and_bad_email() {
        let (_driver, service) = setup();
        let mut weak = new_user();
        weak.password = "short1".into();
        assert!(matches!(
            service.create(weak).await.unwrap_err(),
            AdminError::WeakPassword { .. }
        ));

        let mut no_digit = new_user();
        no_digit.password = "allletters".into();
        assert!(matches!(
            service.create(no_digit).await.unwrap_err(),
            AdminError::WeakPassword { .. }
        ));

        let mut bad_email = new_user();
        bad_email.email = "not-an-email".into();
        assert!(matches!(
            service.create(bad_email).await.unwrap_err(),
            AdminError::InvalidEmail { .. }
        ));
    }

    #[tokio::test]
    async fn update_self_is_rejected() {
        let (_driver, service) = setup();
        let err = service
            .update(
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                UserPatch {
                    role: Some(Role::User),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::CannotModifySelf);
    }

    #[tokio::test]
    async fn demoting_last_admin_rejected() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAW", "root", "admin")));
        driver.push_optional(Some(count_row(1)));
        let err = service
            .update(
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "01ARZ3NDEKTSV4RRFFQ69G5FAW",
                UserPatch {
                    role: Some(Role::User),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::CannotDeleteLastAdmin);
    }

    #[tokio::test]
    async fn demoting_one_of_two_admins_allowed() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAW", "root2", "admin")));
        driver.push_optional(Some(count_row(2)));
        let user = service
            .update(
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "01ARZ3NDEKTSV4RRFFQ69G5FAW",
                UserPatch {
                    role: Some(Role::User),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn destroy_last_admin_rejected() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAW", "root", "admin")));
        driver.push_optional(Some(count_row(1)));
        let err = service
            .destroy("01ARZ3NDEKTSV4RRFFQ69G5FAV", "01ARZ3NDEKTSV4RRFFQ69G5FAW")
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::CannotDeleteLastAdmin);
    }

    #[tokio::test]
    async fn destroy_regular_user_succeeds() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAW", "sam_dev", "user")));
        service
            .destroy("01ARZ3NDEKTSV4RRFFQ69G5FAV", "01ARZ3NDEKTSV4RRFFQ69G5FAW")
            .await
            .unwrap();
        assert!(driver
            .statements()
            .last()
            .unwrap()
            .starts_with("DELETE FROM \"moon_users\""));
    }

    #[tokio::test]
    async fn reset_password_self_rejected() {
        let (_driver, service) = setup();
        let err = service
            .reset_password(
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "newpassword1",
            )
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::CannotModifySelf);
    }

    #[tokio::test]
    async fn authenticate_happy_and_sad_paths() {
        let (driver, service) = setup();
        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAV", "root", "admin")));
        let user = service.authenticate("root", "password1").await.unwrap();
        assert_eq!(user.username, "root");

        driver.push_optional(Some(user_row("01ARZ3NDEKTSV4RRFFQ69G5FAV", "root", "admin")));
        let err = service.authenticate("root", "wrong").await.unwrap_err();
        assert_eq!(err, AdminError::InvalidCredentials);

        driver.push_optional(None);
        let err = service.authenticate("ghost", "password1").await.unwrap_err();
        assert_eq!(err, AdminError::InvalidCredentials);
    }

    #[tokio::test]
    async fn get_missing_user_404s() {
        let (driver, service) = setup();
        driver.push_optional(None);
        let err = service.get("01ARZ3NDEKTSV4RRFFQ69G5FAV").await.unwrap_err();
        assert!(matches!(err, AdminError::UserNotFound { .. }));
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("sam_dev").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Sam").is_err());
        assert!(validate_username("1sam").is_err());
        assert!(matches!(
            validate_username(""),
            Err(AdminError::MissingField { .. })
        ));
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last@sub.domain.org").is_ok());
        for bad in ["", "plain", "a@b", "@b.co", "a@.co", "a@b.co@c.d", "a b@c.d"] {
            assert!(validate_email(bad).is_err(), "{bad} should be invalid");
        }
    }
}
