use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Role for authorization. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Role::Client),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered principal. The credential hash never leaves the server.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    login: String,
    password_hash: String,
    role: String,
    is_archived: i32,
    created_at: String,
    updated_at: Option<String>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = sqlx::Error;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: format!("unknown role: {}", row.role).into(),
        })?;

        Ok(Self {
            id: row.id,
            login: row.login,
            password_hash: row.password_hash,
            role,
            is_archived: row.is_archived != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_IDENTITY: &str =
    "SELECT id, login, password_hash, role, is_archived, created_at, updated_at FROM users";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether an error is a UNIQUE constraint violation (login already taken).
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|e| e.is_unique_violation())
    }

    /// Create a new identity. Returns the assigned ID.
    pub async fn create(
        &self,
        login: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (login, password_hash, role) VALUES (?, ?, ?)")
                .bind(login)
                .bind(password_hash)
                .bind(role.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get an identity by login.
    pub async fn get_by_login(&self, login: &str) -> Result<Option<Identity>, sqlx::Error> {
        let row: Option<IdentityRow> =
            sqlx::query_as(&format!("{} WHERE login = ?", SELECT_IDENTITY))
                .bind(login)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Identity::try_from).transpose()
    }

    /// Get an identity by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Identity>, sqlx::Error> {
        let row: Option<IdentityRow> =
            sqlx::query_as(&format!("{} WHERE id = ?", SELECT_IDENTITY))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Identity::try_from).transpose()
    }

    /// Replace the credential hash for a login. Returns false if no row matched.
    pub async fn update_password(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE login = ?",
        )
        .bind(password_hash)
        .bind(login)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the role for an identity.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET role = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(role.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the archived (soft-delete) flag.
    pub async fn set_archived(&self, id: i64, archived: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_archived = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(archived as i32)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an identity by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
