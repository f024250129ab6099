use rusqlite::{params, Connection, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::user::User;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: i64,
    pub password_hash: String,
}

pub fn find_credentials_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<Credentials>, ServerError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT user_id, password FROM users WHERE email = ? LIMIT 1",
            params![email],
            |row| {
                Ok(Credentials {
                    user_id: row.get(0)?,
                    password_hash: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select credentials failed: {e}")))
    })
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, ServerError> {
    conn.query_row(
        r#"
        SELECT user_id, first_name, last_name, email, role, firm_id, firm_name
          FROM users
         WHERE user_id = ?
        "#,
        params![user_id],
        |row| {
            Ok(User {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                role: row.get(4)?,
                firm_id: row.get(5)?,
                firm_name: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}

pub fn get_user_email(conn: &Connection, user_id: i64) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "SELECT email FROM users WHERE user_id = ? LIMIT 1",
        params![user_id],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user email failed: {e}")))
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, ServerError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE email = ? LIMIT 1",
            params![email],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select email failed: {e}")))?;
    Ok(found.is_some())
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub firm_id: i64,
    pub firm_name: &'a str,
}

pub fn insert_user(conn: &Connection, user: &NewUser, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        INSERT INTO users (first_name, last_name, email, password, role, firm_id, firm_name, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            user.first_name,
            user.last_name,
            user.email,
            user.password_hash,
            user.role,
            user.firm_id,
            user.firm_name,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert user failed: {e}")))?;

    Ok(conn.last_insert_rowid())
}
