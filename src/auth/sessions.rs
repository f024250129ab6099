use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::auth::token::generate_token_default;
use crate::errors::ServerError;

pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24; // 1 day

/// Open a session for a user and return the raw cookie token.
/// Only the SHA-256 of the token is stored.
pub fn create_session(conn: &Connection, user_id: i64, now: i64) -> Result<String, ServerError> {
    let raw_token = generate_token_default();
    let hash = Sha256::digest(raw_token.as_bytes());
    let expires_at = now + SESSION_TTL_SECS;

    conn.execute(
        r#"
        insert into sessions (user_id, token_hash, created_at, expires_at)
        values (?, ?, ?, ?)
        "#,
        params![user_id, hash.as_slice(), now, expires_at],
    )
    .map_err(|e| ServerError::DbError(format!("create session failed: {e}")))?;

    Ok(raw_token)
}

/// Resolve a raw cookie token to a live user id.
pub fn load_user_from_session(
    conn: &Connection,
    raw_token: &str,
    now: i64,
) -> Result<Option<i64>, ServerError> {
    let hash = Sha256::digest(raw_token.as_bytes());

    conn.query_row(
        r#"
        select u.user_id
        from sessions s
        join users u on u.user_id = s.user_id
        where s.token_hash = ?
          and s.expires_at > ?
          and s.revoked_at is null
        "#,
        params![hash.as_slice(), now],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("session lookup failed: {e}")))
}

pub fn revoke_session(conn: &Connection, raw_token: &str, now: i64) -> Result<(), ServerError> {
    let hash = Sha256::digest(raw_token.as_bytes());

    conn.execute(
        "update sessions set revoked_at = ? where token_hash = ? and revoked_at is null",
        params![now, hash.as_slice()],
    )
    .map_err(|e| ServerError::DbError(format!("revoke session failed: {e}")))?;
    Ok(())
}
