use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

/// Stage a login OTP for a user (hash only; the raw code goes out by mail).
pub fn insert_login_otp(
    conn: &Connection,
    user_id: i64,
    otp_hash: &[u8],
    created_at: i64,
    expires_at: i64,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        INSERT INTO email_verifications (user_id, otp_hash, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
        params![user_id, otp_hash, created_at, expires_at],
    )
    .map_err(|e| ServerError::DbError(format!("insert login otp failed: {e}")))?;
    Ok(())
}

/// Consume a login OTP:
/// - must exist for the user
/// - must be unexpired and unused
/// Marks it used inside a transaction so only one consumer wins.
/// Returns true when the OTP was valid.
pub fn consume_login_otp(
    conn: &mut Connection,
    user_id: i64,
    otp_hash: &[u8],
    now: i64,
) -> Result<bool, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let updated = tx
        .execute(
            r#"
            UPDATE email_verifications
               SET used = 1
             WHERE user_id = ? AND otp_hash = ? AND used = 0 AND expires_at > ?
            "#,
            params![user_id, otp_hash, now],
        )
        .map_err(|e| ServerError::DbError(format!("consume login otp failed: {e}")))?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    Ok(updated > 0)
}

#[derive(Debug, Clone)]
pub struct RegistrationRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub firm_id: i64,
    pub firm_name: String,
    pub role: String,
}

pub struct NewRegistration<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub firm_id: i64,
    pub firm_name: &'a str,
    pub otp_hash: &'a [u8],
    pub expires_at: i64,
}

/// Upsert a pending registration keyed by email: re-registering replaces
/// the OTP and password and re-opens the window. Returns the row id that
/// goes into the reg_id cookie.
pub fn upsert_registration(conn: &Connection, reg: &NewRegistration) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        INSERT INTO registration_tokens
            (first_name, last_name, email, password, firm_id, firm_name, role, otp_hash, expires_at, used)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'staff', ?7, ?8, 0)
        ON CONFLICT(email) DO UPDATE SET
            otp_hash   = excluded.otp_hash,
            password   = excluded.password,
            expires_at = excluded.expires_at,
            used       = 0
        "#,
        params![
            reg.first_name,
            reg.last_name,
            reg.email,
            reg.password_hash,
            reg.firm_id,
            reg.firm_name,
            reg.otp_hash,
            reg.expires_at
        ],
    )
    .map_err(|e| ServerError::DbError(format!("upsert registration failed: {e}")))?;

    conn.query_row(
        "SELECT id FROM registration_tokens WHERE email = ?",
        params![reg.email],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("select registration id failed: {e}")))
}

/// Consume a registration token by id + OTP hash, single-use and
/// expiry-checked. Returns the pending row when valid.
pub fn consume_registration(
    conn: &mut Connection,
    reg_id: i64,
    otp_hash: &[u8],
    now: i64,
) -> Result<Option<RegistrationRow>, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let updated = tx
        .execute(
            r#"
            UPDATE registration_tokens
               SET used = 1
             WHERE id = ? AND otp_hash = ? AND used = 0 AND expires_at > ?
            "#,
            params![reg_id, otp_hash, now],
        )
        .map_err(|e| ServerError::DbError(format!("consume registration failed: {e}")))?;

    if updated != 1 {
        tx.rollback().ok();
        return Ok(None);
    }

    let row = tx
        .query_row(
            r#"
            SELECT id, first_name, last_name, email, password, firm_id, firm_name, role
              FROM registration_tokens
             WHERE id = ?
            "#,
            params![reg_id],
            |r| {
                Ok(RegistrationRow {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    last_name: r.get(2)?,
                    email: r.get(3)?,
                    password_hash: r.get(4)?,
                    firm_id: r.get(5)?,
                    firm_name: r.get(6)?,
                    role: r.get(7)?,
                })
            },
        )
        .map_err(|e| ServerError::DbError(format!("select registration failed: {e}")))?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    Ok(Some(row))
}

/// Email of a still-pending registration, for resends.
pub fn pending_registration_email(
    conn: &Connection,
    reg_id: i64,
) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "SELECT email FROM registration_tokens WHERE id = ? AND used = 0",
        params![reg_id],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select pending registration failed: {e}")))
}

/// Refresh the OTP on a pending registration.
pub fn refresh_registration_otp(
    conn: &Connection,
    reg_id: i64,
    otp_hash: &[u8],
    expires_at: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE registration_tokens SET otp_hash = ?, expires_at = ? WHERE id = ?",
        params![otp_hash, expires_at, reg_id],
    )
    .map_err(|e| ServerError::DbError(format!("refresh registration otp failed: {e}")))?;
    Ok(())
}
