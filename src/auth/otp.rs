use rusqlite::Connection;

use crate::auth::password;
use crate::auth::token::{generate_otp_default, hash_token};
use crate::db::auth as db_auth;
use crate::db::firms;
use crate::db::users;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// TTL for login and registration OTPs in seconds.
    pub ttl_secs: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self { ttl_secs: 15 * 60 }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub email: String,
    /// Raw code (never stored; goes out by mail only).
    pub otp: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedRegistration {
    pub reg_id: i64,
    pub email: String,
    pub otp: String,
    pub expires_at: i64,
}

pub struct RegistrationRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub login_code: &'a str,
}

/// Two-step auth flows: password login staged behind an email OTP, and
/// firm-code registration staged behind an email OTP. Raw codes are only
/// ever returned to the caller for mailing; the DB holds hashes.
pub struct OtpService {
    cfg: OtpConfig,
}

impl OtpService {
    pub fn new(cfg: OtpConfig) -> Self {
        Self { cfg }
    }

    /// Trim + lowercase, minimal sanity check.
    pub fn normalize_email(email: &str) -> Result<String, ServerError> {
        let e = email.trim().to_lowercase();
        if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
            return Err(ServerError::BadRequest("invalid email".into()));
        }
        Ok(e)
    }

    /// Stage a login OTP for an already password-verified user.
    pub fn stage_login_otp(
        &self,
        conn: &Connection,
        user_id: i64,
        email: &str,
        now: i64,
    ) -> Result<IssuedOtp, ServerError> {
        let otp = generate_otp_default();
        let expires_at = now + self.cfg.ttl_secs;

        db_auth::insert_login_otp(conn, user_id, &hash_token(&otp), now, expires_at)?;

        Ok(IssuedOtp {
            email: email.to_string(),
            otp,
            expires_at,
        })
    }

    /// Re-issue a login OTP for a user mid-flow (the otp_user cookie).
    pub fn resend_login_otp(
        &self,
        conn: &Connection,
        user_id: i64,
        now: i64,
    ) -> Result<IssuedOtp, ServerError> {
        let Some(email) = users::get_user_email(conn, user_id)? else {
            return Err(ServerError::BadRequest("User not found.".into()));
        };
        self.stage_login_otp(conn, user_id, &email, now)
    }

    /// Consume a login OTP. Single-use; expired or reused codes fail.
    pub fn verify_login_otp(
        &self,
        conn: &mut Connection,
        user_id: i64,
        otp: &str,
        now: i64,
    ) -> Result<(), ServerError> {
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(ServerError::BadRequest("OTP invalid".into()));
        }
        if !db_auth::consume_login_otp(conn, user_id, &hash_token(otp), now)? {
            return Err(ServerError::BadRequest("OTP invalid".into()));
        }
        Ok(())
    }

    /// Start a registration:
    /// - firm lookup by login code
    /// - seat-limit and duplicate-email checks
    /// - upsert the pending registration with a fresh OTP
    pub fn request_registration(
        &self,
        conn: &Connection,
        req: &RegistrationRequest,
        now: i64,
    ) -> Result<IssuedRegistration, ServerError> {
        let email = Self::normalize_email(req.email)?;

        let Some(firm) = firms::find_firm_by_login_code(conn, req.login_code)? else {
            return Err(ServerError::BadRequest("Invalid registration code.".into()));
        };

        if firms::count_firm_users(conn, firm.firm_id)? >= firm.max_number_of_users {
            return Err(ServerError::BadRequest("Firm user limit reached.".into()));
        }

        if users::email_exists(conn, &email)? {
            return Err(ServerError::BadRequest(
                "Email already verified; please log in.".into(),
            ));
        }

        let otp = generate_otp_default();
        let expires_at = now + self.cfg.ttl_secs;
        let password_hash = password::hash_password(req.password)?;

        let reg_id = db_auth::upsert_registration(
            conn,
            &db_auth::NewRegistration {
                first_name: req.first_name,
                last_name: req.last_name,
                email: &email,
                password_hash: &password_hash,
                firm_id: firm.firm_id,
                firm_name: &firm.firm_name,
                otp_hash: &hash_token(&otp),
                expires_at,
            },
        )?;

        Ok(IssuedRegistration {
            reg_id,
            email,
            otp,
            expires_at,
        })
    }

    /// Complete a registration: consume the token, re-check the seat limit
    /// (it may have filled since the request), then create the user.
    /// Returns the new user id.
    pub fn verify_registration(
        &self,
        conn: &mut Connection,
        reg_id: i64,
        otp: &str,
        now: i64,
    ) -> Result<i64, ServerError> {
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(ServerError::BadRequest("OTP invalid".into()));
        }

        let Some(reg) = db_auth::consume_registration(conn, reg_id, &hash_token(otp), now)? else {
            return Err(ServerError::BadRequest("OTP invalid".into()));
        };

        let seats = firms::seat_limit_for_firm(conn, reg.firm_id)?;
        if firms::count_firm_users(conn, reg.firm_id)? >= seats {
            return Err(ServerError::BadRequest("Firm limit reached".into()));
        }

        users::insert_user(
            conn,
            &users::NewUser {
                first_name: &reg.first_name,
                last_name: &reg.last_name,
                email: &reg.email,
                password_hash: &reg.password_hash,
                role: &reg.role,
                firm_id: reg.firm_id,
                firm_name: &reg.firm_name,
            },
            now,
        )
    }

    /// Re-issue the OTP on a still-pending registration (the reg_id cookie).
    pub fn resend_registration_otp(
        &self,
        conn: &Connection,
        reg_id: i64,
        now: i64,
    ) -> Result<IssuedOtp, ServerError> {
        let Some(email) = db_auth::pending_registration_email(conn, reg_id)? else {
            return Err(ServerError::BadRequest("Registration not pending".into()));
        };

        let otp = generate_otp_default();
        let expires_at = now + self.cfg.ttl_secs;
        db_auth::refresh_registration_otp(conn, reg_id, &hash_token(&otp), expires_at)?;

        Ok(IssuedOtp {
            email,
            otp,
            expires_at,
        })
    }
}
