use rusqlite::{params, Connection, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::listing::FirmSummary;
use crate::errors::ServerError;

/// Firm row joined with its plan's seat limit, used during registration.
#[derive(Debug, Clone)]
pub struct FirmSeatInfo {
    pub firm_id: i64,
    pub firm_name: String,
    pub max_number_of_users: i64,
}

pub fn find_firm_by_login_code(
    conn: &Connection,
    login_code: &str,
) -> Result<Option<FirmSeatInfo>, ServerError> {
    conn.query_row(
        r#"
        SELECT f.firm_id, f.firm_name, pt.max_number_of_users
          FROM firms f
          JOIN plan_tiers pt ON f.plan = pt.tier_name
         WHERE f.login_code = ?
         LIMIT 1
        "#,
        params![login_code],
        |row| {
            Ok(FirmSeatInfo {
                firm_id: row.get(0)?,
                firm_name: row.get(1)?,
                max_number_of_users: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select firm failed: {e}")))
}

pub fn count_firm_users(conn: &Connection, firm_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE firm_id = ?",
        params![firm_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("count firm users failed: {e}")))
}

pub fn seat_limit_for_firm(conn: &Connection, firm_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        r#"
        SELECT pt.max_number_of_users
          FROM plan_tiers pt
          JOIN firms f ON f.plan = pt.tier_name
         WHERE f.firm_id = ?
        "#,
        params![firm_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("select seat limit failed: {e}")))
}

/// Public firm catalogue with each firm's count of available listings.
pub fn get_firms(db: &Database) -> Result<Vec<FirmSummary>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT f.firm_id,
                       f.firm_name,
                       f.logo_url,
                       COALESCE(
                         (SELECT COUNT(*)
                            FROM firm_properties fp
                           WHERE fp.firm_id = f.firm_id
                             AND fp.status = 'available'),
                         0
                       ) AS listings_count
                  FROM firms f
              ORDER BY f.firm_name
                "#,
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FirmSummary {
                    firm_id: row.get(0)?,
                    firm_name: row.get(1)?,
                    logo_url: row.get(2)?,
                    listings_count: row.get(3)?,
                })
            })
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
