use crate::db::connection::Database;
use crate::errors::ServerError;

/// Distinct option sets backing the dashboard filter drop-downs.

pub fn get_distinct_areas(db: &Database) -> Result<Vec<String>, ServerError> {
    distinct_text(
        db,
        "SELECT DISTINCT area_namee FROM properties WHERE area_namee IS NOT NULL ORDER BY area_namee",
    )
}

pub fn get_distinct_governorates(db: &Database) -> Result<Vec<String>, ServerError> {
    distinct_text(
        db,
        "SELECT DISTINCT min_min_go FROM properties WHERE min_min_go IS NOT NULL ORDER BY min_min_go",
    )
}

pub fn get_distinct_blocks(db: &Database) -> Result<Vec<i64>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT block_no FROM properties WHERE block_no IS NOT NULL ORDER BY block_no",
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

fn distinct_text(db: &Database, sql: &str) -> Result<Vec<String>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
