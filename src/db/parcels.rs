use rusqlite::{params, types::Value, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::parcel::{Parcel, ParcelGeometry};
use crate::errors::ServerError;

/// nzp codes for service/utility zonings that never appear on the public map.
pub const EXCLUDED_NZP_CODES: [&str; 13] = [
    "PS", "IS", "SP", "UP", "US", "FREEZE", "AGI", "ARC", "IST", "REC", "S", "TRN", "CSA",
];

pub fn get_parcel(db: &Database, parcel_no: &str) -> Result<Option<Parcel>, ServerError> {
    db.with_conn(|conn| {
        conn.query_row(
            r#"
            SELECT parcel_no, ewa_edd, ewa_wdd, roads, sewer, nzp_code,
                   shape_area, longitude, latitude, block_no
              FROM properties
             WHERE parcel_no = ?
            "#,
            params![parcel_no],
            |row| {
                Ok(Parcel {
                    parcel_no: row.get(0)?,
                    ewa_edd: row.get(1)?,
                    ewa_wdd: row.get(2)?,
                    roads: row.get(3)?,
                    sewer: row.get(4)?,
                    nzp_code: row.get(5)?,
                    shape_area: row.get(6)?,
                    longitude: row.get(7)?,
                    latitude: row.get(8)?,
                    block_no: row.get(9)?,
                })
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select parcel failed: {e}")))
    })
}

pub fn get_parcel_geometry(
    db: &Database,
    parcel_no: &str,
) -> Result<Option<ParcelGeometry>, ServerError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT parcel_no, longitude, latitude, geometry FROM properties WHERE parcel_no = ?",
            params![parcel_no],
            |row| {
                Ok(ParcelGeometry {
                    parcel_no: row.get(0)?,
                    longitude: row.get(1)?,
                    latitude: row.get(2)?,
                    geometry: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select parcel geometry failed: {e}")))
    })
}

/// Parcel geometries for the public map, optionally narrowed by block
/// number and/or a case-insensitive area-name substring.
pub fn get_coordinates(
    db: &Database,
    block_no: Option<i64>,
    area_namee: Option<&str>,
) -> Result<Vec<ParcelGeometry>, ServerError> {
    let placeholders = EXCLUDED_NZP_CODES
        .iter()
        .map(|_| "?")
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        r#"
        SELECT parcel_no, longitude, latitude, geometry
          FROM properties
         WHERE geometry IS NOT NULL
           AND (nzp_code IS NULL OR nzp_code NOT IN ({placeholders}))
        "#
    );

    let mut sql_params: Vec<Value> = EXCLUDED_NZP_CODES
        .iter()
        .map(|c| Value::from(c.to_string()))
        .collect();

    if let Some(block) = block_no {
        sql.push_str(" AND block_no = ?");
        sql_params.push(Value::from(block));
    }
    if let Some(area) = area_namee {
        sql.push_str(" AND area_namee LIKE ?");
        sql_params.push(Value::from(format!("%{area}%")));
    }

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(sql_params.iter()), |row| {
                Ok(ParcelGeometry {
                    parcel_no: row.get(0)?,
                    longitude: row.get(1)?,
                    latitude: row.get(2)?,
                    geometry: row.get(3)?,
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
