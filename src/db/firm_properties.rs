use rusqlite::{types::Value, Connection, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::firm_property::FirmProperty;
use crate::errors::ServerError;

pub struct NewFirmProperty<'a> {
    pub parcel_no: &'a str,
    pub status: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub asking_price: Option<f64>,
    pub sold_price: Option<f64>,
    pub sold_date: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct FirmPropertyQuery {
    pub status: Option<String>,
    pub block_no: Option<i64>,
    pub area_namee: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct FirmPropertyPatch {
    pub status: Option<String>,
    pub asking_price: Option<f64>,
    pub sold_price: Option<f64>,
    pub sold_date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl FirmPropertyPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.asking_price.is_none()
            && self.sold_price.is_none()
            && self.sold_date.is_none()
            && self.title.is_none()
            && self.description.is_none()
    }
}

const SELECT_JOINED: &str = r#"
    SELECT fp.id, fp.firm_id, fp.parcel_no, fp.status,
           fp.asking_price, fp.sold_price, fp.sold_date,
           fp.title, fp.description, fp.created_at, fp.updated_at,
           p.latitude, p.longitude, p.area_namee, p.block_no, p.shape_area
      FROM firm_properties fp
 LEFT JOIN properties p ON p.parcel_no = fp.parcel_no
"#;

pub fn create_firm_property(
    db: &Database,
    firm_id: i64,
    user_id: i64,
    new: &NewFirmProperty,
    now: i64,
) -> Result<FirmProperty, ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO firm_properties
                (firm_id, user_id, parcel_no, property_type, listing_type, status,
                 asking_price, sold_price, sold_date, title, description,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, 'land', 'sale', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
            rusqlite::params![
                firm_id,
                user_id,
                new.parcel_no,
                new.status,
                new.asking_price,
                new.sold_price,
                new.sold_date,
                new.title,
                new.description.unwrap_or(""),
                now
            ],
        )
        .map_err(|e| ServerError::DbError(format!("insert firm property failed: {e}")))?;

        let id = conn.last_insert_rowid();
        get_row(conn, id, firm_id)?.ok_or(ServerError::InternalError)
    })
}

/// The firm's saved land properties, newest first, optionally narrowed by
/// status, block, area or asking-price range.
pub fn get_firm_properties(
    db: &Database,
    firm_id: i64,
    q: &FirmPropertyQuery,
) -> Result<Vec<FirmProperty>, ServerError> {
    let mut where_: Vec<String> = vec![
        "fp.firm_id = ?".into(),
        "fp.property_type = 'land'".into(),
    ];
    let mut sql_params: Vec<Value> = vec![Value::from(firm_id)];

    if let Some(v) = &q.status {
        where_.push("fp.status = ?".into());
        sql_params.push(Value::from(v.clone()));
    }
    if let Some(v) = q.block_no {
        where_.push("p.block_no = ?".into());
        sql_params.push(Value::from(v));
    }
    if let Some(v) = &q.area_namee {
        where_.push("p.area_namee = ?".into());
        sql_params.push(Value::from(v.clone()));
    }
    if let Some(v) = q.min_price {
        where_.push("fp.asking_price >= ?".into());
        sql_params.push(Value::from(v));
    }
    if let Some(v) = q.max_price {
        where_.push("fp.asking_price <= ?".into());
        sql_params.push(Value::from(v));
    }

    let sql = format!(
        "{SELECT_JOINED} WHERE {} ORDER BY fp.created_at DESC",
        where_.join(" AND ")
    );

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(sql_params.iter()), map_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

pub fn get_firm_property_by_parcel(
    db: &Database,
    firm_id: i64,
    parcel_no: &str,
) -> Result<Option<FirmProperty>, ServerError> {
    let sql = format!("{SELECT_JOINED} WHERE fp.firm_id = ? AND fp.parcel_no = ? LIMIT 1");

    db.with_conn(|conn| {
        conn.query_row(&sql, rusqlite::params![firm_id, parcel_no], map_row)
            .optional()
            .map_err(|e| ServerError::DbError(format!("select firm property failed: {e}")))
    })
}

/// Apply a patch to a firm-scoped row. Returns None when the row does not
/// exist or belongs to another firm.
pub fn update_firm_property(
    db: &Database,
    id: i64,
    firm_id: i64,
    patch: &FirmPropertyPatch,
    now: i64,
) -> Result<Option<FirmProperty>, ServerError> {
    let mut sets: Vec<&str> = Vec::new();
    let mut vals: Vec<Value> = Vec::new();

    if let Some(v) = &patch.status {
        sets.push("status = ?");
        vals.push(Value::from(v.clone()));
    }
    if let Some(v) = patch.asking_price {
        sets.push("asking_price = ?");
        vals.push(Value::from(v));
    }
    if let Some(v) = patch.sold_price {
        sets.push("sold_price = ?");
        vals.push(Value::from(v));
    }
    if let Some(v) = &patch.sold_date {
        sets.push("sold_date = ?");
        vals.push(Value::from(v.clone()));
    }
    if let Some(v) = &patch.title {
        sets.push("title = ?");
        vals.push(Value::from(v.clone()));
    }
    if let Some(v) = &patch.description {
        sets.push("description = ?");
        vals.push(Value::from(v.clone()));
    }

    sets.push("updated_at = ?");
    vals.push(Value::from(now));

    let sql = format!(
        "UPDATE firm_properties SET {} WHERE id = ? AND firm_id = ?",
        sets.join(", ")
    );
    vals.push(Value::from(id));
    vals.push(Value::from(firm_id));

    db.with_conn(|conn| {
        let updated = conn
            .execute(&sql, rusqlite::params_from_iter(vals.iter()))
            .map_err(|e| ServerError::DbError(format!("update firm property failed: {e}")))?;

        if updated == 0 {
            return Ok(None);
        }
        get_row(conn, id, firm_id)
    })
}

/// Returns false when the row does not exist or belongs to another firm.
pub fn delete_firm_property(db: &Database, id: i64, firm_id: i64) -> Result<bool, ServerError> {
    db.with_conn(|conn| {
        let deleted = conn
            .execute(
                "DELETE FROM firm_properties WHERE id = ? AND firm_id = ?",
                rusqlite::params![id, firm_id],
            )
            .map_err(|e| ServerError::DbError(format!("delete firm property failed: {e}")))?;
        Ok(deleted > 0)
    })
}

fn get_row(conn: &Connection, id: i64, firm_id: i64) -> Result<Option<FirmProperty>, ServerError> {
    let sql = format!("{SELECT_JOINED} WHERE fp.id = ? AND fp.firm_id = ?");

    conn.query_row(&sql, rusqlite::params![id, firm_id], map_row)
        .optional()
        .map_err(|e| ServerError::DbError(format!("select firm property failed: {e}")))
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<FirmProperty> {
    Ok(FirmProperty {
        id: row.get(0)?,
        firm_id: row.get(1)?,
        parcel_no: row.get(2)?,
        status: row.get(3)?,
        asking_price: row.get(4)?,
        sold_price: row.get(5)?,
        sold_date: row.get(6)?,
        title: row.get(7)?,
        description: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        latitude: row.get(11)?,
        longitude: row.get(12)?,
        area_namee: row.get(13)?,
        block_no: row.get(14)?,
        shape_area: row.get(15)?,
    })
}
