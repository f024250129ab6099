use rusqlite::types::Value;

use crate::db::connection::Database;
use crate::domain::listing::{
    LandListing, LandOptions, ResidentialListing, ResidentialOptions,
};
use crate::errors::ServerError;

/// Price sort direction forwarded from the `sort` query param.
/// Anything other than asc/desc falls back to newest-updated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    Asc,
    Desc,
    #[default]
    Newest,
}

impl Sort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => Sort::Asc,
            Some("desc") => Sort::Desc,
            _ => Sort::Newest,
        }
    }
}

#[derive(Debug, Default)]
pub struct LandQuery {
    pub nzp_code: Option<String>,
    pub governorate: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub sort: Sort,
}

#[derive(Debug, Default)]
pub struct ResidentialQuery {
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area_name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Sort,
}

// Appends `clause` to the WHERE list and its value to the param list.
fn add(val: Value, clause: &str, where_: &mut Vec<String>, sql_params: &mut Vec<Value>) {
    where_.push(clause.to_string());
    sql_params.push(val);
}

pub fn get_listed_land(db: &Database, q: &LandQuery) -> Result<Vec<LandListing>, ServerError> {
    let mut where_: Vec<String> = vec![
        "fp.status = 'listed'".into(),
        "fp.property_type = 'land'".into(),
    ];
    let mut sql_params: Vec<Value> = Vec::new();

    if let Some(v) = &q.nzp_code {
        add(Value::from(v.clone()), "p.nzp_code = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = &q.governorate {
        add(Value::from(v.clone()), "p.min_min_go = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = &q.location {
        add(Value::from(v.clone()), "p.area_namee = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.min_price {
        add(Value::from(v), "fp.asking_price >= ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.max_price {
        add(Value::from(v), "fp.asking_price <= ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.min_area {
        add(Value::from(v), "p.shape_area >= ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.max_area {
        add(Value::from(v), "p.shape_area <= ?", &mut where_, &mut sql_params);
    }

    let order = match q.sort {
        Sort::Asc => "fp.asking_price ASC",
        Sort::Desc => "fp.asking_price DESC",
        Sort::Newest => "fp.updated_at DESC",
    };

    let sql = format!(
        r#"
        SELECT fp.id,
               fp.parcel_no,
               fp.title,
               fp.asking_price,
               p.longitude,
               p.latitude,
               p.shape_area,
               p.nzp_code,
               p.min_min_go,
               p.area_namee
          FROM firm_properties fp
     LEFT JOIN properties p ON p.parcel_no = fp.parcel_no
         WHERE {}
      ORDER BY {}
        "#,
        where_.join(" AND "),
        order
    );

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(sql_params.iter()), |row| {
                Ok(LandListing {
                    id: row.get(0)?,
                    parcel_no: row.get(1)?,
                    title: row.get(2)?,
                    asking_price: row.get(3)?,
                    longitude: row.get(4)?,
                    latitude: row.get(5)?,
                    shape_area: row.get(6)?,
                    nzp_code: row.get(7)?,
                    governorate: row.get(8)?,
                    area_namee: row.get(9)?,
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

/// Full option lists for the land filter bar, independent of the active
/// filters so cleared facets still show every choice.
pub fn get_land_options(db: &Database) -> Result<LandOptions, ServerError> {
    db.with_conn(|conn| {
        let classifications = distinct_strings(
            conn,
            "SELECT DISTINCT nzp_code FROM properties WHERE nzp_code IS NOT NULL ORDER BY nzp_code",
        )?;
        let governorates = distinct_strings(
            conn,
            "SELECT DISTINCT min_min_go FROM properties WHERE min_min_go IS NOT NULL ORDER BY min_min_go",
        )?;
        let locations = distinct_strings(
            conn,
            "SELECT DISTINCT area_namee FROM properties WHERE area_namee IS NOT NULL ORDER BY area_namee",
        )?;

        Ok(LandOptions {
            classifications,
            governorates,
            locations,
        })
    })
}

pub fn get_listed_residential(
    db: &Database,
    q: &ResidentialQuery,
) -> Result<Vec<ResidentialListing>, ServerError> {
    let mut where_: Vec<String> = vec![
        "fp.status = 'available'".into(),
        "fp.property_type IN ('apartment','house')".into(),
    ];
    let mut sql_params: Vec<Value> = Vec::new();

    if let Some(v) = &q.property_type {
        add(Value::from(v.clone()), "fp.property_type = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = &q.listing_type {
        add(Value::from(v.clone()), "fp.listing_type = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.bedrooms {
        add(Value::from(v), "fp.bedrooms = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.bathrooms {
        add(Value::from(v), "fp.bathrooms = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = &q.area_name {
        add(Value::from(v.clone()), "fp.area_name = ?", &mut where_, &mut sql_params);
    }
    if let Some(v) = q.min_price {
        add(
            Value::from(v),
            "COALESCE(fp.asking_price, fp.rent_price) >= ?",
            &mut where_,
            &mut sql_params,
        );
    }
    if let Some(v) = q.max_price {
        add(
            Value::from(v),
            "COALESCE(fp.asking_price, fp.rent_price) <= ?",
            &mut where_,
            &mut sql_params,
        );
    }

    let order = match q.sort {
        Sort::Asc => "COALESCE(fp.asking_price, fp.rent_price) ASC",
        Sort::Desc => "COALESCE(fp.asking_price, fp.rent_price) DESC",
        Sort::Newest => "fp.updated_at DESC",
    };

    let sql = format!(
        r#"
        SELECT fp.id,
               fp.property_type,
               fp.title,
               fp.listing_type,
               fp.asking_price,
               fp.rent_price,
               fp.bedrooms,
               fp.bathrooms,
               fp.area_name,
               fp.latitude,
               fp.longitude
          FROM firm_properties fp
         WHERE {}
      ORDER BY {}
        "#,
        where_.join(" AND "),
        order
    );

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(sql_params.iter()), |row| {
                Ok(ResidentialListing {
                    id: row.get(0)?,
                    property_type: row.get(1)?,
                    title: row.get(2)?,
                    listing_type: row.get(3)?,
                    asking_price: row.get(4)?,
                    rent_price: row.get(5)?,
                    bedrooms: row.get(6)?,
                    bathrooms: row.get(7)?,
                    area_name: row.get(8)?,
                    latitude: row.get(9)?,
                    longitude: row.get(10)?,
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

pub fn get_residential_options(db: &Database) -> Result<ResidentialOptions, ServerError> {
    db.with_conn(|conn| {
        let bedrooms = distinct_i64s(
            conn,
            r#"SELECT DISTINCT bedrooms FROM firm_properties
               WHERE property_type IN ('apartment','house') AND bedrooms IS NOT NULL
               ORDER BY bedrooms"#,
        )?;
        let bathrooms = distinct_i64s(
            conn,
            r#"SELECT DISTINCT bathrooms FROM firm_properties
               WHERE property_type IN ('apartment','house') AND bathrooms IS NOT NULL
               ORDER BY bathrooms"#,
        )?;
        let locations = distinct_strings(
            conn,
            r#"SELECT DISTINCT area_name FROM firm_properties
               WHERE property_type IN ('apartment','house') AND area_name IS NOT NULL
               ORDER BY area_name"#,
        )?;

        Ok(ResidentialOptions {
            bedrooms,
            bathrooms,
            locations,
        })
    })
}

fn distinct_strings(conn: &rusqlite::Connection, sql: &str) -> Result<Vec<String>, ServerError> {
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
}

fn distinct_i64s(conn: &rusqlite::Connection, sql: &str) -> Result<Vec<i64>, ServerError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}
