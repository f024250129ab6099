use serde::Serialize;

/// A firm's saved land property joined with its registry attributes,
/// as managed through the /firm-properties dashboard endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct FirmProperty {
    pub id: i64,
    pub firm_id: i64,
    pub parcel_no: Option<String>,
    pub status: String,
    pub asking_price: Option<f64>,
    pub sold_price: Option<f64>,
    pub sold_date: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area_namee: Option<String>,
    pub block_no: Option<i64>,
    pub shape_area: Option<f64>,
}
