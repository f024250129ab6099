use serde::Serialize;

/// Attribute record for a government parcel, as returned by
/// GET /parcelData/{parcelNo}.
#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    pub parcel_no: String,
    pub ewa_edd: Option<String>,
    pub ewa_wdd: Option<String>,
    pub roads: Option<String>,
    pub sewer: Option<String>,
    pub nzp_code: Option<String>,
    pub shape_area: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub block_no: Option<i64>,
}

/// Parcel row carrying its stored GeoJSON geometry, used by the
/// /coordinates and /parcelData/geo endpoints.
#[derive(Debug, Clone)]
pub struct ParcelGeometry {
    pub parcel_no: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// GeoJSON geometry text in EPSG:4326, as imported.
    pub geometry: Option<String>,
}
