use serde::Serialize;

/// A listed land parcel joined with its registry attributes,
/// as returned by GET /land.
#[derive(Debug, Clone, Serialize)]
pub struct LandListing {
    pub id: i64,
    pub parcel_no: Option<String>,
    pub title: String,
    pub asking_price: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub shape_area: Option<f64>,
    pub nzp_code: Option<String>,
    pub governorate: Option<String>,
    pub area_namee: Option<String>,
}

/// An available apartment or house, as returned by
/// GET /marketplace/residential.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentialListing {
    pub id: i64,
    pub property_type: String,
    pub title: String,
    pub listing_type: String,
    pub asking_price: Option<f64>,
    pub rent_price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Facet option sets for the land filter bar.
#[derive(Debug, Clone, Serialize)]
pub struct LandOptions {
    pub classifications: Vec<String>,
    pub governorates: Vec<String>,
    pub locations: Vec<String>,
}

/// Facet option sets for the residential filter bar.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentialOptions {
    pub bedrooms: Vec<i64>,
    pub bathrooms: Vec<i64>,
    pub locations: Vec<String>,
}

/// Public firm catalogue entry with its count of available listings.
#[derive(Debug, Clone, Serialize)]
pub struct FirmSummary {
    pub firm_id: i64,
    pub firm_name: String,
    pub logo_url: Option<String>,
    pub listings_count: i64,
}
