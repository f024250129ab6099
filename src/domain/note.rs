use serde::Serialize;

/// Property note joined with its author's name for display.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub note_id: String,
    pub parcel_no: Option<String>,
    pub listing_id: Option<i64>,
    pub firm_id: i64,
    pub user_id: i64,
    pub note_text: String,
    pub created_at: i64,
    pub first_name: String,
    pub last_name: String,
}
