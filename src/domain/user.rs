use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub firm_id: i64,
    pub firm_name: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}
