pub mod auth;
pub mod connection;
pub mod filters;
pub mod firm_properties;
pub mod firms;
pub mod listings;
pub mod notes;
pub mod parcels;
pub mod users;

pub use connection::Database;
