//! Bahrain property platform: parcel registry and marketplace HTTP API
//! plus the pure state machines behind the map-driven pages (filter
//! forms, race-guarded listing fetches, map view lifecycle).

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod flow;
pub mod geo;
pub mod mailer;
pub mod responses;
pub mod router;
