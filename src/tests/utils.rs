use std::collections::HashMap;
use std::io::Read;

use astra::{Body, Response};
use http::{Method, Request};
use serde_json::Value;

use crate::auth::otp::{OtpConfig, OtpService};
use crate::auth::{password, sessions};
use crate::db::connection::{apply_schema, Database};
use crate::mailer::Mailer;
use crate::router::{handle, App};

pub const SCHEMA: &str = include_str!("../../sql/schema.sql");
pub const TEST_PASSWORD: &str = "hunter2-hunter2";

/// Fresh in-memory database with the production schema and a small
/// Bahrain fixture set: two firms, two users, a handful of parcels and
/// listings.
pub fn init_test_db() -> Database {
    let db = Database::new(":memory:");
    apply_schema(&db, SCHEMA).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    seed(&db);
    db
}

pub fn test_app() -> App {
    App {
        db: init_test_db(),
        mailer: Mailer::Log,
        otp: OtpService::new(OtpConfig::default()),
    }
}

fn seed(db: &Database) {
    let password_hash = password::hash_password(TEST_PASSWORD).unwrap();

    db.with_conn(|conn| {
        conn.execute_batch(&format!(
            r#"
            insert into firms (firm_id, firm_name, logo_url, plan, login_code) values
              (1, 'Gulf Estates', null, 'free', 'GULF-1'),
              (2, 'Manama Realty', 'https://cdn.example/manama.png', 'pro', 'MNM-2');

            insert into users (user_id, first_name, last_name, email, password, role, firm_id, firm_name, created_at) values
              (1, 'Admin', 'User', 'admin@gulf.bh', '{hash}', 'admin', 1, 'Gulf Estates', 0),
              (2, 'Staff', 'Agent', 'agent@gulf.bh', '{hash}', 'staff', 1, 'Gulf Estates', 0);

            insert into properties (parcel_no, block_no, area_namee, min_min_go, nzp_code, ewa_edd, ewa_wdd, roads, sewer, shape_area, longitude, latitude, geometry) values
              ('03020551', 302, 'BU QUWAH', 'Northern', 'RA', 'Available', 'Available', 'Paved', 'Connected', 450.5, null, null,
               '{{"type":"Polygon","coordinates":[[[50.55,26.22],[50.551,26.22],[50.551,26.221],[50.55,26.221],[50.55,26.22]]]}}'),
              ('03020552', 302, 'BU QUWAH', 'Northern', 'PS', null, null, null, null, 1200.0, null, null,
               '{{"type":"Polygon","coordinates":[[[50.56,26.23],[50.561,26.23],[50.561,26.231],[50.56,26.23]]]}}'),
              ('04010001', 401, 'SAAR', 'Northern', 'RB', null, null, null, null, 800.0, 50.47, 26.19,
               '{{"type":"Polygon","coordinates":[[[50.47,26.19],[50.471,26.19],[50.471,26.191],[50.47,26.19]]]}}'),
              ('05050005', 505, 'JUFFAIR', 'Capital', 'RA', null, null, null, null, 300.0, null, null, null);

            insert into firm_properties (id, firm_id, parcel_no, title, property_type, listing_type, status, asking_price, rent_price, bedrooms, bathrooms, area_name, latitude, longitude, created_at, updated_at) values
              (10, 1, '03020551', 'Corner plot in Bu Quwah', 'land', 'sale', 'listed', 120000, null, null, null, null, null, null, 0, 100),
              (11, 2, '04010001', 'Saar residential land', 'land', 'sale', 'listed', 95000, null, null, null, null, null, null, 0, 200),
              (12, 1, null, 'Juffair 2BR apartment', 'apartment', 'rent', 'available', null, 550, 2, 2, 'JUFFAIR', 26.21, 50.60, 0, 300),
              (13, 2, null, 'Saar family villa', 'house', 'sale', 'available', 210000, null, 4, 3, 'SAAR', 26.19, 50.47, 0, 400),
              (14, 1, null, 'Unlisted draft plot', 'land', 'sale', 'draft', 50000, null, null, null, null, null, null, 0, 500);
            "#,
            hash = password_hash,
        ))
        .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))
    })
    .unwrap();
}

/// Drive the router directly, the way astra would.
pub fn send(app: &App, method: Method, uri: &str, cookies: &[(&str, &str)], body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);

    if !cookies.is_empty() {
        let header = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header("Cookie", header);
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(v.to_string().into_bytes())
        }
        None => Body::empty(),
    };

    let req = builder.body(body).unwrap();
    match handle(req, app) {
        Ok(resp) => resp,
        Err(err) => crate::responses::error_to_response(err),
    }
}

pub fn get(app: &App, uri: &str) -> Response {
    send(app, Method::GET, uri, &[], None)
}

pub fn body_json(resp: Response) -> Value {
    let mut raw = String::new();
    resp.into_body().reader().read_to_string(&mut raw).unwrap();
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("non-JSON body: {e}: {raw}"))
}

/// Open a session for a seeded user and return the raw cookie token.
pub fn login_session(app: &App, user_id: i64) -> String {
    app.db
        .with_conn(|conn| sessions::create_session(conn, user_id, chrono::Utc::now().timestamp()))
        .unwrap()
}

/// All Set-Cookie values of a response, keyed by cookie name.
pub fn set_cookies(resp: &Response) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for value in resp.headers().get_all("set-cookie") {
        let raw = value.to_str().unwrap();
        let first = raw.split(';').next().unwrap();
        let mut parts = first.splitn(2, '=');
        if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
            map.insert(k.to_string(), v.to_string());
        }
    }
    map
}
