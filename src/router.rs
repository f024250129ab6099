use std::collections::HashMap;
use std::io::Read;

use astra::Request;
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::otp::{OtpService, RegistrationRequest};
use crate::auth::{password, sessions, token};
use crate::db::{self, Database};
use crate::domain::user::User;
use crate::errors::ServerError;
use crate::geo;
use crate::mailer::Mailer;
use crate::responses::json::{clear_cookie, set_cookie};
use crate::responses::{json_response, json_response_with_cookies, ResultResp};

/// Lifetime of the otp_user / reg_id staging cookies.
const OTP_COOKIE_SECS: i64 = 15 * 60;

pub struct App {
    pub db: Database,
    pub mailer: Mailer,
    pub otp: OtpService,
}

pub fn handle(req: Request, app: &App) -> ResultResp {
    let (parts, body) = req.into_parts();
    let method = parts.method.as_str();
    let path = parts.uri.path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let query = parse_query(parts.uri.query());
    let cookies = parse_cookies(&parts.headers);

    log::debug!("{method} {path}");

    match (method, segments.as_slice()) {
        ("GET", ["coordinates"]) => get_coordinates(app, &query),

        ("GET", ["parcelData", parcel_no]) => get_parcel_data(app, parcel_no),
        ("GET", ["parcelData", "geo", parcel_no]) => get_parcel_geo(app, parcel_no),

        ("GET", ["land"]) => get_land(app, &query),
        ("GET", ["marketplace", "residential"]) => get_residential(app, &query),
        ("GET", ["marketplace", "firms"]) => get_firms(app),

        ("GET", ["propertyFilters", facet]) => get_property_filters(app, &cookies, facet),

        ("GET", ["firm-properties"]) => get_firm_properties(app, &cookies, &query),
        ("POST", ["firm-properties"]) => post_firm_property(app, &cookies, read_json_body(body)?),
        ("GET", ["firm-properties", parcel_no]) => {
            get_firm_property_by_parcel(app, &cookies, parcel_no)
        }
        ("PATCH", ["firm-properties", id]) => {
            patch_firm_property(app, &cookies, id, read_json_body(body)?)
        }
        ("DELETE", ["firm-properties", id]) => delete_firm_property(app, &cookies, id),

        ("GET", ["property-notes"]) => get_notes(app, &cookies, &query),
        ("POST", ["property-notes"]) => post_note(app, &cookies, read_json_body(body)?),
        ("DELETE", ["property-notes", note_id]) => delete_note(app, &cookies, note_id),

        ("POST", ["auth", "login"]) => auth_login(app, read_json_body(body)?),
        ("POST", ["auth", "verify-otp"]) => auth_verify_otp(app, &cookies, read_json_body(body)?),
        ("POST", ["auth", "register"]) => auth_register(app, read_json_body(body)?),
        ("POST", ["auth", "verify-register-otp"]) => {
            auth_verify_register_otp(app, &cookies, read_json_body(body)?)
        }
        ("POST", ["auth", "resend-otp"]) => auth_resend_otp(app, &cookies),
        ("POST", ["auth", "logout"]) => auth_logout(app, &cookies),

        ("GET", ["user", "me"]) => user_me(app, &cookies),

        _ => Err(ServerError::NotFound),
    }
}

/* ── public map + parcels ─────────────────────────────────────────── */

fn get_coordinates(app: &App, query: &HashMap<String, String>) -> ResultResp {
    let block_no = query.get("block_no").and_then(|v| v.parse::<i64>().ok());
    let area_namee = query.get("area_namee").map(String::as_str);

    let parcels = db::parcels::get_coordinates(&app.db, block_no, area_namee)?;
    let collection = geo::parcel_feature_collection(&parcels);

    let body = serde_json::to_value(&collection).map_err(|_| ServerError::InternalError)?;
    json_response(200, &body)
}

fn get_parcel_data(app: &App, parcel_no: &str) -> ResultResp {
    match db::parcels::get_parcel(&app.db, parcel_no)? {
        Some(parcel) => {
            let body = serde_json::to_value(&parcel).map_err(|_| ServerError::InternalError)?;
            json_response(200, &body)
        }
        None => json_response(404, &json!({ "error": "Parcel not found" })),
    }
}

fn get_parcel_geo(app: &App, parcel_no: &str) -> ResultResp {
    match db::parcels::get_parcel_geometry(&app.db, parcel_no)? {
        Some(row) => {
            let feature = geo::parcel_feature(&row)?;
            let body = serde_json::to_value(&feature).map_err(|_| ServerError::InternalError)?;
            json_response(200, &body)
        }
        None => json_response(404, &json!({ "error": "Parcel not found" })),
    }
}

/* ── marketplace ──────────────────────────────────────────────────── */

fn get_land(app: &App, query: &HashMap<String, String>) -> ResultResp {
    let q = db::listings::LandQuery {
        nzp_code: non_empty(query, "nzp_code"),
        governorate: non_empty(query, "governorate"),
        location: non_empty(query, "location"),
        min_price: parse_f64(query, "minPrice"),
        max_price: parse_f64(query, "maxPrice"),
        min_area: parse_f64(query, "minArea"),
        max_area: parse_f64(query, "maxArea"),
        sort: db::listings::Sort::parse(query.get("sort").map(String::as_str)),
    };

    let land = db::listings::get_listed_land(&app.db, &q)?;
    let options = db::listings::get_land_options(&app.db)?;

    json_response(200, &json!({ "land": land, "options": options }))
}

fn get_residential(app: &App, query: &HashMap<String, String>) -> ResultResp {
    let q = db::listings::ResidentialQuery {
        property_type: non_empty(query, "type"),
        listing_type: non_empty(query, "listing_type"),
        bedrooms: parse_i64(query, "bedrooms"),
        bathrooms: parse_i64(query, "bathrooms"),
        area_name: non_empty(query, "area_name"),
        min_price: parse_f64(query, "minPrice"),
        max_price: parse_f64(query, "maxPrice"),
        sort: db::listings::Sort::parse(query.get("sort").map(String::as_str)),
    };

    let listings = db::listings::get_listed_residential(&app.db, &q)?;
    let options = db::listings::get_residential_options(&app.db)?;

    json_response(200, &json!({ "listings": listings, "options": options }))
}

fn get_firms(app: &App) -> ResultResp {
    let firms = db::firms::get_firms(&app.db)?;
    json_response(200, &json!({ "firms": firms }))
}

/* ── dashboard filter options ─────────────────────────────────────── */

fn get_property_filters(app: &App, cookies: &HashMap<String, String>, facet: &str) -> ResultResp {
    require_user(app, cookies)?;

    match facet {
        "areas" => {
            let area_names = db::filters::get_distinct_areas(&app.db)?;
            json_response(200, &json!({ "areaNames": area_names }))
        }
        "blocks" => {
            let block_numbers = db::filters::get_distinct_blocks(&app.db)?;
            json_response(200, &json!({ "blockNumbers": block_numbers }))
        }
        "governorates" => {
            let governorates = db::filters::get_distinct_governorates(&app.db)?;
            json_response(200, &json!({ "governorates": governorates }))
        }
        _ => Err(ServerError::NotFound),
    }
}

/* ── firm property management ─────────────────────────────────────── */

/// Listing lifecycle rules: listed needs an asking price, sold needs a
/// sold price and date.
fn validate_status_fields(status: &str, body: &Value) -> Result<(), ServerError> {
    match status {
        "listed" => {
            if body.get("asking_price").and_then(|v| v.as_f64()).is_none() {
                return Err(ServerError::BadRequest(
                    "asking_price is required when status=listed.".into(),
                ));
            }
            Ok(())
        }
        "sold" => {
            if body.get("sold_price").and_then(|v| v.as_f64()).is_none() {
                return Err(ServerError::BadRequest(
                    "sold_price is required when status=sold.".into(),
                ));
            }
            if body.get("sold_date").and_then(|v| v.as_str()).is_none() {
                return Err(ServerError::BadRequest(
                    "sold_date is required when status=sold.".into(),
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn post_firm_property(app: &App, cookies: &HashMap<String, String>, body: Value) -> ResultResp {
    let user = require_user(app, cookies)?;

    let parcel_no = str_field(&body, "parcel_no")?;
    let status = str_field(&body, "status")?;
    let title = str_field(&body, "title")?;
    validate_status_fields(status, &body)?;

    let created = db::firm_properties::create_firm_property(
        &app.db,
        user.firm_id,
        user.user_id,
        &db::firm_properties::NewFirmProperty {
            parcel_no,
            status,
            title,
            description: body.get("description").and_then(|v| v.as_str()),
            asking_price: body.get("asking_price").and_then(|v| v.as_f64()),
            sold_price: body.get("sold_price").and_then(|v| v.as_f64()),
            sold_date: body.get("sold_date").and_then(|v| v.as_str()),
        },
        now(),
    )?;

    json_response(201, &json!({ "message": "Firm property created", "firmProperty": created }))
}

fn get_firm_properties(
    app: &App,
    cookies: &HashMap<String, String>,
    query: &HashMap<String, String>,
) -> ResultResp {
    let user = require_user(app, cookies)?;

    let q = db::firm_properties::FirmPropertyQuery {
        status: non_empty(query, "status"),
        block_no: parse_i64(query, "block_no"),
        area_namee: non_empty(query, "area_namee"),
        min_price: parse_f64(query, "minPrice"),
        max_price: parse_f64(query, "maxPrice"),
    };

    let properties = db::firm_properties::get_firm_properties(&app.db, user.firm_id, &q)?;
    json_response(200, &json!({ "firmProperties": properties }))
}

fn get_firm_property_by_parcel(
    app: &App,
    cookies: &HashMap<String, String>,
    parcel_no: &str,
) -> ResultResp {
    let user = require_user(app, cookies)?;

    match db::firm_properties::get_firm_property_by_parcel(&app.db, user.firm_id, parcel_no)? {
        Some(property) => json_response(200, &json!({ "firmProperty": property })),
        None => json_response(
            404,
            &json!({ "message": format!("No firm_properties record for {parcel_no}") }),
        ),
    }
}

fn patch_firm_property(
    app: &App,
    cookies: &HashMap<String, String>,
    id: &str,
    body: Value,
) -> ResultResp {
    let user = require_user(app, cookies)?;
    let Ok(id) = id.parse::<i64>() else {
        return Err(ServerError::NotFound);
    };

    if let Some(status) = body.get("status").and_then(|v| v.as_str()) {
        validate_status_fields(status, &body)?;
    }

    let patch = db::firm_properties::FirmPropertyPatch {
        status: body.get("status").and_then(|v| v.as_str()).map(String::from),
        asking_price: body.get("asking_price").and_then(|v| v.as_f64()),
        sold_price: body.get("sold_price").and_then(|v| v.as_f64()),
        sold_date: body.get("sold_date").and_then(|v| v.as_str()).map(String::from),
        title: body.get("title").and_then(|v| v.as_str()).map(String::from),
        description: body
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from),
    };
    if patch.is_empty() {
        return Err(ServerError::BadRequest("No valid fields to update.".into()));
    }

    match db::firm_properties::update_firm_property(&app.db, id, user.firm_id, &patch, now())? {
        Some(updated) => json_response(
            200,
            &json!({ "message": "Firm property updated successfully.", "updatedProperty": updated }),
        ),
        None => json_response(
            404,
            &json!({ "message": "Firm property not found or not yours." }),
        ),
    }
}

fn delete_firm_property(app: &App, cookies: &HashMap<String, String>, id: &str) -> ResultResp {
    let user = require_user(app, cookies)?;
    let Ok(id) = id.parse::<i64>() else {
        return Err(ServerError::NotFound);
    };

    if !db::firm_properties::delete_firm_property(&app.db, id, user.firm_id)? {
        return json_response(
            404,
            &json!({ "message": "Firm property not found or not yours." }),
        );
    }

    json_response(200, &json!({ "message": "Firm property deleted successfully." }))
}

/* ── property notes ───────────────────────────────────────────────── */

fn get_notes(app: &App, cookies: &HashMap<String, String>, query: &HashMap<String, String>) -> ResultResp {
    let user = require_user(app, cookies)?;

    let notes = db::notes::get_notes_for_firm(
        &app.db,
        user.firm_id,
        query.get("parcel_no").map(String::as_str),
        parse_i64(query, "listing_id"),
    )?;

    json_response(200, &json!({ "notes": notes }))
}

fn post_note(app: &App, cookies: &HashMap<String, String>, body: Value) -> ResultResp {
    let user = require_user(app, cookies)?;

    let note_text = body.get("note_text").and_then(|v| v.as_str()).unwrap_or("");
    if note_text.is_empty() {
        return Err(ServerError::BadRequest("note_text is required.".into()));
    }

    let note_id = token::generate_token_default();
    let note = db::notes::insert_note(
        &app.db,
        &note_id,
        &db::notes::NewNote {
            parcel_no: body.get("parcel_no").and_then(|v| v.as_str()),
            listing_id: body.get("listing_id").and_then(|v| v.as_i64()),
            firm_id: user.firm_id,
            user_id: user.user_id,
            note_text,
        },
        now(),
    )?;

    json_response(201, &json!({ "message": "Note created successfully.", "note": note }))
}

fn delete_note(app: &App, cookies: &HashMap<String, String>, note_id: &str) -> ResultResp {
    let user = require_user(app, cookies)?;
    if !user.is_admin() {
        return Err(ServerError::Forbidden("Only admins can delete notes.".into()));
    }

    if !db::notes::delete_note(&app.db, note_id)? {
        return json_response(404, &json!({ "success": false, "message": "Note not found." }));
    }

    json_response(200, &json!({ "message": "Note deleted successfully." }))
}

/* ── auth ─────────────────────────────────────────────────────────── */

fn auth_login(app: &App, body: Value) -> ResultResp {
    let email = OtpService::normalize_email(str_field(&body, "email")?)?;
    let password_raw = str_field(&body, "password")?;

    let Some(creds) = db::users::find_credentials_by_email(&app.db, &email)? else {
        return Err(ServerError::Unauthorized("Invalid credentials".into()));
    };
    if !password::verify_password(password_raw, &creds.password_hash) {
        return Err(ServerError::Unauthorized("Invalid credentials".into()));
    }

    let issued = app
        .db
        .with_conn(|conn| app.otp.stage_login_otp(conn, creds.user_id, &email, now()))?;
    app.mailer.send_otp(&issued.email, "Login OTP", &issued.otp)?;

    json_response_with_cookies(
        200,
        &json!({ "success": true, "message": "OTP sent" }),
        &[set_cookie("otp_user", &creds.user_id.to_string(), OTP_COOKIE_SECS, false)],
    )
}

fn auth_verify_otp(app: &App, cookies: &HashMap<String, String>, body: Value) -> ResultResp {
    let Some(user_id) = cookies.get("otp_user").and_then(|v| v.parse::<i64>().ok()) else {
        return Err(ServerError::BadRequest("Login expired".into()));
    };
    let otp = str_field(&body, "otp")?;

    let raw_token = app.db.with_conn(|conn| {
        app.otp.verify_login_otp(conn, user_id, otp, now())?;
        sessions::create_session(conn, user_id, now())
    })?;

    json_response_with_cookies(
        200,
        &json!({ "success": true, "message": "Logged in" }),
        &[
            set_cookie("token", &raw_token, sessions::SESSION_TTL_SECS, true),
            clear_cookie("otp_user"),
        ],
    )
}

fn auth_register(app: &App, body: Value) -> ResultResp {
    let req = RegistrationRequest {
        first_name: str_field(&body, "first_name")?,
        last_name: str_field(&body, "last_name")?,
        email: str_field(&body, "email")?,
        password: str_field(&body, "password")?,
        login_code: str_field(&body, "login_code")?,
    };

    let issued = app
        .db
        .with_conn(|conn| app.otp.request_registration(conn, &req, now()))?;
    app.mailer
        .send_otp(&issued.email, "Complete Registration", &issued.otp)?;

    json_response_with_cookies(
        200,
        &json!({ "success": true, "message": "OTP sent to your email." }),
        &[set_cookie("reg_id", &issued.reg_id.to_string(), OTP_COOKIE_SECS, false)],
    )
}

fn auth_verify_register_otp(app: &App, cookies: &HashMap<String, String>, body: Value) -> ResultResp {
    let Some(reg_id) = cookies.get("reg_id").and_then(|v| v.parse::<i64>().ok()) else {
        return Err(ServerError::BadRequest("Expired".into()));
    };
    let otp = str_field(&body, "otp")?;

    let raw_token = app.db.with_conn(|conn| {
        let user_id = app.otp.verify_registration(conn, reg_id, otp, now())?;
        sessions::create_session(conn, user_id, now())
    })?;

    json_response_with_cookies(
        200,
        &json!({ "success": true, "message": "Account verified" }),
        &[
            set_cookie("token", &raw_token, sessions::SESSION_TTL_SECS, true),
            clear_cookie("reg_id"),
        ],
    )
}

/// One resend endpoint serves both staged flows: a pending login
/// (otp_user cookie) takes precedence over a pending registration.
fn auth_resend_otp(app: &App, cookies: &HashMap<String, String>) -> ResultResp {
    if let Some(user_id) = cookies.get("otp_user").and_then(|v| v.parse::<i64>().ok()) {
        let issued = app
            .db
            .with_conn(|conn| app.otp.resend_login_otp(conn, user_id, now()))?;
        app.mailer.send_otp(&issued.email, "New login OTP", &issued.otp)?;

        return json_response_with_cookies(
            200,
            &json!({ "success": true, "message": "OTP resent." }),
            &[set_cookie("otp_user", &user_id.to_string(), OTP_COOKIE_SECS, false)],
        );
    }

    if let Some(reg_id) = cookies.get("reg_id").and_then(|v| v.parse::<i64>().ok()) {
        let issued = app
            .db
            .with_conn(|conn| app.otp.resend_registration_otp(conn, reg_id, now()))?;
        app.mailer.send_otp(&issued.email, "New OTP", &issued.otp)?;

        return json_response(200, &json!({ "success": true, "message": "OTP resent." }));
    }

    Err(ServerError::BadRequest("Login expired.".into()))
}

fn auth_logout(app: &App, cookies: &HashMap<String, String>) -> ResultResp {
    if let Some(raw_token) = cookies.get("token") {
        app.db
            .with_conn(|conn| sessions::revoke_session(conn, raw_token, now()))?;
    }

    json_response_with_cookies(
        200,
        &json!({ "success": true, "message": "Logged out" }),
        &[
            clear_cookie("token"),
            clear_cookie("otp_user"),
            clear_cookie("reg_id"),
        ],
    )
}

fn user_me(app: &App, cookies: &HashMap<String, String>) -> ResultResp {
    let user = require_user(app, cookies)?;
    let body = serde_json::to_value(&user).map_err(|_| ServerError::InternalError)?;
    json_response(200, &json!({ "success": true, "user": body }))
}

/* ── helpers ──────────────────────────────────────────────────────── */

fn require_user(app: &App, cookies: &HashMap<String, String>) -> Result<User, ServerError> {
    let Some(raw_token) = cookies.get("token") else {
        return Err(ServerError::Unauthorized("Not logged in or missing user context.".into()));
    };

    app.db.with_conn(|conn| {
        let Some(user_id) = sessions::load_user_from_session(conn, raw_token, now())? else {
            return Err(ServerError::Unauthorized("Not logged in or missing user context.".into()));
        };
        db::users::get_user(conn, user_id)?
            .ok_or_else(|| ServerError::Unauthorized("Not logged in or missing user context.".into()))
    })
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(raw) = raw {
        for (k, v) in url::form_urlencoded::parse(raw.as_bytes()) {
            map.insert(k.into_owned(), v.into_owned());
        }
    }
    map
}

fn parse_cookies(headers: &http::HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(header) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        for pair in header.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }
    map
}

fn read_json_body(mut body: astra::Body) -> Result<Value, ServerError> {
    let mut raw = String::new();
    body.reader()
        .read_to_string(&mut raw)
        .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;

    if raw.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&raw).map_err(|e| ServerError::BadRequest(format!("invalid JSON: {e}")))
}

fn str_field<'a>(body: &'a Value, field: &str) -> Result<&'a str, ServerError> {
    body.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("{field} is required")))
}

fn non_empty(query: &HashMap<String, String>, key: &str) -> Option<String> {
    query.get(key).filter(|v| !v.is_empty()).cloned()
}

fn parse_f64(query: &HashMap<String, String>, key: &str) -> Option<f64> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn parse_i64(query: &HashMap<String, String>, key: &str) -> Option<i64> {
    query.get(key).and_then(|v| v.parse().ok())
}
