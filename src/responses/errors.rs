use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into the JSON error shape the clients expect:
/// `{ "success": false, "message": "..." }`.
pub fn error_to_response(err: ServerError) -> Response {
    match err {
        ServerError::NotFound => json_error_response(404, "Not found"),
        ServerError::BadRequest(msg) => json_error_response(400, &msg),
        ServerError::Unauthorized(msg) => json_error_response(401, &msg),
        ServerError::Forbidden(msg) => json_error_response(403, &msg),
        ServerError::DbError(msg) => {
            log::error!("db error: {msg}");
            json_error_response(500, "Server error")
        }
        ServerError::InternalError => json_error_response(500, "Server error"),
    }
}

pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = json!({ "success": false, "message": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .unwrap()
}
