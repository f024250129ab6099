use astra::{Body, ResponseBuilder};
use serde_json::Value;

use crate::responses::ResultResp;

pub fn json_response(status: u16, body: &Value) -> ResultResp {
    json_response_with_cookies(status, body, &[])
}

/// JSON response that also sets cookies. Each entry is a complete
/// `Set-Cookie` value, e.g. "token=abc; HttpOnly; Max-Age=86400; Path=/".
pub fn json_response_with_cookies(status: u16, body: &Value, cookies: &[String]) -> ResultResp {
    let mut builder = ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8");

    for cookie in cookies {
        builder = builder.header("Set-Cookie", cookie.as_str());
    }

    let resp = builder
        .body(Body::from(body.to_string()))
        .map_err(|_| crate::errors::ServerError::InternalError)?;

    Ok(resp)
}

/// Cookie helpers shared by the auth routes.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, http_only: bool) -> String {
    let flags = if http_only { "; HttpOnly" } else { "" };
    format!("{name}={value}; Max-Age={max_age_secs}; Path=/; SameSite=Lax{flags}")
}

pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Max-Age=0; Path=/; SameSite=Lax")
}
