use http::Method;
use serde_json::json;

use crate::tests::utils::{body_json, get, login_session, send, set_cookies, test_app, TEST_PASSWORD};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[test]
fn login_rejects_a_wrong_password() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/login",
        &[],
        Some(json!({ "email": "admin@gulf.bh", "password": "not-the-password" })),
    );
    assert_eq!(resp.status(), 401);

    let body = body_json(resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[test]
fn login_rejects_an_unknown_email_the_same_way() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/login",
        &[],
        Some(json!({ "email": "nobody@gulf.bh", "password": TEST_PASSWORD })),
    );
    assert_eq!(resp.status(), 401);
    assert_eq!(body_json(resp)["message"], "Invalid credentials");
}

#[test]
fn login_stages_an_otp_and_sets_the_staging_cookie() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/login",
        &[],
        // mixed case to exercise normalization
        Some(json!({ "email": " Admin@Gulf.BH ", "password": TEST_PASSWORD })),
    );
    assert_eq!(resp.status(), 200);

    let cookies = set_cookies(&resp);
    assert_eq!(cookies.get("otp_user").map(String::as_str), Some("1"));

    let body = body_json(resp);
    assert_eq!(body["success"], true);
}

#[test]
fn staged_otp_opens_a_session_usable_on_user_me() {
    let app = test_app();

    let issued = app
        .db
        .with_conn(|conn| app.otp.stage_login_otp(conn, 1, "admin@gulf.bh", now()))
        .unwrap();

    let resp = send(
        &app,
        Method::POST,
        "/auth/verify-otp",
        &[("otp_user", "1")],
        Some(json!({ "otp": issued.otp })),
    );
    assert_eq!(resp.status(), 200);

    let cookies = set_cookies(&resp);
    let token = cookies.get("token").expect("token cookie missing");
    // the staging cookie is cleared alongside
    assert_eq!(cookies.get("otp_user").map(String::as_str), Some(""));

    let me = send(&app, Method::GET, "/user/me", &[("token", token)], None);
    assert_eq!(me.status(), 200);

    let body = body_json(me);
    assert_eq!(body["user"]["email"], "admin@gulf.bh");
    assert_eq!(body["user"]["firm_name"], "Gulf Estates");
}

#[test]
fn verify_otp_without_the_staging_cookie_is_a_400() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/verify-otp",
        &[],
        Some(json!({ "otp": "123456" })),
    );
    assert_eq!(resp.status(), 400);
}

#[test]
fn a_wrong_otp_does_not_open_a_session() {
    let app = test_app();

    let issued = app
        .db
        .with_conn(|conn| app.otp.stage_login_otp(conn, 1, "admin@gulf.bh", now()))
        .unwrap();
    let wrong = if issued.otp == "000000" { "000001" } else { "000000" };

    let resp = send(
        &app,
        Method::POST,
        "/auth/verify-otp",
        &[("otp_user", "1")],
        Some(json!({ "otp": wrong })),
    );
    assert_eq!(resp.status(), 400);
    assert!(set_cookies(&resp).get("token").is_none());
}

#[test]
fn logout_revokes_the_session() {
    let app = test_app();
    let token = login_session(&app, 1);

    let resp = send(&app, Method::POST, "/auth/logout", &[("token", &token)], None);
    assert_eq!(resp.status(), 200);

    let me = send(&app, Method::GET, "/user/me", &[("token", &token)], None);
    assert_eq!(me.status(), 401);
}

#[test]
fn expired_session_is_rejected() {
    let app = test_app();
    let token = login_session(&app, 1);

    // session is live first
    let me = send(&app, Method::GET, "/user/me", &[("token", &token)], None);
    assert_eq!(me.status(), 200);

    // push the expiry into the past
    app.db
        .with_conn(|conn| {
            conn.execute("update sessions set expires_at = 100", [])
                .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))
        })
        .unwrap();

    let me = send(&app, Method::GET, "/user/me", &[("token", &token)], None);
    assert_eq!(me.status(), 401);
}

#[test]
fn user_me_without_a_session_is_a_401() {
    let app = test_app();

    let resp = get(&app, "/user/me");
    assert_eq!(resp.status(), 401);
    assert_eq!(
        body_json(resp)["message"],
        "Not logged in or missing user context."
    );
}

#[test]
fn register_endpoint_stages_a_registration_and_sets_reg_id() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/register",
        &[],
        Some(json!({
            "first_name": "Huda",
            "last_name": "Ali",
            "email": "huda@manama.bh",
            "password": "pw-123456",
            "login_code": "MNM-2"
        })),
    );
    assert_eq!(resp.status(), 200);
    assert!(set_cookies(&resp).contains_key("reg_id"));
}

#[test]
fn register_rejects_an_already_registered_email() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/register",
        &[],
        Some(json!({
            "first_name": "Dup",
            "last_name": "Licate",
            "email": "admin@gulf.bh",
            "password": "pw-123456",
            "login_code": "GULF-1"
        })),
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(
        body_json(resp)["message"],
        "Email already verified; please log in."
    );
}

#[test]
fn register_rejects_an_unknown_login_code() {
    let app = test_app();

    let resp = send(
        &app,
        Method::POST,
        "/auth/register",
        &[],
        Some(json!({
            "first_name": "No",
            "last_name": "Firm",
            "email": "no@firm.bh",
            "password": "pw-123456",
            "login_code": "WRONG-9"
        })),
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["message"], "Invalid registration code.");
}

#[test]
fn verify_register_otp_creates_the_user_and_logs_them_in() {
    let app = test_app();

    let issued = app
        .db
        .with_conn(|conn| {
            app.otp.request_registration(
                conn,
                &crate::auth::otp::RegistrationRequest {
                    first_name: "Huda",
                    last_name: "Ali",
                    email: "huda@manama.bh",
                    password: "pw-123456",
                    login_code: "MNM-2",
                },
                now(),
            )
        })
        .unwrap();

    let resp = send(
        &app,
        Method::POST,
        "/auth/verify-register-otp",
        &[("reg_id", &issued.reg_id.to_string())],
        Some(json!({ "otp": issued.otp })),
    );
    assert_eq!(resp.status(), 200);

    let cookies = set_cookies(&resp);
    let token = cookies.get("token").expect("token cookie missing");

    let me = body_json(send(&app, Method::GET, "/user/me", &[("token", token)], None));
    assert_eq!(me["user"]["email"], "huda@manama.bh");
    assert_eq!(me["user"]["firm_name"], "Manama Realty");
}

#[test]
fn resend_without_a_staged_flow_is_a_400() {
    let app = test_app();

    let resp = send(&app, Method::POST, "/auth/resend-otp", &[], None);
    assert_eq!(resp.status(), 400);
}

#[test]
fn resend_reissues_a_login_otp_for_the_staged_user() {
    let app = test_app();

    app.db
        .with_conn(|conn| app.otp.stage_login_otp(conn, 2, "agent@gulf.bh", now()))
        .unwrap();

    let resp = send(&app, Method::POST, "/auth/resend-otp", &[("otp_user", "2")], None);
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["message"], "OTP resent.");
}
