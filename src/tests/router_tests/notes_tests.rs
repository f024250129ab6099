use http::Method;
use serde_json::json;

use crate::tests::utils::{body_json, get, login_session, send, test_app};

#[test]
fn notes_require_a_session() {
    let app = test_app();

    assert_eq!(get(&app, "/property-notes").status(), 401);

    let resp = send(
        &app,
        Method::POST,
        "/property-notes",
        &[],
        Some(json!({ "note_text": "hello" })),
    );
    assert_eq!(resp.status(), 401);
}

#[test]
fn created_note_comes_back_with_its_author() {
    let app = test_app();
    let token = login_session(&app, 2);

    let resp = send(
        &app,
        Method::POST,
        "/property-notes",
        &[("token", &token)],
        Some(json!({ "parcel_no": "03020551", "note_text": "Owner open to offers" })),
    );
    assert_eq!(resp.status(), 201);

    let body = body_json(resp);
    assert_eq!(body["message"], "Note created successfully.");
    assert_eq!(body["note"]["note_text"], "Owner open to offers");
    assert_eq!(body["note"]["first_name"], "Staff");
    assert_eq!(body["note"]["last_name"], "Agent");

    let listed = body_json(send(
        &app,
        Method::GET,
        "/property-notes?parcel_no=03020551",
        &[("token", &token)],
        None,
    ));
    let notes = listed["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["note_text"], "Owner open to offers");
}

#[test]
fn empty_note_text_is_rejected() {
    let app = test_app();
    let token = login_session(&app, 2);

    let resp = send(
        &app,
        Method::POST,
        "/property-notes",
        &[("token", &token)],
        Some(json!({ "parcel_no": "03020551", "note_text": "" })),
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["message"], "note_text is required.");
}

#[test]
fn parcel_filter_narrows_the_listing() {
    let app = test_app();
    let token = login_session(&app, 1);

    for (parcel, text) in [("03020551", "first"), ("04010001", "second")] {
        let resp = send(
            &app,
            Method::POST,
            "/property-notes",
            &[("token", &token)],
            Some(json!({ "parcel_no": parcel, "note_text": text })),
        );
        assert_eq!(resp.status(), 201);
    }

    let all = body_json(send(&app, Method::GET, "/property-notes", &[("token", &token)], None));
    assert_eq!(all["notes"].as_array().unwrap().len(), 2);

    let narrowed = body_json(send(
        &app,
        Method::GET,
        "/property-notes?parcel_no=04010001",
        &[("token", &token)],
        None,
    ));
    let notes = narrowed["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["note_text"], "second");
}

#[test]
fn notes_never_cross_firm_boundaries() {
    let app = test_app();

    // a Manama Realty agent alongside the seeded Gulf Estates users
    app.db
        .with_conn(|conn| {
            conn.execute(
                r#"insert into users (user_id, first_name, last_name, email, password, role, firm_id, firm_name, created_at)
                   values (3, 'Manama', 'Agent', 'agent@manama.bh', 'x', 'staff', 2, 'Manama Realty', 0)"#,
                [],
            )
            .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))
        })
        .unwrap();

    let gulf = login_session(&app, 2);
    let manama = login_session(&app, 3);

    let resp = send(
        &app,
        Method::POST,
        "/property-notes",
        &[("token", &gulf)],
        Some(json!({ "parcel_no": "03020551", "note_text": "internal to Gulf" })),
    );
    assert_eq!(resp.status(), 201);

    let other = body_json(send(&app, Method::GET, "/property-notes", &[("token", &manama)], None));
    assert!(other["notes"].as_array().unwrap().is_empty());
}

#[test]
fn only_admins_delete_notes() {
    let app = test_app();
    let staff = login_session(&app, 2);
    let admin = login_session(&app, 1);

    let created = body_json(send(
        &app,
        Method::POST,
        "/property-notes",
        &[("token", &staff)],
        Some(json!({ "parcel_no": "03020551", "note_text": "to be removed" })),
    ));
    let note_id = created["note"]["note_id"].as_str().unwrap().to_string();

    let denied = send(
        &app,
        Method::DELETE,
        &format!("/property-notes/{note_id}"),
        &[("token", &staff)],
        None,
    );
    assert_eq!(denied.status(), 403);

    let deleted = send(
        &app,
        Method::DELETE,
        &format!("/property-notes/{note_id}"),
        &[("token", &admin)],
        None,
    );
    assert_eq!(deleted.status(), 200);

    // gone now
    let again = send(
        &app,
        Method::DELETE,
        &format!("/property-notes/{note_id}"),
        &[("token", &admin)],
        None,
    );
    assert_eq!(again.status(), 404);
}
