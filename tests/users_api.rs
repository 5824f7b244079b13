//! End-to-end account flows against a live server.

mod common;

use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};
use users_sdk::{SdkError, UpdateRequest};

use common::{registration, signed_in, spawn_server, test_config, PASSWORD};

fn api_status(err: &SdkError) -> StatusCode {
    err.status().expect("service should have answered")
}

#[tokio::test]
async fn health_reports_environment_and_version() {
    let server = spawn_server(test_config()).await;
    let health = server.client().health().await.unwrap();

    assert_eq!(health["status"], "available");
    assert_eq!(health["system_info"]["environment"], "development");
    assert_eq!(health["system_info"]["version"], env!("CARGO_PKG_VERSION"));
    server.stop().await;
}

#[tokio::test]
async fn registration_returns_created_user_without_hash() {
    let server = spawn_server(test_config()).await;
    let client = server.client();

    let res = client
        .request(Method::POST, "/service/users")
        .json(&registration("jon@doe.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await.unwrap();
    let user = &body["user"];
    assert_eq!(user["email"], "jon@doe.com");
    assert_eq!(user["version"], 1);
    assert_eq!(user["activated"], true);
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn client_cannot_choose_server_fields() {
    let server = spawn_server(test_config()).await;
    let res = server
        .client()
        .request(Method::POST, "/service/users")
        .json(&json!({
            "email": "jon@doe.com",
            "password": PASSWORD,
            "first_name": "Jon",
            "last_name": "Doe",
            "version": 7,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    client.register(&registration("jon@doe.com")).await.unwrap();

    let err = client.register(&registration("jon@doe.com")).await.unwrap_err();
    assert_eq!(api_status(&err), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        err.error_body().unwrap()["email"],
        "a user with this email address already exists"
    );
}

#[tokio::test]
async fn racing_registrations_have_one_winner() {
    let server = spawn_server(test_config()).await;
    let client = server.client();

    let req = registration("race@doe.com");
    let (a, b) = tokio::join!(client.register(&req), client.register(&req));

    let failures: Vec<_> = [a, b].into_iter().filter_map(Result::err).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(api_status(&failures[0]), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(failures[0].error_body().unwrap().get("email").is_some());
}

#[tokio::test]
async fn invalid_registration_reports_each_field() {
    let server = spawn_server(test_config()).await;
    let err = server
        .client()
        .register(&users_sdk::RegisterRequest {
            email: "nope".into(),
            password: "short".into(),
            first_name: "".into(),
            last_name: "Doe".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(api_status(&err), StatusCode::UNPROCESSABLE_ENTITY);
    let fields = err.error_body().unwrap();
    assert_eq!(fields["email"], "must be a valid email address");
    assert_eq!(fields["password"], "must be at least 8 bytes long");
    assert_eq!(fields["first_name"], "must be provided");
    assert!(fields.get("last_name").is_none());
}

#[tokio::test]
async fn login_then_fetch_own_profile() {
    let server = spawn_server(test_config()).await;
    let (user, authed) = signed_in(&server.client(), "jon@doe.com").await;

    let me = authed.me().await.unwrap();
    assert_eq!(me, user);
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    client.register(&registration("jon@doe.com")).await.unwrap();

    let wrong = client.login("jon@doe.com", "wrong-password").await.unwrap_err();
    let unknown = client.login("ghost@doe.com", PASSWORD).await.unwrap_err();
    assert_eq!(api_status(&wrong), StatusCode::UNAUTHORIZED);
    assert_eq!(api_status(&unknown), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error_body(), unknown.error_body());

    let malformed = client.login("not-an-email", PASSWORD).await.unwrap_err();
    assert_eq!(api_status(&malformed), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn me_rejects_missing_and_bad_credentials() {
    let server = spawn_server(test_config()).await;
    let client = server.client();

    let res = client.request(Method::GET, "/service/users/me").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");

    for (raw, message) in [
        ("Bearer", "invalid authentication header"),
        ("Token abc", "invalid authentication header"),
        ("Bearer not-a-token", "invalid or expired token"),
    ] {
        let res = client
            .request(Method::GET, "/service/users/me")
            .header(header::AUTHORIZATION, raw)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{raw}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], message, "{raw}");
    }
}

#[tokio::test]
async fn owner_can_patch_selected_fields() {
    let server = spawn_server(test_config()).await;
    let (user, authed) = signed_in(&server.client(), "jon@doe.com").await;

    let updated = authed
        .update(
            &user.id,
            &UpdateRequest {
                first_name: Some("Nina".into()),
                ..UpdateRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Nina");
    assert_eq!(updated.last_name, user.last_name);
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.version, user.version + 1);
    assert_eq!(authed.me().await.unwrap(), updated);
}

#[tokio::test]
async fn password_change_takes_effect() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    let (user, authed) = signed_in(&client, "jon@doe.com").await;

    authed
        .update(
            &user.id,
            &UpdateRequest {
                password: Some("n3w-passw0rd".into()),
                ..UpdateRequest::default()
            },
        )
        .await
        .unwrap();

    assert!(client.login("jon@doe.com", PASSWORD).await.is_err());
    assert!(client.login("jon@doe.com", "n3w-passw0rd").await.is_ok());
}

#[tokio::test]
async fn patching_someone_else_is_forbidden_whatever_the_body() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    let (jon, _) = signed_in(&client, "jon@doe.com").await;
    let (_, nina) = signed_in(&client, "nina@doe.com").await;

    for body in [json!({"first_name": "Mallory"}), json!({"email": 12}), json!({"bogus": true})] {
        let res = nina
            .request(Method::PATCH, &format!("/service/users/{}", jon.id))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{body}");
    }

    let res = nina
        .request(Method::PATCH, &format!("/service/users/{}", jon.id))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patch_error_statuses() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    let (user, authed) = signed_in(&client, "jon@doe.com").await;
    client.register(&registration("taken@doe.com")).await.unwrap();

    let patch = |path: String, body: &'static str| {
        authed
            .request(Method::PATCH, &path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
    };
    let own = format!("/service/users/{}", user.id);

    let cases = [
        (format!("/service/users/{}", "00000000-0000-0000-0000-000000000000"), r#"{"first_name":"X"}"#, StatusCode::NOT_FOUND),
        ("/service/users/not-a-uuid".to_string(), r#"{"first_name":"X"}"#, StatusCode::NOT_FOUND),
        (own.clone(), r#"{"first_name": "#, StatusCode::BAD_REQUEST),
        (own.clone(), r#"{"version": 9}"#, StatusCode::BAD_REQUEST),
        (own.clone(), r#"{"email": "broken"}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (own.clone(), r#"{"email": "taken@doe.com"}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (own.clone(), r#"{"last_name": ""}"#, StatusCode::UNPROCESSABLE_ENTITY),
    ];

    for (path, body, expected) in cases {
        let res = patch(path.clone(), body).await.unwrap();
        assert_eq!(res.status(), expected, "{path} {body}");
    }

    // Nothing above was written.
    assert_eq!(authed.me().await.unwrap().version, 1);

    let anonymous = client
        .request(Method::PATCH, &own)
        .json(&json!({"first_name": "X"}))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn debug_vars_counts_requests() {
    let server = spawn_server(test_config()).await;
    let client = server.client();
    client.health().await.unwrap();
    let _ = client.request(Method::GET, "/missing").send().await.unwrap();

    let vars = client.vars().await.unwrap();
    assert_eq!(vars["version"], env!("CARGO_PKG_VERSION"));
    assert!(vars["tasks"].as_u64().is_some());
    assert!(vars["database"].is_null());
    assert!(vars["requests"]["total_requests_received"].as_u64().unwrap() >= 3);
    assert!(vars["requests"]["total_responses_sent_by_status"]["404"].as_u64().unwrap() >= 1);
}
