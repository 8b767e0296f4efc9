//! End-to-end HTTP tests over the full router.

use crate::{build_router, test_utils::create_test_app_state};
use axum::http::header::SET_COOKIE;
use axum_test::{TestResponse, TestServer};
use serde_json::{Value, json};
use sqlx::SqlitePool;

async fn make_server(pool: SqlitePool) -> TestServer {
    let state = create_test_app_state(pool).await;
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// The `name=value` pairs of every cookie a response sets.
fn set_cookie_pairs(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect()
}

fn cookie_named(response: &TestResponse, name: &str) -> Option<String> {
    set_cookie_pairs(response)
        .into_iter()
        .find(|pair| pair.starts_with(&format!("{name}=")))
}

/// Everything a client needs to make authenticated, csrf-protected calls.
struct Client {
    session_cookie: Option<String>,
    csrf_cookie: String,
    csrf_token: String,
}

impl Client {
    async fn anonymous(server: &TestServer) -> Self {
        let response = server.get("/authentication/csrf").await;
        assert_eq!(response.status_code().as_u16(), 200);
        let csrf_cookie = cookie_named(&response, "corkboard_csrf").expect("csrf cookie");
        let csrf_token = response.json::<Value>()["token"].as_str().unwrap().to_string();
        Self {
            session_cookie: None,
            csrf_cookie,
            csrf_token,
        }
    }

    async fn signed_up(server: &TestServer, email: &str) -> Self {
        let mut client = Self::anonymous(server).await;
        let response = server
            .post("/authentication/sign-up")
            .add_header("cookie", client.cookie_header())
            .add_header("x-csrf-token", &client.csrf_token)
            .json(&json!({"email": email, "password": "hunter2hunter2"}))
            .await;
        assert_eq!(response.status_code().as_u16(), 201, "{}", response.text());
        client.session_cookie = Some(cookie_named(&response, "corkboard_session").expect("session cookie"));
        client
    }

    fn cookie_header(&self) -> String {
        match &self.session_cookie {
            Some(session) => format!("{session}; {}", self.csrf_cookie),
            None => self.csrf_cookie.clone(),
        }
    }

    async fn get(&self, server: &TestServer, path: &str) -> TestResponse {
        server.get(path).add_header("cookie", self.cookie_header()).await
    }

    async fn post(&self, server: &TestServer, path: &str, body: &Value) -> TestResponse {
        server
            .post(path)
            .add_header("cookie", self.cookie_header())
            .add_header("x-csrf-token", &self.csrf_token)
            .json(body)
            .await
    }

    async fn patch(&self, server: &TestServer, path: &str, body: &Value) -> TestResponse {
        server
            .patch(path)
            .add_header("cookie", self.cookie_header())
            .add_header("x-csrf-token", &self.csrf_token)
            .json(body)
            .await
    }

    async fn delete(&self, server: &TestServer, path: &str) -> TestResponse {
        server
            .delete(path)
            .add_header("cookie", self.cookie_header())
            .add_header("x-csrf-token", &self.csrf_token)
            .await
    }

    /// Create an organization and return its id.
    async fn create_org(&self, server: &TestServer, name: &str) -> String {
        let response = self.post(server, "/organizations", &json!({"name": name})).await;
        assert_eq!(response.status_code().as_u16(), 201, "{}", response.text());
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }
}

#[sqlx::test]
#[test_log::test]
async fn test_healthz(pool: SqlitePool) {
    let server = make_server(pool).await;
    let response = server.get("/healthz").await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.text(), "OK");
}

#[sqlx::test]
#[test_log::test]
async fn test_sign_up_and_me(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    let response = client.get(&server, "/authentication/me").await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["email"], "alice@example.com");

    // Without the cookie there is no user.
    let response = server.get("/authentication/me").await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[sqlx::test]
#[test_log::test]
async fn test_duplicate_sign_up_conflict(pool: SqlitePool) {
    let server = make_server(pool).await;
    Client::signed_up(&server, "alice@example.com").await;

    let client = Client::anonymous(&server).await;
    let response = client
        .post(
            &server,
            "/authentication/sign-up",
            &json!({"email": "alice@example.com", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[sqlx::test]
#[test_log::test]
async fn test_sign_up_validation_errors(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::anonymous(&server).await;

    let response = client
        .post(
            &server,
            "/authentication/sign-up",
            &json!({"email": "not-an-email", "password": "short"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    let body = response.json::<Value>();
    let fields: Vec<&str> = body["errors"].as_array().unwrap().iter().map(|e| e["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[sqlx::test]
#[test_log::test]
async fn test_sign_in_failures_are_indistinguishable(pool: SqlitePool) {
    let server = make_server(pool).await;
    Client::signed_up(&server, "alice@example.com").await;

    let client = Client::anonymous(&server).await;
    let wrong_password = client
        .post(
            &server,
            "/authentication/sign-in",
            &json!({"email": "alice@example.com", "password": "not-the-password"}),
        )
        .await;
    let unknown_email = client
        .post(
            &server,
            "/authentication/sign-in",
            &json!({"email": "nobody@example.com", "password": "whatever-it-is"}),
        )
        .await;

    assert_eq!(wrong_password.status_code().as_u16(), 401);
    assert_eq!(unknown_email.status_code().as_u16(), 401);
    assert_eq!(wrong_password.text(), unknown_email.text());
}

#[sqlx::test]
#[test_log::test]
async fn test_sign_in_starts_fresh_session(pool: SqlitePool) {
    let server = make_server(pool).await;
    Client::signed_up(&server, "alice@example.com").await;

    let mut client = Client::anonymous(&server).await;
    let response = client
        .post(
            &server,
            "/authentication/sign-in",
            &json!({"email": "alice@example.com", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    client.session_cookie = Some(cookie_named(&response, "corkboard_session").expect("session cookie"));

    let response = client.get(&server, "/authentication/me").await;
    assert_eq!(response.json::<Value>()["email"], "alice@example.com");
}

#[sqlx::test]
#[test_log::test]
async fn test_mutation_without_csrf_rejected(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    // Session cookie alone, no anti-forgery pair: rejected before the
    // handler runs, so nothing is created.
    let response = server
        .post("/organizations")
        .add_header("cookie", client.session_cookie.clone().unwrap())
        .json(&json!({"name": "Acme"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 403);

    let listed = client.get(&server, "/organizations").await;
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_mismatched_csrf_rejected(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    // A second, independently issued token does not pair with the first
    // client's cookie.
    let other = Client::anonymous(&server).await;
    let response = server
        .post("/organizations")
        .add_header("cookie", client.cookie_header())
        .add_header("x-csrf-token", &other.csrf_token)
        .json(&json!({"name": "Acme"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 403);
}

#[sqlx::test]
#[test_log::test]
async fn test_organization_roles_gate_settings(pool: SqlitePool) {
    let server = make_server(pool).await;
    let admin = Client::signed_up(&server, "admin@example.com").await;
    let member = Client::signed_up(&server, "member@example.com").await;
    let outsider = Client::signed_up(&server, "outsider@example.com").await;

    let org_id = admin.create_org(&server, "Acme Corp").await;

    let listed = admin.get(&server, "/organizations").await.json::<Value>();
    assert_eq!(listed[0]["role"], "ADMIN");
    assert_eq!(listed[0]["slug"], "acme-corp");

    // Bring in a plain member.
    let response = admin
        .post(
            &server,
            &format!("/organizations/{org_id}/members"),
            &json!({"email": "member@example.com", "role": "MEMBER"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 201);

    let listed = member.get(&server, "/organizations").await.json::<Value>();
    assert_eq!(listed[0]["role"], "MEMBER");

    // Members can read but not touch settings.
    let response = member.get(&server, &format!("/organizations/{org_id}")).await;
    assert_eq!(response.status_code().as_u16(), 200);
    let response = member
        .patch(&server, &format!("/organizations/{org_id}"), &json!({"name": "Evil Corp"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 403);

    let response = admin
        .patch(&server, &format!("/organizations/{org_id}"), &json!({"name": "Acme Ltd"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["name"], "Acme Ltd");

    // Outsiders see nothing at all.
    let response = outsider.get(&server, &format!("/organizations/{org_id}")).await;
    assert_eq!(response.status_code().as_u16(), 403);

    // Adding the same member again conflicts.
    let response = admin
        .post(
            &server,
            &format!("/organizations/{org_id}/members"),
            &json!({"email": "member@example.com", "role": "MEMBER"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[sqlx::test]
#[test_log::test]
async fn test_duplicate_slug_conflict(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    client.create_org(&server, "Acme").await;
    let response = client.post(&server, "/organizations", &json!({"name": "Acme"})).await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[sqlx::test]
#[test_log::test]
async fn test_board_list_card_flow(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;
    let outsider = Client::signed_up(&server, "outsider@example.com").await;

    let org_id = client.create_org(&server, "Acme").await;

    let board = client
        .post(&server, &format!("/organizations/{org_id}/boards"), &json!({"name": "Launch"}))
        .await;
    assert_eq!(board.status_code().as_u16(), 201);
    let board_id = board.json::<Value>()["id"].as_str().unwrap().to_string();

    let todo = client
        .post(&server, &format!("/boards/{board_id}/lists"), &json!({"name": "Todo", "position": 0}))
        .await
        .json::<Value>();
    let doing = client
        .post(&server, &format!("/boards/{board_id}/lists"), &json!({"name": "Doing", "position": 1}))
        .await
        .json::<Value>();
    let todo_id = todo["id"].as_str().unwrap();
    let doing_id = doing["id"].as_str().unwrap();

    let card = client
        .post(
            &server,
            &format!("/lists/{todo_id}/cards"),
            &json!({"name": "Ship it", "position": 0, "description": "Before Friday"}),
        )
        .await;
    assert_eq!(card.status_code().as_u16(), 201);
    let card_id = card.json::<Value>()["id"].as_str().unwrap().to_string();

    // Move the card to the other list.
    let moved = client
        .patch(&server, &format!("/cards/{card_id}"), &json!({"list_id": doing_id, "position": 3}))
        .await;
    assert_eq!(moved.status_code().as_u16(), 200);
    assert_eq!(moved.json::<Value>()["list_id"], *doing_id);

    let cards = client.get(&server, &format!("/lists/{doing_id}/cards")).await.json::<Value>();
    assert_eq!(cards.as_array().unwrap().len(), 1);

    // Non-members cannot reach any of it.
    let response = outsider.get(&server, &format!("/boards/{board_id}")).await;
    assert_eq!(response.status_code().as_u16(), 403);
    let response = outsider
        .patch(&server, &format!("/cards/{card_id}"), &json!({"name": "Hijack"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 403);
}

#[sqlx::test]
#[test_log::test]
async fn test_sign_out_invalidates_session(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    let response = client.post(&server, "/authentication/sign-out", &json!({})).await;
    assert_eq!(response.status_code().as_u16(), 200);
    let cleared = cookie_named(&response, "corkboard_session").unwrap();
    assert_eq!(cleared, "corkboard_session=");

    // The server-side record is gone; the old cookie no longer works.
    let response = client.get(&server, "/authentication/me").await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[sqlx::test]
#[test_log::test]
async fn test_account_update_and_delete(pool: SqlitePool) {
    let server = make_server(pool).await;
    let client = Client::signed_up(&server, "alice@example.com").await;

    let response = client
        .patch(&server, "/account", &json!({"display_name": "Alice"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["display_name"], "Alice");

    let response = client.delete(&server, "/account").await;
    assert_eq!(response.status_code().as_u16(), 200);

    // Sessions die with the account.
    let response = client.get(&server, "/authentication/me").await;
    assert_eq!(response.status_code().as_u16(), 401);

    // And the credential is gone too.
    let fresh = Client::anonymous(&server).await;
    let response = fresh
        .post(
            &server,
            "/authentication/sign-in",
            &json!({"email": "alice@example.com", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(response.status_code().as_u16(), 401);
}
