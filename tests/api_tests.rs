// tests/api_tests.rs

use std::sync::Arc;

use challenge_league::{
    config::Config, repositories::Repositories, routes, services::ChallengeCatalog,
    state::AppState, utils::time::SystemClock,
};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. In-memory stores, fresh for every test
    let repos = Repositories::in_memory();

    // 2. Create test configuration and state
    let state = AppState::new(
        Config::test_config(),
        repos,
        ChallengeCatalog::builtin(),
        Arc::new(SystemClock),
    );

    // 3. Create the router with the app state
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn admin_token(client: &reqwest::Client, address: &str) -> String {
    let resp: Value = client
        .post(format!("{}/api/admin/login", address))
        .json(&json!({ "password": "admin-pass" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

/// Creates a student through the admin API and returns its id.
async fn create_student(client: &reqwest::Client, address: &str, token: &str) -> String {
    let nickname = format!("s_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let resp = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(token)
        .json(&json!({ "nickname": nickname, "pin": "1234" }))
        .send()
        .await
        .expect("Create student failed");
    assert_eq!(resp.status().as_u16(), 201);

    let student: Value = resp.json().await.unwrap();
    student["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn active_challenge_requires_user_id() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/challenges/active", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "userId is required");
}

#[tokio::test]
async fn assign_get_and_clear_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    // No challenge yet
    let body: Value = client
        .get(format!("{}/api/challenges/active?userId={}", address, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["activeChallenge"].is_null());

    // Supplied template
    let assigned: Value = client
        .post(format!("{}/api/challenges/active", address))
        .json(&json!({
            "userId": user_id,
            "type": "math",
            "question": "¿Cuánto es 12 + 8?",
            "options": ["18", "20", "22", "24"],
            "correctAnswer": 1
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(assigned["success"], true);
    assert_eq!(assigned["activeChallenge"]["elapsedSeconds"], 0);

    // Catalog draw supersedes it
    let redrawn: Value = client
        .post(format!("{}/api/challenges/active", address))
        .json(&json!({ "userId": user_id, "type": "reading" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(redrawn["activeChallenge"]["type"], "reading");

    let current: Value = client
        .get(format!("{}/api/challenges/active?userId={}", address, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["activeChallenge"]["id"], redrawn["activeChallenge"]["id"]);

    // Clearing twice is fine
    for _ in 0..2 {
        let resp = client
            .delete(format!("{}/api/challenges/active?userId={}", address, user_id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let after: Value = client
        .get(format!("{}/api/challenges/active?userId={}", address, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(after["activeChallenge"].is_null());
}

#[tokio::test]
async fn assign_rejects_partial_template() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    let response = client
        .post(format!("{}/api/challenges/active", address))
        .json(&json!({ "userId": user_id, "type": "math", "question": "2 + 2?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn assign_unknown_user_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/challenges/active", address))
        .json(&json!({ "userId": uuid::Uuid::new_v4() }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn completion_scores_and_feeds_leaderboard() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let first = create_student(&client, &address, &token).await;
    let second = create_student(&client, &address, &token).await;

    for (user, correct) in [(&first, true), (&first, true), (&second, true), (&second, false)] {
        let resp = client
            .post(format!("{}/api/challenges/complete", address))
            .json(&json!({
                "userId": user,
                "type": "math",
                "question": "7 x 3?",
                "timeInSeconds": 12,
                "isCorrect": correct
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let record: Value = resp.json().await.unwrap();
        assert_eq!(record["points"], if correct { 10 } else { 0 });
        assert_eq!(record["timeInSeconds"], 12);
    }

    let history: Value = client
        .get(format!("{}/api/challenges/complete?userId={}", address, second))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["challenges"].as_array().unwrap().len(), 2);

    let board: Value = client
        .get(format!("{}/api/leaderboard", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board["period"], "week");
    assert!(board["weekStart"].is_string());
    let rows = board["leaderboard"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["userId"], first.as_str());
    assert_eq!(rows[0]["totalPoints"], 20);
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[1]["accuracy"], 50.0);
    assert_eq!(rows[1]["challengesByType"]["math"], 2);
}

#[tokio::test]
async fn completion_rejects_negative_time() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    let response = client
        .post(format!("{}/api/challenges/complete", address))
        .json(&json!({
            "userId": user_id,
            "type": "reading",
            "question": "Who?",
            "timeInSeconds": -3,
            "isCorrect": true
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn malformed_bodies_get_json_bad_request() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    let unknown_type = client
        .post(format!("{}/api/challenges/complete", address))
        .json(&json!({
            "userId": user_id,
            "type": "science",
            "question": "Who?",
            "timeInSeconds": 3,
            "isCorrect": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_type.status().as_u16(), 400);
    let body: Value = unknown_type.json().await.unwrap();
    assert!(body["error"].is_string());

    let non_integer_time = client
        .post(format!("{}/api/challenges/complete", address))
        .json(&json!({
            "userId": user_id,
            "type": "math",
            "question": "Who?",
            "timeInSeconds": "soon",
            "isCorrect": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(non_integer_time.status().as_u16(), 400);

    let unknown_age_group = client
        .post(format!("{}/api/challenges/active", address))
        .json(&json!({ "userId": user_id, "ageGroup": "A99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_age_group.status().as_u16(), 400);
    let body: Value = unknown_age_group.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn leaderboard_rejects_unknown_period() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/leaderboard?period=decade", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/admin/reset-points", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/admin/login", address))
        .json(&json!({ "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn duplicate_nickname_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    let payload = json!({ "nickname": "luna", "pin": "4321" });
    let first = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let bad_pin = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(&token)
        .json(&json!({ "nickname": "sol", "pin": "12a4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_pin.status().as_u16(), 400);
}

#[tokio::test]
async fn blank_nickname_is_rejected_and_nicknames_are_trimmed() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    let blank = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(&token)
        .json(&json!({ "nickname": "   ", "pin": "1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status().as_u16(), 400);
    let body: Value = blank.json().await.unwrap();
    assert!(body["error"].is_string());

    let padded = client
        .post(format!("{}/api/admin/students", address))
        .bearer_auth(&token)
        .json(&json!({ "nickname": "  mar  ", "pin": "1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(padded.status().as_u16(), 201);
    let student: Value = padded.json().await.unwrap();
    assert_eq!(student["nickname"], "mar");
}

#[tokio::test]
async fn hidden_student_leaves_leaderboard() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    let resp = client
        .patch(format!("{}/api/admin/users/{}/visibility", address, user_id))
        .bearer_auth(&token)
        .json(&json!({ "hidden": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["hidden"], true);
    assert!(user.get("pin").is_none());

    let board: Value = client
        .get(format!("{}/api/leaderboard?period=all", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(board["leaderboard"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reset_points_and_delete_student() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;
    let user_id = create_student(&client, &address, &token).await;

    for _ in 0..3 {
        client
            .post(format!("{}/api/challenges/complete", address))
            .json(&json!({
                "userId": user_id,
                "type": "math",
                "question": "q",
                "timeInSeconds": 1,
                "isCorrect": true
            }))
            .send()
            .await
            .unwrap();
    }

    let reset: Value = client
        .post(format!("{}/api/admin/reset-points", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset["success"], true);
    assert_eq!(reset["deletedCount"], 3);

    let board: Value = client
        .get(format!("{}/api/leaderboard?period=all", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board["leaderboard"][0]["totalPoints"], 0);

    let deleted = client
        .delete(format!("{}/api/admin/students/{}", address, user_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let again = client
        .delete(format!("{}/api/admin/students/{}", address, user_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}
