mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{json_request, login, send, TestApp, ADMIN_PASSWORD, ADMIN_USERNAME};

async fn register_trainee(app: &axum::Router, first: &str, last: &str) -> (String, String) {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/trainee/register",
            None,
            Some(json!({
                "first_name": first,
                "last_name": last,
                "date_of_birth": "1995-06-01",
                "address": "5 Oak Avenue"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["username"].as_str().unwrap().to_string(),
        body["password"].as_str().unwrap().to_string(),
    )
}

async fn register_trainer(app: &axum::Router, first: &str, last: &str, specialization: &str) -> (String, String) {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/trainer/register",
            None,
            Some(json!({
                "first_name": first,
                "last_name": last,
                "specialization": specialization
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["username"].as_str().unwrap().to_string(),
        body["password"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await.router();
    let (status, body) = send(&app, json_request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_and_read_profile() {
    let app = TestApp::new().await.router();
    let (username, password) = register_trainee(&app, "John", "Doe").await;
    assert_eq!(username, "John.Doe");

    let token = login(&app, &username, &password).await;
    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/v1/trainee/John.Doe", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "John");
    assert_eq!(body["address"], "5 Oak Avenue");
    assert_eq!(body["is_active"], true);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = TestApp::new().await.router();
    register_trainee(&app, "John", "Doe").await;

    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/v1/trainee/John.Doe", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failure");

    let (status, _) = send(
        &app,
        json_request(Method::GET, "/api/v1/training/types", Some("garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new().await.router();
    let (username, _) = register_trainee(&app, "John", "Doe").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/user/login",
            None,
            Some(json!({ "username": username, "password": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failure");
}

#[tokio::test]
async fn test_owner_updates_but_stranger_is_forbidden() {
    let app = TestApp::new().await.router();
    let (john, john_password) = register_trainee(&app, "John", "Doe").await;
    let (jane, jane_password) = register_trainee(&app, "Jane", "Roe").await;

    let john_token = login(&app, &john, &john_password).await;
    let jane_token = login(&app, &jane, &jane_password).await;
    let uri = format!("/api/v1/trainee/{}", john);

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&john_token), Some(json!({ "last_name": "Smith" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["last_name"], "Smith");
    assert_eq!(body["first_name"], "John");
    assert_eq!(body["username"], "John.Doe");

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&jane_token), Some(json!({ "last_name": "Hacked" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access_denied");
}

#[tokio::test]
async fn test_deactivated_trainee_can_read_but_not_write() {
    let app = TestApp::new().await.router();
    let (john, password) = register_trainee(&app, "John", "Doe").await;
    let token = login(&app, &john, &password).await;
    let active_uri = format!("/api/v1/trainee/{}/active", john);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            json_request(Method::PATCH, &active_uri, Some(&token), Some(json!({ "is_active": false }))),
        )
        .await;
        // The second call is rejected: the caller is now inactive.
        if status != StatusCode::OK {
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    let token = login(&app, &john, &password).await;
    let (status, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/v1/trainee/{}", john), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/trainee/{}", john),
            Some(&token),
            Some(json!({ "first_name": "Johnny" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin reactivates the account through the user endpoint.
    let admin_token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let (status, body) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/user/on-off/{}", john),
            Some(&admin_token),
            Some(json!({ "is_active": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_training_flow() {
    let app = TestApp::new().await.router();
    let (trainee, trainee_password) = register_trainee(&app, "John", "Doe").await;
    let (trainer, trainer_password) = register_trainer(&app, "Mia", "Stone", "YOGA").await;
    let trainee_token = login(&app, &trainee, &trainee_password).await;
    let trainer_token = login(&app, &trainer, &trainer_password).await;

    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/v1/training/types", Some(&trainee_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);
    assert_eq!(body[0], json!({ "id": 1, "name": "AGILITY" }));

    for (date, name) in [("2024-02-10", "Evening flow"), ("2024-01-15", "Morning flow")] {
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/training",
                Some(&trainer_token),
                Some(json!({
                    "trainee_username": trainee,
                    "trainer_username": trainer,
                    "name": name,
                    "training_type": "YOGA",
                    "training_date": date,
                    "duration_minutes": 50
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/v1/trainee/{}/trainings?from=2024-01-01&trainer=Mia", trainee),
            Some(&trainee_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let trainings = body.as_array().unwrap();
    assert_eq!(trainings.len(), 2);
    assert_eq!(trainings[0]["name"], "Morning flow");
    assert_eq!(trainings[1]["training_date"], "2024-02-10");

    let (status, body) = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/v1/trainer/{}/trainings?to=2024-01-31", trainer),
            Some(&trainer_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/v1/trainer/{}", trainer), Some(&trainee_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["specialization"], "YOGA");
    assert_eq!(body["trainees"][0]["username"], "John.Doe");
}

#[tokio::test]
async fn test_invalid_training_is_rejected() {
    let app = TestApp::new().await.router();
    let (trainee, password) = register_trainee(&app, "John", "Doe").await;
    let token = login(&app, &trainee, &password).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/training",
            Some(&token),
            Some(json!({
                "trainee_username": trainee,
                "trainer_username": "Ghost.Trainer",
                "name": "Run",
                "training_type": "CARDIO",
                "training_date": "2024-03-01",
                "duration_minutes": 30
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_participant");
}

#[tokio::test]
async fn test_admin_deletes_trainee() {
    let app = TestApp::new().await.router();
    let (trainee, password) = register_trainee(&app, "John", "Doe").await;
    let trainee_token = login(&app, &trainee, &password).await;
    let uri = format!("/api/v1/trainee/{}", trainee);

    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&trainee_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, json_request(Method::GET, &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // The deleted account's token no longer resolves.
    let (status, _) = send(
        &app,
        json_request(Method::GET, "/api/v1/training/types", Some(&trainee_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_account_does_not_carry_over_to_reissued_username() {
    let app = TestApp::new().await.router();
    let (first, password) = register_trainee(&app, "John", "Doe").await;
    let stale_token = login(&app, &first, &password).await;

    let admin_token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let uri = format!("/api/v1/trainee/{}", first);
    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (second, _) = register_trainee(&app, "John", "Doe").await;
    assert_eq!(second, first);

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&stale_token), Some(json!({ "last_name": "Taken" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failure");

    let (status, body) = send(&app, json_request(Method::GET, &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Doe");
}

#[tokio::test]
async fn test_password_change_revokes_earlier_tokens() {
    let app = TestApp::new().await.router();
    let (trainee, password) = register_trainee(&app, "John", "Doe").await;
    let old_token = login(&app, &trainee, &password).await;

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/user/change-password",
            None,
            Some(json!({
                "username": trainee,
                "old_password": password,
                "new_password": "Fresh!pass9"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/trainee/{}", trainee);
    let (status, _) = send(&app, json_request(Method::GET, &uri, Some(&old_token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let new_token = login(&app, &trainee, "Fresh!pass9").await;
    let (status, _) = send(&app, json_request(Method::GET, &uri, Some(&new_token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_endpoint() {
    let app = TestApp::new().await.router();
    let (trainee, password) = register_trainee(&app, "John", "Doe").await;

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/user/change-password",
            None,
            Some(json!({
                "username": trainee,
                "old_password": password,
                "new_password": "Fresh!pass9"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(&app, &trainee, "Fresh!pass9").await;
}

#[tokio::test]
async fn test_trainer_specialization_cannot_change() {
    let app = TestApp::new().await.router();
    let (trainer, password) = register_trainer(&app, "Mia", "Stone", "YOGA").await;
    let token = login(&app, &trainer, &password).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/trainer/{}", trainer),
            Some(&token),
            Some(json!({ "specialization": "ZUMBA" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_assign_trainers_endpoint() {
    let app = TestApp::new().await.router();
    let (trainee, password) = register_trainee(&app, "John", "Doe").await;
    let (mia, _) = register_trainer(&app, "Mia", "Stone", "YOGA").await;
    register_trainer(&app, "Bob", "Fast", "CARDIO").await;
    let token = login(&app, &trainee, &password).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/trainee/{}/trainers", trainee),
            Some(&token),
            Some(json!({ "trainers": [mia] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body[0]["username"], "Mia.Stone");

    let (status, body) = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/v1/trainee/{}/unassigned-trainers", trainee),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{
        "username": "Bob.Fast",
        "first_name": "Bob",
        "last_name": "Fast",
        "specialization": "CARDIO"
    }]));
}
