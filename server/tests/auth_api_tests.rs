// tests/auth_api_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use baattak_server::models::User;
use baattak_server::services::{auth_service, token_service};
use chrono::{Duration, Utc};
use common::{bearer, init_app, TestContext, JWT_SECRET};
use serde_json::{json, Value};
use uuid::Uuid;

fn registration(email: &str) -> Value {
  json!({
    "email": email,
    "password": "chai-lover",
    "username": "asha",
    "phoneNumber": "9876543210"
  })
}

fn login(email: &str, password: &str) -> Value {
  json!({ "email": email, "password": password })
}

#[actix_web::test]
async fn otp_registration_then_login() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  let email = "asha@example.com";

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register/request-otp")
    .set_json(registration(email))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "OTP sent to email.");

  let code = tc.mailer.last_code_for(email).expect("otp was mailed");
  assert_eq!(code.len(), auth_service::OTP_LENGTH);
  assert_eq!(tc.store.pending_otp(email), Some(code.clone()));

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/login")
    .set_json(login(email, "chai-lover"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let wrong = if code == "000000" { "111111" } else { "000000" };
  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register/verify-otp")
    .set_json(json!({ "email": email, "otp": wrong }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Invalid or expired OTP");

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register/verify-otp")
    .set_json(json!({ "email": email, "otp": code }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "User registered successfully");
  assert_eq!(tc.store.pending_otp(email), None);

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/login")
    .set_json(login(email, "chai-lover"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Login successful");
  assert_eq!(body["user"]["email"], email);
  assert_eq!(body["user"]["isAdmin"], false);
  assert!(body["user"].get("passwordHash").is_none());

  let claims = token_service::decode_token(body["token"].as_str().unwrap(), JWT_SECRET).unwrap();
  assert_eq!(claims.email, email);
  assert!(!claims.is_admin);
  assert!(claims.exp > claims.iat);
}

#[actix_web::test]
async fn second_otp_request_for_same_email_is_rejected() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);

  for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
    let req = test::TestRequest::post()
      .uri("/api/v1/customer/register/request-otp")
      .set_json(registration("dup@example.com"))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), expected);
  }
  assert_eq!(tc.mailer.sent.lock().len(), 1);
}

#[actix_web::test]
async fn otp_request_requires_valid_fields() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);

  let mut missing_password = registration("a@example.com");
  missing_password["password"] = json!("");
  for payload in [registration("not-an-email"), missing_password] {
    let req = test::TestRequest::post()
      .uri("/api/v1/customer/register/request-otp")
      .set_json(payload)
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
  }
  assert!(tc.mailer.sent.lock().is_empty());
}

#[actix_web::test]
async fn expired_otp_is_rejected() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  let now = Utc::now();
  tc.store.seed_user(User {
    id: Uuid::new_v4(),
    username: "late".into(),
    phone_number: "9123456780".into(),
    email: "late@example.com".into(),
    password_hash: auth_service::hash_password("pw").unwrap(),
    otp: Some("123456".into()),
    otp_expires: Some(now - Duration::minutes(1)),
    is_admin: false,
    created_at: now - Duration::minutes(20),
    updated_at: now - Duration::minutes(20),
  });

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register/verify-otp")
    .set_json(json!({ "email": "late@example.com", "otp": "123456" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
  assert_eq!(tc.store.pending_otp("late@example.com").as_deref(), Some("123456"));

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register/verify-otp")
    .set_json(json!({ "email": "ghost@example.com", "otp": "123456" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_failures_map_to_expected_statuses() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  tc.user_with_token("cook@example.com", "right-pass", false).await;

  let cases = [
    (login("cook@example.com", "wrong-pass"), StatusCode::UNAUTHORIZED),
    (login("nobody@example.com", "right-pass"), StatusCode::UNAUTHORIZED),
    (json!({ "email": "cook@example.com" }), StatusCode::BAD_REQUEST),
    (json!({ "password": "right-pass" }), StatusCode::BAD_REQUEST),
  ];
  for (payload, expected) in cases {
    let req = test::TestRequest::post().uri("/api/v1/customer/login").set_json(payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), expected);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("token").is_none());
  }
}

#[actix_web::test]
async fn admin_routes_check_token_and_role() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  let (_, staff_token) = tc.user_with_token("staff@example.com", "pw", false).await;
  let admin_token = tc.admin_token().await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/customer/admin/test").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Access token required");

  let req = test::TestRequest::get()
    .uri("/api/v1/customer/admin/test")
    .insert_header(bearer("not-a-jwt"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/v1/customer/admin/test")
    .insert_header(bearer(&staff_token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get()
    .uri("/api/v1/customer/admin/test")
    .insert_header(bearer(&admin_token))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Admin access granted");
  assert_eq!(body["user"]["isAdmin"], true);

  let req = test::TestRequest::get()
    .uri("/api/v1/customer/all")
    .insert_header(bearer(&staff_token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_manages_users() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  let admin_token = tc.admin_token().await;

  let new_user = json!({
    "username": "ravi",
    "phoneNumber": "9000000001",
    "email": "ravi@example.com",
    "password": "ravi-pass"
  });
  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register")
    .insert_header(bearer(&admin_token))
    .set_json(new_user.clone())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let ravi_id = body["user"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/register")
    .insert_header(bearer(&admin_token))
    .set_json(new_user)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Username, phone number, or email already in use.");

  // Directly registered users can log in without an OTP step.
  let req = test::TestRequest::post()
    .uri("/api/v1/customer/login")
    .set_json(login("ravi@example.com", "ravi-pass"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/customer/edit/{ravi_id}"))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "username": "ravi-k" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["user"]["username"], "ravi-k");
  assert_eq!(body["user"]["email"], "ravi@example.com");

  let req = test::TestRequest::get()
    .uri("/api/v1/customer/all")
    .insert_header(bearer(&admin_token))
    .to_request();
  let users: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(users.as_array().unwrap().len(), 2);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/customer/delete/{ravi_id}"))
    .insert_header(bearer(&admin_token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/customer/delete/{ravi_id}"))
    .insert_header(bearer(&admin_token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/customer/edit/{}", Uuid::new_v4()))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "username": "ghost" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn edit_keeps_emails_unique_and_trimmed() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);
  let admin_token = tc.admin_token().await;
  tc.user_with_token("asha@example.com", "asha-pass", false).await;
  let (ravi, _) = tc.user_with_token("ravi@example.com", "ravi-pass", false).await;

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/customer/edit/{}", ravi.id))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "email": "asha@example.com" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("already in use"));

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/login")
    .set_json(login("ravi@example.com", "ravi-pass"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/customer/edit/{}", ravi.id))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "email": "  padded@example.com  ", "username": " ravi-k " }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["user"]["email"], "padded@example.com");
  assert_eq!(body["user"]["username"], "ravi-k");

  // Re-saving a user's own email is not a conflict.
  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/customer/edit/{}", ravi.id))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "email": "padded@example.com" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::post()
    .uri("/api/v1/customer/login")
    .set_json(login("padded@example.com", "ravi-pass"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
