// server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::flows::contexts::{LoginCtx, RequestOtpCtx, VerifyOtpCtx};
use crate::flows::run_flow;
use crate::models::{NewUser, ProfileUpdate, PublicUser};
use crate::repositories::EMAIL_IN_USE;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub phone_number: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub otp: String,
  pub password: Option<String>,
  pub username: Option<String>,
  pub phone_number: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub email: Option<String>,
  pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub phone_number: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub is_admin: bool,
}

#[instrument(name = "handler::request_otp", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn request_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RequestOtpPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = RequestOtpCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    username: payload.username,
    phone_number: payload.phone_number,
    otp: None,
    user_id: None,
  };

  let done = run_flow(&app_state, ctx).await?;
  info!(user_id = ?done.user_id, "Registration pending OTP confirmation.");
  Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent to email." })))
}

#[instrument(name = "handler::verify_otp", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn verify_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<VerifyOtpPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = VerifyOtpCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    otp: payload.otp,
    password: payload.password,
    username: payload.username,
    phone_number: payload.phone_number,
    pending_user: None,
    verified_user: None,
  };

  if let Some(user) = run_flow(&app_state, ctx).await?.verified_user {
    info!(user_id = %user.id, "User completed registration.");
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "User registered successfully" })))
}

#[instrument(name = "handler::login", skip(app_state, req_payload), fields(req_email = ?req_payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = LoginCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    user: None,
    token: None,
  };

  let done = run_flow(&app_state, ctx).await?;
  let (Some(user), Some(token)) = (done.user, done.token) else {
    warn!("Login flow completed without a user or token.");
    return Err(AppError::Internal("Login completed without issuing a token.".to_string()));
  };

  info!(user_id = %user.id, "Login successful.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Login successful",
    "token": token,
    "user": PublicUser::from(&user),
  })))
}

#[instrument(name = "handler::register_user", skip(app_state, req_payload, admin), fields(admin_id = %admin.0.id))]
pub async fn register_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<RegisterUserPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let username = payload.username.trim().to_string();
  let phone_number = payload.phone_number.trim().to_string();
  let email = payload.email.trim().to_string();

  if username.is_empty() || phone_number.is_empty() || payload.password.is_empty() {
    return Err(AppError::Validation(
      "Username, phone number, email and password are required.".to_string(),
    ));
  }
  if !auth_service::is_valid_email(&email) {
    return Err(AppError::Validation("Please fill a valid email address".to_string()));
  }
  if app_state.users.find_conflict(&username, &phone_number, &email).await?.is_some() {
    return Err(AppError::Validation("Username, phone number, or email already in use.".to_string()));
  }

  let user = app_state
    .users
    .insert(NewUser {
      username,
      phone_number,
      email,
      password_hash: auth_service::hash_password(&payload.password)?,
      otp: None,
      otp_expires: None,
      is_admin: payload.is_admin,
    })
    .await?;

  info!(user_id = %user.id, "User registered directly by an admin.");
  Ok(HttpResponse::Created().json(json!({ "message": "User created successfully!", "user": user })))
}

#[instrument(name = "handler::list_users", skip(app_state, _admin))]
pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let users = app_state.users.list().await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::edit_user", skip(app_state, path, req_payload, _admin), fields(user_id = %path.as_ref()))]
pub async fn edit_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  let update = req_payload.into_inner().trimmed();

  if let Some(email) = update.email.as_deref() {
    if !auth_service::is_valid_email(email) {
      return Err(AppError::Validation("Please fill a valid email address".to_string()));
    }
    if let Some(holder) = app_state.users.find_by_email(email).await? {
      if holder.id != user_id {
        warn!(%user_id, holder_id = %holder.id, "Edit would reuse another user's email.");
        return Err(AppError::Validation(EMAIL_IN_USE.to_string()));
      }
    }
  }
  let blank = |v: &Option<String>| v.as_deref().is_some_and(str::is_empty);
  if blank(&update.username) || blank(&update.phone_number) {
    return Err(AppError::Validation("Username and phone number cannot be blank".to_string()));
  }

  let user = app_state
    .users
    .update_profile(user_id, update)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  info!(%user_id, "User profile updated.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully", "user": user })))
}

#[instrument(name = "handler::delete_user", skip(app_state, path, _admin), fields(user_id = %path.as_ref()))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  if !app_state.users.delete(user_id).await? {
    return Err(AppError::NotFound("User not found".to_string()));
  }
  info!(%user_id, "User deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}

pub async fn admin_test_handler(admin: AdminUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "message": "Admin access granted", "user": admin.0 }))
}
