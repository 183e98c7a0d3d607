// baattak/server/src/flows/identity_flows.rs

use crate::errors::AppError;
use crate::flows::contexts::{LoginCtx, RequestOtpCtx, VerifyOtpCtx};
use crate::models::{NewUser, ProfileUpdate};
use crate::services::{auth_service, token_service};
use baattak_flow::{Flow, FlowContext, FlowControl, FlowRegistry};
use chrono::Utc;
use tracing::{debug, info, warn};

pub fn register_request_otp_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<RequestOtpCtx, AppError>::new(&[
    ("validate_registration", false, None),
    ("check_existing_email", false, None),
    ("create_pending_user", false, None),
    ("send_otp_email", false, None),
  ])
  .named("request_otp");

  flow.on("validate_registration", |ctx: FlowContext<RequestOtpCtx>| async move {
    let guard = ctx.read();
    if !auth_service::is_valid_email(guard.email.trim()) {
      return Err(AppError::Validation("Please fill a valid email address".to_string()));
    }
    if guard.password.is_empty() {
      return Err(AppError::Validation("Password is required".to_string()));
    }
    if guard.username.trim().is_empty() {
      return Err(AppError::Validation("Username is required".to_string()));
    }
    if guard.phone_number.trim().is_empty() {
      return Err(AppError::Validation("Phone number is required".to_string()));
    }
    Ok(FlowControl::Continue)
  });

  flow.on("check_existing_email", |ctx: FlowContext<RequestOtpCtx>| async move {
    let (users, email) = {
      let guard = ctx.read();
      (guard.app_state.users.clone(), guard.email.trim().to_string())
    };

    if users.find_by_email(&email).await?.is_some() {
      warn!(%email, "Registration attempted for an existing email.");
      return Err(AppError::Validation("Email already registered.".to_string()));
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("create_pending_user", |ctx: FlowContext<RequestOtpCtx>| async move {
    let (users, new_user, otp) = {
      let guard = ctx.read();
      let otp = auth_service::generate_otp();
      let otp_ttl = chrono::Duration::from_std(guard.app_state.config.otp_ttl)
        .map_err(|e| AppError::Config(format!("Invalid OTP TTL: {}", e)))?;
      let new_user = NewUser {
        username: guard.username.trim().to_string(),
        phone_number: guard.phone_number.trim().to_string(),
        email: guard.email.trim().to_string(),
        password_hash: auth_service::hash_password(&guard.password)?,
        otp: Some(otp.clone()),
        otp_expires: Some(Utc::now() + otp_ttl),
        is_admin: false,
      };
      (guard.app_state.users.clone(), new_user, otp)
    };

    let user = users.insert(new_user).await?;
    info!(user_id = %user.id, "Pending user stored.");
    {
      let mut guard = ctx.write();
      guard.user_id = Some(user.id);
      guard.otp = Some(otp);
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("send_otp_email", |ctx: FlowContext<RequestOtpCtx>| async move {
    let (mailer, email, otp) = {
      let guard = ctx.read();
      let otp = guard
        .otp
        .clone()
        .ok_or_else(|| AppError::Internal("No OTP generated for this registration.".to_string()))?;
      (guard.app_state.mailer.clone(), guard.email.trim().to_string(), otp)
    };

    mailer.send_otp(&email, &otp).await?;
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(flow);
}

pub fn register_verify_otp_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<VerifyOtpCtx, AppError>::new(&[
    ("load_pending_user", false, None),
    ("check_otp", false, None),
    ("complete_registration", false, None),
  ])
  .named("verify_otp");

  flow.on("load_pending_user", |ctx: FlowContext<VerifyOtpCtx>| async move {
    let (users, email) = {
      let guard = ctx.read();
      (guard.app_state.users.clone(), guard.email.trim().to_string())
    };

    let user = users
      .find_by_email(&email)
      .await?
      .ok_or_else(|| AppError::Validation("User not found".to_string()))?;
    ctx.write().pending_user = Some(user);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("check_otp", |ctx: FlowContext<VerifyOtpCtx>| async move {
    let guard = ctx.read();
    let user = guard
      .pending_user
      .as_ref()
      .ok_or_else(|| AppError::Internal("OTP check ran without a loaded user.".to_string()))?;

    let code_matches = user.otp.as_deref() == Some(guard.otp.trim());
    let still_valid = user.otp_expires.is_some_and(|expires| expires >= Utc::now());
    if !code_matches || !still_valid {
      warn!(user_id = %user.id, code_matches, still_valid, "OTP verification failed.");
      return Err(AppError::Validation("Invalid or expired OTP".to_string()));
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("complete_registration", |ctx: FlowContext<VerifyOtpCtx>| async move {
    let (users, user_id, password_hash, profile) = {
      let guard = ctx.read();
      let user_id = guard
        .pending_user
        .as_ref()
        .map(|u| u.id)
        .ok_or_else(|| AppError::Internal("Registration completed without a loaded user.".to_string()))?;
      let password_hash = match guard.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(auth_service::hash_password(password)?),
        None => None,
      };
      let profile = ProfileUpdate {
        username: non_blank(guard.username.as_deref()),
        email: None,
        phone_number: non_blank(guard.phone_number.as_deref()),
      };
      (guard.app_state.users.clone(), user_id, password_hash, profile)
    };

    let verified = users
      .set_password_and_clear_otp(user_id, password_hash, profile)
      .await?
      .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    info!(user_id = %verified.id, "Registration verified.");
    ctx.write().verified_user = Some(verified);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(flow);
}

fn non_blank(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn register_login_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<LoginCtx, AppError>::new(&[
    ("validate_login_input", false, None),
    ("load_user", false, None),
    ("ensure_verified", false, None),
    ("check_password", false, None),
    ("issue_token", false, None),
  ])
  .named("login");

  flow.on("validate_login_input", |ctx: FlowContext<LoginCtx>| async move {
    let guard = ctx.read();
    let email_missing = guard.email.as_deref().map_or(true, |e| e.trim().is_empty());
    let password_missing = guard.password.as_deref().map_or(true, str::is_empty);
    if email_missing || password_missing {
      return Err(AppError::Validation("Email and password are required".to_string()));
    }
    Ok(FlowControl::Continue)
  });

  flow.on("load_user", |ctx: FlowContext<LoginCtx>| async move {
    let (users, email) = {
      let guard = ctx.read();
      (
        guard.app_state.users.clone(),
        guard.email.as_deref().unwrap_or_default().trim().to_string(),
      )
    };

    match users.find_by_email(&email).await? {
      Some(user) => {
        ctx.write().user = Some(user);
        Ok::<_, AppError>(FlowControl::Continue)
      }
      None => {
        debug!(%email, "Login for unknown email.");
        Err(AppError::Auth("Login failed: User not found".to_string()))
      }
    }
  });

  flow.on("ensure_verified", |ctx: FlowContext<LoginCtx>| async move {
    let guard = ctx.read();
    match guard.user.as_ref() {
      Some(user) if user.is_verified() => Ok(FlowControl::Continue),
      Some(_) => Err(AppError::Unverified(
        "Please verify your email with the OTP before logging in.".to_string(),
      )),
      None => Err(AppError::Internal("Verification check ran without a loaded user.".to_string())),
    }
  });

  flow.on("check_password", |ctx: FlowContext<LoginCtx>| async move {
    let guard = ctx.read();
    let user = guard
      .user
      .as_ref()
      .ok_or_else(|| AppError::Internal("Password check ran without a loaded user.".to_string()))?;
    let provided = guard.password.as_deref().unwrap_or_default();
    if !auth_service::verify_password(&user.password_hash, provided)? {
      warn!(user_id = %user.id, "Login failed: incorrect password.");
      return Err(AppError::Auth("Login failed: Incorrect password".to_string()));
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("issue_token", |ctx: FlowContext<LoginCtx>| async move {
    let token = {
      let guard = ctx.read();
      let user = guard
        .user
        .as_ref()
        .ok_or_else(|| AppError::Internal("Token requested without a loaded user.".to_string()))?;
      let config = &guard.app_state.config;
      token_service::issue_token(user, &config.jwt_secret, config.token_ttl)?
    };
    ctx.write().token = Some(token);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(flow);
}
