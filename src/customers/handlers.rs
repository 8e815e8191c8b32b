use axum::{
    extract::{FromRef, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        cookie::{CookieConfig, SameSite},
        jwt::{AuthCustomer, JwtKeys, TOKEN_COOKIE},
        password::{hash_password, verify_password},
    },
    customers::{
        dto::{AckResponse, CustomerResponse, LoginRequest, SignupRequest, TokenResponse, UpdateRequest},
        repo::is_unique_violation,
        repo_types::Customer,
    },
    error::ApiError,
    state::AppState,
};

/// One message for both unknown email and wrong password, so login cannot be
/// used to enumerate accounts.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Empty strings behave like absent fields; an update cannot clear a field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Merge a partial update into a fetched record. Only supplied, non-empty
/// fields change; a supplied password is re-hashed before storage.
fn apply_update(customer: &mut Customer, payload: UpdateRequest) -> Result<(), ApiError> {
    if let Some(name) = non_empty(payload.name) {
        customer.name = name;
    }
    if let Some(email) = non_empty(payload.email) {
        customer.email = email.trim().to_lowercase();
    }
    if let Some(username) = non_empty(payload.username) {
        customer.username = username;
    }
    if let Some(phone_number) = non_empty(payload.phone_number) {
        customer.phone_number = phone_number;
    }
    if let Some(password) = non_empty(payload.password) {
        customer.password_hash = hash_password(&password)?;
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    // Friendly pre-check; the UNIQUE constraint below is authoritative.
    if Customer::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let customer = Customer::create(
        &state.db,
        &payload.name,
        &payload.email,
        &payload.username,
        &hash,
        &payload.phone_number,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email already exists".into())
        } else {
            e.into()
        }
    })?;

    info!(customer_id = %customer.id, email = %customer.email, "customer registered");
    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse {
            success: true,
            data: customer,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e.trim().to_lowercase(), p),
        _ => {
            return Err(ApiError::Validation(
                "Please provide an email and password".into(),
            ))
        }
    };

    let customer = match Customer::find_by_email(&state.db, &email).await? {
        Some(c) => c,
        None => {
            warn!("login with unknown email");
            return Err(ApiError::Auth(INVALID_CREDENTIALS.into()));
        }
    };
    if !verify_password(&password, &customer.password_hash)? {
        warn!(customer_id = %customer.id, "login with invalid password");
        return Err(ApiError::Auth(INVALID_CREDENTIALS.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(customer.id)?;

    let cookie = CookieConfig {
        name: TOKEN_COOKIE.into(),
        secure: state.config.is_production(),
        http_only: true,
        same_site: SameSite::Lax,
        path: "/".into(),
        max_age_secs: Some(state.config.jwt.cookie_expire_days * 24 * 60 * 60),
    };

    info!(customer_id = %customer.id, "customer logged in");
    Ok((
        [(header::SET_COOKIE, cookie.set_cookie_header(&token))],
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthCustomer(actor): AuthCustomer,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let mut customer = Customer::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;

    // Identity comes from the verified session token, never from the request.
    if customer.id != actor {
        warn!(customer_id = %customer.id, actor = %actor, "update ownership mismatch");
        return Err(ApiError::Auth("Not authorized to update this customer".into()));
    }

    apply_update(&mut customer, payload)?;

    let customer = customer.save(&state.db).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email already exists".into())
        } else {
            e.into()
        }
    })?;

    info!(customer_id = %customer.id, "customer updated");
    Ok(Json(CustomerResponse {
        success: true,
        data: customer,
    }))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AuthCustomer(actor): AuthCustomer,
    Path(id): Path<Uuid>,
) -> Result<Json<AckResponse>, ApiError> {
    let customer = Customer::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;

    if customer.id != actor {
        warn!(customer_id = %customer.id, actor = %actor, "delete ownership mismatch");
        return Err(ApiError::Auth("Not authorized to delete this customer".into()));
    }

    Customer::delete_by_id(&state.db, id).await?;

    info!(customer_id = %id, "customer deleted");
    Ok(Json(AckResponse {
        success: true,
        message: "Customer deleted successfully".into(),
    }))
}
