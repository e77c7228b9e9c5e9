use crate::{
    auth::{AuthResponse, Caller, LoginRequest, RegisterRequest},
    error::AppError,
    models::UserProfile,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

/// Register a new user
///
/// Hashes the password and stores the account. A taken username is rejected by
/// the datastore's unique constraint, so concurrent registrations of the same
/// name cannot both succeed.
///
/// ## Responses:
/// - `201 Created`: `{id, username, is_admin}`.
/// - `400 Bad Request`: Missing/invalid credentials or username already taken.
/// - `401` / `403`: Registering an admin while ownership is enforced requires an admin token.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let (username, password) = register_data.credentials()?;
    let is_admin = register_data.is_admin.unwrap_or(false);
    state.policy.register(&caller, is_admin)?;

    let hasher = state.passwords;
    let password = password.to_string();
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user = state
        .users
        .create_user(username, &password_hash, is_admin)
        .await?;
    log::info!("Registered user {} (admin: {})", user.id, user.is_admin);

    Ok(HttpResponse::Created().json(UserProfile::from(user)))
}

/// Login user
///
/// Verifies the credentials and returns a signed session token.
///
/// ## Responses:
/// - `200 OK`: `{token, username, is_admin}`.
/// - `400 Bad Request`: Malformed body.
/// - `401 Unauthorized`: Unknown username or wrong password.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let LoginRequest { username, password } = login_data.into_inner();

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hasher = state.passwords;
    let stored_hash = user.password_hash.clone();
    let matches = web::block(move || hasher.verify(&password, &stored_hash)).await?;
    if !matches {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id, user.is_admin)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        username: user.username,
        is_admin: user.is_admin,
    }))
}
