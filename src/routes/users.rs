use crate::{auth::Caller, error::AppError, models::UserProfile, state::AppState};
use actix_web::{delete, get, web, HttpResponse, Responder};

/// Lists all accounts without their password hashes.
#[get("")]
pub async fn get_users(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    state.policy.manage_users(&caller)?;

    let users: Vec<UserProfile> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Deletes an account. Tasks it owned are kept and lose their owner.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    user_id: web::Path<i32>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    state.policy.manage_users(&caller)?;

    let user_id = user_id.into_inner();
    if !state.users.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("Deleted user {}", user_id);

    Ok(HttpResponse::NoContent().finish())
}
