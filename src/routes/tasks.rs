use crate::{
    auth::{AccessMode, Caller},
    error::AppError,
    models::{TaskFields, TaskFilter, TaskInput},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Lists tasks visible to the caller.
///
/// In `Open` mode the `user_id` and `completed` query parameters narrow the
/// result and unrecognised parameters are ignored. In `Authenticated` mode a
/// token is required, the query string is not parsed at all, and regular users
/// only get their own tasks.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects, ordered by id.
/// - `400 Bad Request`: Malformed `user_id` or `completed` in `Open` mode.
/// - `401 Unauthorized`: Missing or invalid token in `Authenticated` mode.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    req: HttpRequest,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let requested = match state.policy.mode() {
        AccessMode::Open => web::Query::<TaskFilter>::from_query(req.query_string())
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .into_inner(),
        AccessMode::Authenticated => TaskFilter::default(),
    };
    let filter = state.policy.list_filter(&caller, requested)?;
    let tasks = state.tasks.list(&filter).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves a single task, subject to the same visibility rules as listing.
/// A task the caller may not see is reported as not found.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let scope = state.policy.read_scope(&caller)?;
    let task = state
        .tasks
        .get(task_id.into_inner(), scope)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Creates a task.
///
/// ## Request Body:
/// - `name`: required, surrounding whitespace is trimmed.
/// - `completed` (optional)
/// - `user_id` (optional): owner of the task.
///
/// ## Responses:
/// - `201 Created`: The created `Task`, including its id.
/// - `400 Bad Request`: Missing or blank name, malformed body.
/// - `401` / `403`: Only when ownership is enforced.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskInput>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let owner = state.policy.assign_owner(&caller, task_data.user_id)?;
    let fields = TaskFields::new(task_data.name.as_deref(), task_data.completed, owner)?;

    let task = state.tasks.create(&fields).await?;
    log::debug!("Created task {}", task.id);

    Ok(HttpResponse::Created().json(task))
}

/// Replaces a task's name, completion flag and owner.
///
/// All three fields are overwritten; omitted ones become null.
///
/// ## Responses:
/// - `200 OK`: The updated `Task`.
/// - `400 Bad Request`: Missing or blank name, malformed body.
/// - `404 Not Found`: No task with this id (or, with ownership enforced, not the caller's).
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskInput>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let scope = state.policy.mutation_scope(&caller)?;
    let owner = state.policy.assign_owner(&caller, task_data.user_id)?;
    let fields = TaskFields::new(task_data.name.as_deref(), task_data.completed, owner)?;

    let task = state
        .tasks
        .update(task_id.into_inner(), &fields, scope)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: The task was removed.
/// - `404 Not Found`: No task with this id (or, with ownership enforced, not the caller's).
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let scope = state.policy.mutation_scope(&caller)?;

    if !state.tasks.delete(task_id.into_inner(), scope).await? {
        return Err(task_not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}
