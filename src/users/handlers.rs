use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        error::UserRepoError,
        repo_types::{NewUser, User, UserPatch},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user).patch(update_user))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PublicUser>), (StatusCode, String)> {
    let new = NewUser::from(payload);
    let user = User::create(&state.db, &new).await.map_err(repo_error)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::LOCATION,
        HeaderValue::from_str(&format!("/api/v1/users/{}", user.id)).map_err(internal)?,
    );

    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, headers, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    match User::find_by_id(&state.db, id).await {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) => Err((StatusCode::NOT_FOUND, "User not found".into())),
        Err(e) => Err(repo_error(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let patch = UserPatch::from(payload);
    let user = User::update(&state.db, id, &patch)
        .await
        .map_err(repo_error)?;
    info!(user_id = %user.id, ?patch, "user updated");
    Ok(Json(user.into()))
}

fn repo_error(e: UserRepoError) -> (StatusCode, String) {
    match e {
        UserRepoError::NotFound => (StatusCode::NOT_FOUND, "User not found".into()),
        UserRepoError::Duplicate { .. } => {
            warn!(error = %e, "duplicate user");
            (StatusCode::CONFLICT, "User already exists".into())
        }
        UserRepoError::InvalidValue(_) => {
            warn!(error = %e, "rejected user value");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        UserRepoError::Database(_) => {
            error!(error = ?e, "user query failed");
            internal(e)
        }
    }
}

fn internal<E: std::error::Error>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
