use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::{StatusCode, Uri},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument, Span};

use super::dto::UserResponse;
use super::validate::{parse_request, QueryParams, BY_ID, CREATE, UPDATE};
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// Raw `{id}` segment. A segment axum can't decode (invalid UTF-8 after
/// percent-decoding) is kept in its encoded form, so it still goes through
/// `parse_request` and comes back as `InvalidId`.
fn id_segment(path: Result<Path<String>, PathRejection>, uri: &Uri) -> String {
    let id = match path {
        Ok(Path(id)) => id,
        Err(rejection) => {
            debug!(%rejection, "undecodable id segment");
            uri.path().rsplit('/').next().unwrap_or_default().to_string()
        }
    };
    Span::current().record("id", id.as_str());
    id
}

#[instrument(skip_all, fields(id = tracing::field::Empty))]
pub async fn get_user(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = id_segment(path, &uri);
    let request = parse_request(&QueryParams::default(), Some(&id), BY_ID)?;
    let user = state.users.get(request).await?;
    Ok(Json(user))
}

// Query pairs are skipped from the span: they carry the plaintext password.
#[instrument(skip(state, query))]
pub async fn create_user(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let request = parse_request(&QueryParams::from(query), None, CREATE)?;
    let user = state.users.create(request).await?;
    tracing::info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(id = tracing::field::Empty))]
pub async fn update_user(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let id = id_segment(path, &uri);
    let request = parse_request(&QueryParams::from(query), Some(&id), UPDATE)?;
    let user = state.users.update(request).await?;
    tracing::info!(user_id = user.id, "user updated");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(id = tracing::field::Empty))]
pub async fn delete_user(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = id_segment(path, &uri);
    let request = parse_request(&QueryParams::default(), Some(&id), BY_ID)?;
    let user = state.users.delete(request).await?;
    tracing::info!(user_id = user.id, "user deleted");
    Ok(Json(user))
}
