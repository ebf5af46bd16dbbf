use crate::{
    auth::token::RequiredRolesLayer,
    error::{ApiError, ApiResult},
    repository_from_request,
};
use axum_valid::Garde;
use snapspot_dal::user::{CreateUser, UserRepository};

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{delete, get, post},
    Json,
};
use http::StatusCode;
use snapspot_types::claim::{ApiClaim, Role};

use crate::state::AppState;

repository_from_request!(UserRepository);

pub async fn create_user(
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(user_registry: UserRepository) -> ApiResult<impl IntoResponse> {
    let users = user_registry.list(100).await?;
    Ok((StatusCode::OK, Json(users)))
}

async fn delete_user(
    Path(id): Path<i64>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    user_registry.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

/// Profile of the calling user.
async fn me(api_user: ApiClaim, user_registry: UserRepository) -> ApiResult<impl IntoResponse> {
    let id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let user = user_registry.get(id).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub fn users_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", delete(delete_user))
        .layer(RequiredRolesLayer::new([Role::Admin]))
        .route("/me", get(me))
}
