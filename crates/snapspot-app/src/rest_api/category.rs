use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{delete, get, post},
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use snapspot_dal::category::{CategoryRepository, CreateCategory};
use snapspot_types::claim::Role;

use crate::{
    auth::token::RequiredRolesLayer, error::ApiResult, repository_from_request, state::AppState,
};

repository_from_request!(CategoryRepository);

pub async fn create_category(
    repository: CategoryRepository,
    Garde(Json(payload)): Garde<Json<CreateCategory>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_category(
    Path(id): Path<i64>,
    repository: CategoryRepository,
    Garde(Json(payload)): Garde<Json<CreateCategory>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.update(id, payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn list_categories(repository: CategoryRepository) -> ApiResult<impl IntoResponse> {
    let records = repository.list(snapspot_dal::MAX_LIMIT).await?;
    Ok((StatusCode::OK, Json(records)))
}

pub async fn count_categories(repository: CategoryRepository) -> ApiResult<impl IntoResponse> {
    let count = repository.count().await?;
    Ok((StatusCode::OK, Json(count)))
}

pub async fn get_category(
    Path(id): Path<i64>,
    repository: CategoryRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn delete_category(
    Path(id): Path<i64>,
    repository: CategoryRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_category))
        .route("/{id}", delete(delete_category).put(update_category))
        .layer(RequiredRolesLayer::new([Role::Admin]))
        .route("/", get(list_categories))
        .route("/count", get(count_categories))
        .route("/{id}", get(get_category))
}
