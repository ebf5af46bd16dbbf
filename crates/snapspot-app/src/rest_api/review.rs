use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use snapspot_core::interaction::Reaction;
use snapspot_dal::{
    reaction::ReviewReactionRepository,
    review::{CreateReview, ReviewRepository},
};
use snapspot_types::claim::{ApiClaim, Authorization as _, Role};

use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::spot::ReactionRequest,
    state::AppState,
};

repository_from_request!(ReviewRepository);
repository_from_request!(ReviewReactionRepository);

pub async fn create_review(
    repository: ReviewRepository,
    api_user: ApiClaim,
    Garde(Json(payload)): Garde<Json<CreateReview>>,
) -> ApiResult<impl IntoResponse> {
    let author_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let record = repository.create(payload, author_id).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_review(
    Path(id): Path<i64>,
    repository: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;

    Ok((StatusCode::OK, Json(record)))
}

/// Reviews are removed by their author; admins can moderate any review.
pub async fn delete_review(
    Path(id): Path<i64>,
    api_user: ApiClaim,
    repository: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;
    let is_author = api_user.user_id() == Some(record.user_id);
    if !is_author && !api_user.has_role(Role::Admin) {
        return Err(ApiError::Forbidden);
    }
    repository.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub async fn get_review_reaction(
    Path(id): Path<i64>,
    api_user: ApiClaim,
    repository: ReviewReactionRepository,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let status = repository.get(id, user_id).await?;
    Ok((StatusCode::OK, Json(status)))
}

/// Applies one thumb click and returns the new state with both counters.
pub async fn set_review_reaction(
    Path(id): Path<i64>,
    api_user: ApiClaim,
    repository: ReviewReactionRepository,
    Garde(Json(payload)): Garde<Json<ReactionRequest>>,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let outcome = repository
        .set(id, user_id, Reaction::from_is_liked(payload.is_liked))
        .await?;
    Ok((StatusCode::OK, Json(outcome)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_review))
        .route("/{id}", get(get_review).delete(delete_review))
        .route(
            "/{id}/reaction",
            get(get_review_reaction).put(set_review_reaction),
        )
}
