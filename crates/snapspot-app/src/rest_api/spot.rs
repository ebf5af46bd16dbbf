use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json,
};
use axum_valid::Garde;
use garde::Validate;
use http::StatusCode;
use serde::Deserialize;
use snapspot_core::{
    geo::{filter_spots, Point, SpotFilter},
    interaction::Reaction,
};
use snapspot_dal::{
    reaction::SpotReactionRepository,
    review::ReviewRepository,
    spot::{CreateSpot, Spot, SpotRepository, UpdateSpot},
    Batch,
};
use snapspot_types::claim::{ApiClaim, Role};
use tracing::debug;

use crate::{
    auth::token::RequiredRolesLayer,
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
};

repository_from_request!(SpotRepository);
repository_from_request!(SpotReactionRepository);

/// Listing filter as it arrives on the query string; categories come comma
/// separated, center only counts when both coordinates are present.
#[derive(Debug, Clone, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct SpotFilterQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
    #[garde(length(max = 255))]
    categories: Option<String>,
    #[garde(length(max = 255))]
    q: Option<String>,
}

impl SpotFilterQuery {
    fn into_criteria(self) -> SpotFilter {
        let center = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Point::new(lat, lng)),
            _ => None,
        };
        let category_ids = self
            .categories
            .map(|s| s.split(',').filter_map(|v| v.trim().parse().ok()).collect())
            .unwrap_or_default();
        SpotFilter {
            center,
            radius_km: self.radius_km,
            category_ids,
            text: self.q,
        }
    }
}

pub async fn list_spots(
    repository: SpotRepository,
    State(state): State<AppState>,
    Garde(Query(paging)): Garde<Query<Paging>>,
    Garde(Query(filter)): Garde<Query<SpotFilterQuery>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size: u32 = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let criteria = filter.into_criteria();

    let batch = if criteria.is_empty() {
        repository.list(listing_params).await?
    } else {
        // filtering happens over the full bounded set, the page is sliced from
        // the filtered sequence afterwards
        let spots = repository.list_all().await?;
        let filtered = filter_spots(&spots, &criteria);
        debug!(
            total = spots.len(),
            matched = filtered.len(),
            "filtered spot listing"
        );
        let total = filtered.len() as u64;
        let rows: Vec<Spot> = filtered
            .into_iter()
            .skip(listing_params.offset as usize)
            .take(listing_params.limit as usize)
            .cloned()
            .collect();
        Batch {
            rows,
            total,
            offset: listing_params.offset,
        }
    };

    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

pub async fn count_spots(repository: SpotRepository) -> ApiResult<impl IntoResponse> {
    let count = repository.count().await?;
    Ok((StatusCode::OK, Json(count)))
}

pub async fn get_spot(
    Path(id): Path<i64>,
    repository: SpotRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn create_spot(
    repository: SpotRepository,
    api_user: ApiClaim,
    Garde(Json(mut payload)): Garde<Json<CreateSpot>>,
) -> ApiResult<impl IntoResponse> {
    payload.created_by = Some(api_user.sub);
    let record = repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_spot(
    Path(id): Path<i64>,
    repository: SpotRepository,
    Garde(Json(payload)): Garde<Json<UpdateSpot>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.update(id, payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn delete_spot(
    Path(id): Path<i64>,
    repository: SpotRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

/// Reviews of one spot, newest first.
pub async fn list_spot_reviews(
    Path(id): Path<i64>,
    spots: SpotRepository,
    reviews: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    // 404 for an unknown spot rather than an empty list
    spots.get(id).await?;
    let records = reviews.list_by_spot(id).await?;
    Ok((StatusCode::OK, Json(records)))
}

#[derive(Debug, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct ReactionRequest {
    pub is_liked: bool,
}

pub async fn get_spot_reaction(
    Path(id): Path<i64>,
    api_user: ApiClaim,
    repository: SpotReactionRepository,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let status = repository.get(id, user_id).await?;
    Ok((StatusCode::OK, Json(status)))
}

pub async fn set_spot_reaction(
    Path(id): Path<i64>,
    api_user: ApiClaim,
    repository: SpotReactionRepository,
    Garde(Json(payload)): Garde<Json<ReactionRequest>>,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let status = repository
        .set(id, user_id, Reaction::from_is_liked(payload.is_liked))
        .await?;
    Ok((StatusCode::OK, Json(status)))
}

/// The caller's reactions across spots - the stored spots listing.
pub async fn list_spot_reactions(
    api_user: ApiClaim,
    repository: SpotReactionRepository,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id().ok_or(ApiError::Unauthorized)?;
    let rows = repository.list_for_user(user_id).await?;
    Ok((StatusCode::OK, Json(rows)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/{id}", delete(delete_spot))
        .layer(RequiredRolesLayer::new([Role::Admin]))
        .route("/", post(create_spot))
        .route("/{id}", put(update_spot))
        .layer(RequiredRolesLayer::new([Role::User, Role::Admin]))
        .route("/", get(list_spots))
        .route("/count", get(count_spots))
        .route("/reactions", get(list_spot_reactions))
        .route("/{id}", get(get_spot))
        .route("/{id}/review", get(list_spot_reviews))
        .route("/{id}/reaction", get(get_spot_reaction).put(set_spot_reaction))
}
