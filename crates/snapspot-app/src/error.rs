use axum::response::{IntoResponse, Response};
use http::StatusCode;
use snapspot_dal::SqlxError;
use tracing::error;

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting update of {0}")]
    Conflict(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Insufficient rights")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[source] snapspot_dal::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<snapspot_dal::Error> for ApiError {
    fn from(e: snapspot_dal::Error) -> Self {
        use snapspot_dal::Error as DalError;
        match e {
            DalError::RecordNotFound(what) => ApiError::NotFound(what),
            DalError::DatabaseError(SqlxError::RowNotFound) => {
                ApiError::NotFound("Record".to_string())
            }
            DalError::FailedUpdate { id, version } => {
                ApiError::Conflict(format!("record {id} with version {version}"))
            }
            DalError::MissingVersion => {
                ApiError::InvalidQuery("version is required for update".to_string())
            }
            DalError::InvalidOrderByField(field) => {
                ApiError::InvalidQuery(format!("cannot order by {field}"))
            }
            DalError::InvalidCredentials => ApiError::Unauthorized,
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("API error: {self}");
        }
        (status, self.to_string()).into_response()
    }
}
