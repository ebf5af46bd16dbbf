use std::sync::Arc;

use crate::error::Result;
use axum::extract::FromRef;
use snapspot_auth::TokenManager;
use snapspot_dal::Pool;
use url::Url;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, tokens: TokenManager) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
                tokens,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn build_url(&self, relative_url: &str) -> Result<Url> {
        let base = &self.config().base_url;
        let url = base.join(relative_url)?;
        Ok(url)
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }
}

/// The `Garde` validation extractor requires the validation context `()` to be
/// available via `FromRef` from the application state.
impl FromRef<AppState> for () {
    fn from_ref(_: &AppState) -> Self {}
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    app_config: AppConfig,
}

pub struct AppConfig {
    pub base_url: Url,
    pub default_page_size: u32,
}
