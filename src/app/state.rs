use sqlx::PgPool;

use crate::{
    app::config::AppConfig,
    auth::jwt::JwtConfig,
    repositories::comments::PgCommentStore,
    threading::{SortStrategy, ThreadCache},
};

#[derive(Clone)]
pub struct AppState {
    pub comment_store: PgCommentStore,
    pub thread_cache: ThreadCache,
    pub jwt_config: JwtConfig,
    pub default_sort: SortStrategy,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        Self {
            comment_store: PgCommentStore::new(db),
            thread_cache: ThreadCache::new(config.cache_max_posts),
            jwt_config: JwtConfig::from_env(config.jwt_secret.clone()),
            default_sort: config.default_sort,
        }
    }
}
