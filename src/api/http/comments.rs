use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::state::AppState,
    auth::middleware::AuthUser,
    dto::comments::{CommentThreadResponse, CreateCommentRequest, CreateReplyRequest, ThreadQuery},
    error::AppError,
    threading::SortStrategy,
    usecases::comments::CommentService,
};

fn resolve_sort(state: &AppState, query: &ThreadQuery) -> Result<SortStrategy, AppError> {
    match query.sort.as_deref() {
        Some(value) => Ok(value.parse::<SortStrategy>()?),
        None => Ok(state.default_sort),
    }
}

pub async fn get_post_comments_handle(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<CommentThreadResponse>, AppError> {
    let sort = resolve_sort(&state, &query)?;
    let response =
        CommentService::get_thread(&state.comment_store, &state.thread_cache, post_id, sort)
            .await?;
    Ok(Json(response))
}

pub async fn create_post_comment_handle(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<ThreadQuery>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentThreadResponse>), AppError> {
    let sort = resolve_sort(&state, &query)?;
    let response = CommentService::create_top_level_comment(
        &state.comment_store,
        &state.thread_cache,
        post_id,
        auth_user.user_id,
        req,
        sort,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn create_comment_reply_handle(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ThreadQuery>,
    Json(req): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<CommentThreadResponse>), AppError> {
    let sort = resolve_sort(&state, &query)?;
    let response = CommentService::create_reply(
        &state.comment_store,
        &state.thread_cache,
        post_id,
        comment_id,
        auth_user.user_id,
        req,
        sort,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}
