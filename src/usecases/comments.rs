use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::comments::{
        CommentNodeResponse, CommentThreadResponse, CreateCommentRequest, CreateReplyRequest,
    },
    error::AppError,
    repositories::comments::{CommentStore, NewComment},
    telemetry::BusinessEvent,
    threading::{SortStrategy, ThreadCache, TracingObserver, cache::CachedThread, sort_roots},
};

pub struct CommentService;

const MIN_COMMENT_LENGTH: usize = 1;
const MAX_COMMENT_LENGTH: usize = 2000;

impl CommentService {
    /// Fetches, threads and orders the comments of a post.
    ///
    /// When the store fails and a previous build exists, that build is
    /// returned marked `stale` instead of the error.
    pub async fn get_thread<S: CommentStore>(
        store: &S,
        cache: &ThreadCache,
        post_id: Uuid,
        sort: SortStrategy,
    ) -> Result<CommentThreadResponse, AppError> {
        let records = match store.list_post_comments(post_id).await {
            Ok(records) => records,
            Err(err) if err.is_collaborator_failure() => {
                let Some(thread) = cache.last_known(post_id) else {
                    return Err(err);
                };
                warn!(%post_id, error = %err, "Serving last known comment thread");
                BusinessEvent::StaleThreadServed {
                    post_id,
                    built_at: thread.built_at.to_rfc3339(),
                }
                .log();
                return Ok(map_thread_response(post_id, &thread, sort, true));
            }
            Err(err) => return Err(err),
        };

        let thread = cache.get_or_build(post_id, records, &TracingObserver::for_post(post_id));
        Ok(map_thread_response(post_id, &thread, sort, false))
    }

    pub async fn create_top_level_comment<S: CommentStore>(
        store: &S,
        cache: &ThreadCache,
        post_id: Uuid,
        author_id: Uuid,
        req: CreateCommentRequest,
        sort: SortStrategy,
    ) -> Result<CommentThreadResponse, AppError> {
        let content = normalize_comment_content(&req.content)?;

        let created = store
            .create_comment(NewComment {
                post_id,
                author_id,
                content,
                parent_id: None,
                reply_to_user_id: None,
            })
            .await?;

        BusinessEvent::CommentCreated {
            comment_id: created.id,
            post_id,
            author_id,
        }
        .log();

        Self::get_thread(store, cache, post_id, sort).await
    }

    pub async fn create_reply<S: CommentStore>(
        store: &S,
        cache: &ThreadCache,
        post_id: Uuid,
        parent_id: Uuid,
        author_id: Uuid,
        req: CreateReplyRequest,
        sort: SortStrategy,
    ) -> Result<CommentThreadResponse, AppError> {
        let content = normalize_comment_content(&req.content)?;

        let created = store
            .create_comment(NewComment {
                post_id,
                author_id,
                content,
                parent_id: Some(parent_id),
                reply_to_user_id: req.reply_to_user_id,
            })
            .await?;

        BusinessEvent::ReplyCreated {
            comment_id: created.id,
            post_id,
            parent_id,
            author_id,
            reply_to_user_id: req.reply_to_user_id,
        }
        .log();

        Self::get_thread(store, cache, post_id, sort).await
    }
}

fn normalize_comment_content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    let len = trimmed.chars().count();
    if len < MIN_COMMENT_LENGTH {
        return Err(AppError::ValidationError(
            "Comment content is required".to_string(),
        ));
    }
    if len > MAX_COMMENT_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Comment content exceeds {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn map_thread_response(
    post_id: Uuid,
    thread: &CachedThread,
    sort: SortStrategy,
    stale: bool,
) -> CommentThreadResponse {
    CommentThreadResponse {
        post_id,
        mode: thread.forest.mode,
        sort,
        stale,
        total_comments: thread.forest.attached,
        built_at: thread.built_at,
        comments: sort_roots(&thread.forest.roots, sort)
            .into_iter()
            .map(CommentNodeResponse::from)
            .collect(),
    }
}
