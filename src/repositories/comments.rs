use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::AppError, models::comments::CommentRecord, telemetry::database::is_undefined_column,
};

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub reply_to_user_id: Option<Uuid>,
}

/// Where comments live. The thread core only reads flat lists from it and
/// hands it new comments; it never looks behind it.
pub trait CommentStore: Send + Sync {
    /// Every comment of one post, ordered by thread path when the store
    /// has one, otherwise by creation time.
    fn list_post_comments(
        &self,
        post_id: Uuid,
    ) -> impl Future<Output = Result<Vec<CommentRecord>, AppError>> + Send;

    fn create_comment(
        &self,
        new_comment: NewComment,
    ) -> impl Future<Output = Result<CommentRecord, AppError>> + Send;
}

/// Column sets the comments table has carried over its migrations, richest
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum CommentSchema {
    Threaded = 0,
    Replies = 1,
    Legacy = 2,
}

impl CommentSchema {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CommentSchema::Threaded,
            1 => CommentSchema::Replies,
            _ => CommentSchema::Legacy,
        }
    }

    pub(crate) fn older(self) -> Option<Self> {
        match self {
            CommentSchema::Threaded => Some(CommentSchema::Replies),
            CommentSchema::Replies => Some(CommentSchema::Legacy),
            CommentSchema::Legacy => None,
        }
    }

    fn query_name(self) -> &'static str {
        match self {
            CommentSchema::Threaded => "comments.list_post_comments.threaded",
            CommentSchema::Replies => "comments.list_post_comments.replies",
            CommentSchema::Legacy => "comments.list_post_comments.legacy",
        }
    }

    pub(crate) fn list_sql(self) -> String {
        let (threading_columns, reply_join, order_by) = match self {
            CommentSchema::Threaded => (
                "c.parent_id, c.reply_to_user_id, c.thread_level, c.thread_path, \
                 rp.username AS reply_to_username",
                "LEFT JOIN public.profiles rp ON rp.id = c.reply_to_user_id",
                "c.thread_path ASC NULLS LAST, c.created_at ASC",
            ),
            CommentSchema::Replies => (
                "c.parent_id, c.reply_to_user_id, NULL::int4 AS thread_level, \
                 NULL::text AS thread_path, rp.username AS reply_to_username",
                "LEFT JOIN public.profiles rp ON rp.id = c.reply_to_user_id",
                "c.created_at ASC",
            ),
            CommentSchema::Legacy => (
                "NULL::uuid AS parent_id, NULL::uuid AS reply_to_user_id, \
                 NULL::int4 AS thread_level, NULL::text AS thread_path, \
                 NULL::text AS reply_to_username",
                "",
                "c.created_at ASC",
            ),
        };

        format!(
            r#"
            SELECT
                c.id,
                c.post_id,
                c.user_id AS author_id,
                c.content,
                c.created_at,
                {threading_columns},
                p.username AS author_username,
                p.avatar_url AS author_avatar_url
            FROM public.comments c
            LEFT JOIN public.profiles p ON p.id = c.user_id
            {reply_join}
            WHERE c.post_id = $1
            ORDER BY {order_by}
            "#
        )
    }
}

/// Shape to retry with after `error`, or `None` when the error is final.
pub(crate) fn schema_after_error(
    error: &sqlx::Error,
    schema: CommentSchema,
) -> Option<CommentSchema> {
    if is_undefined_column(error) {
        schema.older()
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertPlan {
    Threaded,
    Legacy,
    RejectReply,
}

/// Legacy tables have no `parent_id`, so a reply cannot be stored there.
pub(crate) fn insert_plan(schema: CommentSchema, is_reply: bool) -> InsertPlan {
    match (schema, is_reply) {
        (CommentSchema::Legacy, true) => InsertPlan::RejectReply,
        (CommentSchema::Legacy, false) => InsertPlan::Legacy,
        (CommentSchema::Threaded | CommentSchema::Replies, _) => InsertPlan::Threaded,
    }
}

/// Column set last seen working, shared by every clone of the store.
#[derive(Debug, Clone)]
pub(crate) struct SchemaMemory(Arc<AtomicU8>);

impl SchemaMemory {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(CommentSchema::Threaded as u8)))
    }

    pub(crate) fn current(&self) -> CommentSchema {
        CommentSchema::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn remember(&self, schema: CommentSchema) {
        self.0.store(schema as u8, Ordering::Relaxed);
    }

    /// Runs `attempt` from the remembered shape downwards until one does not
    /// hit a missing column, then remembers that shape.
    pub(crate) async fn probe<T, F, Fut>(&self, mut attempt: F) -> Result<T, sqlx::Error>
    where
        F: FnMut(CommentSchema) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut schema = self.current();
        loop {
            match attempt(schema).await {
                Ok(value) => {
                    self.remember(schema);
                    return Ok(value);
                }
                Err(err) => match schema_after_error(&err, schema) {
                    Some(older) => {
                        debug!(from = ?schema, to = ?older, "Comment columns missing, retrying with older schema");
                        schema = older;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

/// Postgres-backed store. Probes the richest column set first and remembers
/// the one that worked.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
    schema: SchemaMemory,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema: SchemaMemory::new(),
        }
    }

    async fn ensure_post_exists(&self, post_id: Uuid) -> Result<(), AppError> {
        crate::log_query_fetch_optional!(
            "comments.ensure_post_exists",
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM public.posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&self.pool)
        )?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        Ok(())
    }

    async fn ensure_parent_in_post(&self, post_id: Uuid, parent_id: Uuid) -> Result<(), AppError> {
        let parent_post_id = crate::log_query_fetch_optional!(
            "comments.parent_post_id",
            sqlx::query_scalar::<_, Uuid>("SELECT post_id FROM public.comments WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(&self.pool)
        )?
        .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

        if parent_post_id != post_id {
            return Err(AppError::ValidationError(
                "Parent comment does not belong to this post".to_string(),
            ));
        }
        Ok(())
    }

    async fn insert_with_threading(
        &self,
        new_comment: &NewComment,
    ) -> Result<(Uuid, DateTime<Utc>), sqlx::Error> {
        crate::log_query_fetch_one!(
            "comments.insert_comment",
            sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
                r#"
                INSERT INTO public.comments (post_id, user_id, content, parent_id, reply_to_user_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, created_at
                "#,
            )
            .bind(new_comment.post_id)
            .bind(new_comment.author_id)
            .bind(&new_comment.content)
            .bind(new_comment.parent_id)
            .bind(new_comment.reply_to_user_id)
            .fetch_one(&self.pool)
        )
    }

    async fn insert_legacy(
        &self,
        new_comment: &NewComment,
    ) -> Result<(Uuid, DateTime<Utc>), sqlx::Error> {
        crate::log_query_fetch_one!(
            "comments.insert_comment.legacy",
            sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
                r#"
                INSERT INTO public.comments (post_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, created_at
                "#,
            )
            .bind(new_comment.post_id)
            .bind(new_comment.author_id)
            .bind(&new_comment.content)
            .fetch_one(&self.pool)
        )
    }
}

impl CommentStore for PgCommentStore {
    async fn list_post_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, AppError> {
        let rows = self
            .schema
            .probe(|schema| async move {
                let sql = schema.list_sql();
                crate::log_query_fetch_all!(
                    schema.query_name(),
                    sqlx::query_as::<_, CommentRecord>(&sql)
                        .bind(post_id)
                        .fetch_all(&self.pool)
                )
            })
            .await?;
        Ok(rows)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentRecord, AppError> {
        self.ensure_post_exists(new_comment.post_id).await?;
        if let Some(parent_id) = new_comment.parent_id {
            self.ensure_parent_in_post(new_comment.post_id, parent_id)
                .await?;
        }

        let is_reply = new_comment.parent_id.is_some();
        let mut schema = self.schema.current();
        let (id, created_at) = loop {
            match insert_plan(schema, is_reply) {
                InsertPlan::RejectReply => {
                    return Err(AppError::ValidationError(
                        "Replies are not supported for this post".to_string(),
                    ));
                }
                InsertPlan::Legacy => break self.insert_legacy(&new_comment).await?,
                InsertPlan::Threaded => match self.insert_with_threading(&new_comment).await {
                    Ok(row) => break row,
                    // Both richer shapes share the insert columns, so a
                    // missing one means the table is legacy.
                    Err(err) if is_undefined_column(&err) => {
                        schema = CommentSchema::Legacy;
                        self.schema.remember(schema);
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        };

        Ok(CommentRecord {
            id,
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            content: new_comment.content,
            created_at,
            parent_id: new_comment.parent_id,
            reply_to_user_id: new_comment.reply_to_user_id,
            thread_level: None,
            thread_path: None,
            author_username: None,
            author_avatar_url: None,
            reply_to_username: None,
        })
    }
}
