use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::comments::{CommentNode, ReactionTally},
    threading::{PresentationHints, SortStrategy, ThreadingMode},
};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub content: String,
    pub reply_to_user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentAuthorResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyTargetResponse {
    pub user_id: Uuid,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentNodeResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: CommentAuthorResponse,
    pub reply_to: Option<ReplyTargetResponse>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub thread_level: Option<i32>,
    pub thread_path: Option<String>,
    pub depth: u32,
    pub reply_count: usize,
    pub reactions: Vec<ReactionTally>,
    pub is_pinned: bool,
    pub presentation: PresentationHints,
    pub replies: Vec<CommentNodeResponse>,
}

impl From<&CommentNode> for CommentNodeResponse {
    fn from(node: &CommentNode) -> Self {
        let record = &node.record;
        Self {
            id: record.id,
            post_id: record.post_id,
            parent_id: record.parent_id,
            author: CommentAuthorResponse {
                id: record.author_id,
                username: record.author_username.clone(),
                avatar_url: record.author_avatar_url.clone(),
            },
            reply_to: record.reply_to_user_id.map(|user_id| ReplyTargetResponse {
                user_id,
                username: record.reply_to_username.clone(),
            }),
            content: record.content.clone(),
            created_at: record.created_at,
            thread_level: record.thread_level,
            thread_path: record.thread_path.clone(),
            depth: node.depth,
            reply_count: node.reply_count,
            reactions: node.reactions.clone(),
            is_pinned: node.is_pinned,
            presentation: PresentationHints::for_depth(node.depth),
            replies: node.children.iter().map(CommentNodeResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentThreadResponse {
    pub post_id: Uuid,
    pub mode: ThreadingMode,
    pub sort: SortStrategy,
    /// Set when the store could not be reached and the last good thread is
    /// being served instead.
    pub stale: bool,
    pub total_comments: usize,
    pub built_at: DateTime<Utc>,
    pub comments: Vec<CommentNodeResponse>,
}
