use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Comment row as handed over by the persistence layer.
///
/// Threading columns are optional because older schemas do not carry them:
/// `parent_id` only exists once replies were introduced, `thread_level` and
/// `thread_path` only once unlimited nesting was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<Uuid>,
    pub reply_to_user_id: Option<Uuid>,
    pub thread_level: Option<i32>,
    pub thread_path: Option<String>,
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
    pub reply_to_username: Option<String>,
}

impl CommentRecord {
    pub fn has_thread_metadata(&self) -> bool {
        self.thread_level.is_some() && self.thread_path.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Wow,
    Sad,
    Angry,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionTally {
    pub kind: ReactionKind,
    pub count: u32,
}

/// A comment placed in its thread.
///
/// Nodes are rebuilt from the flat record list on every change and are never
/// patched in place. `reactions` and `is_pinned` have no backing storage yet
/// and stay empty / false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub record: CommentRecord,
    pub children: Vec<CommentNode>,
    pub reply_count: usize,
    pub depth: u32,
    pub reactions: Vec<ReactionTally>,
    pub is_pinned: bool,
}

impl CommentNode {
    pub fn new(record: CommentRecord, depth: u32) -> Self {
        Self {
            record,
            children: Vec::new(),
            reply_count: 0,
            depth,
            reactions: Vec::new(),
            is_pinned: false,
        }
    }

    pub fn push_child(&mut self, child: CommentNode) {
        self.children.push(child);
        self.reply_count = self.children.len();
    }

    pub fn total_reactions(&self) -> u64 {
        self.reactions
            .iter()
            .map(|tally| u64::from(tally.count))
            .sum()
    }

    pub fn controversy_score(&self) -> u64 {
        self.reactions
            .iter()
            .filter(|tally| matches!(tally.kind, ReactionKind::Angry | ReactionKind::Sad))
            .map(|tally| u64::from(tally.count))
            .sum()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }
}
