use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum BusinessEvent {
    CommentCreated {
        comment_id: Uuid,
        post_id: Uuid,
        author_id: Uuid,
    },
    ReplyCreated {
        comment_id: Uuid,
        post_id: Uuid,
        parent_id: Uuid,
        author_id: Uuid,
        reply_to_user_id: Option<Uuid>,
    },
    StaleThreadServed {
        post_id: Uuid,
        built_at: String,
    },
}

impl BusinessEvent {
    pub fn log(&self) {
        let event_json = serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self));
        info!(
            target: "business_events",
            event = %event_json,
            "Business event occurred"
        );
    }
}
