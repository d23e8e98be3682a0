use tracing::{debug, warn};
use uuid::Uuid;

use crate::threading::capability::ThreadingMode;

/// Hook the builder reports to while it works.
///
/// Every method has an empty default so callers only implement what they
/// care about.
pub trait BuildObserver {
    fn mode_selected(&self, _mode: ThreadingMode, _record_count: usize) {}

    fn orphan_dropped(&self, _comment_id: Uuid, _parent_id: Uuid, _mode: ThreadingMode) {}

    fn forest_built(&self, _mode: ThreadingMode, _roots: usize, _attached: usize) {}
}

/// Forwards reports to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver {
    pub post_id: Option<Uuid>,
}

impl TracingObserver {
    pub fn for_post(post_id: Uuid) -> Self {
        Self {
            post_id: Some(post_id),
        }
    }
}

impl BuildObserver for TracingObserver {
    fn mode_selected(&self, mode: ThreadingMode, record_count: usize) {
        debug!(
            post_id = ?self.post_id,
            mode = mode.as_str(),
            records = record_count,
            "Comment threading mode selected"
        );
    }

    fn orphan_dropped(&self, comment_id: Uuid, parent_id: Uuid, mode: ThreadingMode) {
        warn!(
            post_id = ?self.post_id,
            %comment_id,
            %parent_id,
            mode = mode.as_str(),
            "Reply dropped from thread: parent not attachable"
        );
    }

    fn forest_built(&self, mode: ThreadingMode, roots: usize, attached: usize) {
        debug!(
            post_id = ?self.post_id,
            mode = mode.as_str(),
            roots,
            attached,
            "Comment forest built"
        );
    }
}
