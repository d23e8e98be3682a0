use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::{
    models::comments::CommentRecord,
    threading::{
        builder::{ThreadForest, build_forest},
        observer::BuildObserver,
    },
};

pub const DEFAULT_MAX_CACHED_POSTS: usize = 1024;

#[derive(Debug)]
pub struct CachedThread {
    pub records: Vec<CommentRecord>,
    pub forest: ThreadForest,
    pub built_at: DateTime<Utc>,
}

/// Per-post memo of the last built forest.
///
/// A forest is rebuilt only when the record list it came from changes, and
/// the last good build stays around for when the store is unreachable.
#[derive(Clone)]
pub struct ThreadCache {
    entries: Arc<DashMap<Uuid, Arc<CachedThread>>>,
    max_posts: usize,
}

impl ThreadCache {
    pub fn new(max_posts: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_posts: max_posts.max(1),
        }
    }

    pub fn get_or_build(
        &self,
        post_id: Uuid,
        records: Vec<CommentRecord>,
        observer: &dyn BuildObserver,
    ) -> Arc<CachedThread> {
        if let Some(cached) = self.entries.get(&post_id) {
            if cached.records == records {
                return Arc::clone(cached.value());
            }
        }

        let forest = build_forest(&records, observer);
        let built = Arc::new(CachedThread {
            records,
            forest,
            built_at: Utc::now(),
        });

        // A slow fetch may finish after a newer one; it must not replace it.
        match self.entries.entry(post_id) {
            Entry::Occupied(mut entry) => {
                if freshness(&built.records) >= freshness(&entry.get().records) {
                    entry.insert(Arc::clone(&built));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&built));
            }
        }
        self.evict_overflow();
        built
    }

    pub fn last_known(&self, post_id: Uuid) -> Option<Arc<CachedThread>> {
        self.entries
            .get(&post_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn evict_overflow(&self) {
        while self.entries.len() > self.max_posts {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().built_at)
                .map(|entry| *entry.key());
            match oldest {
                Some(post_id) => {
                    self.entries.remove(&post_id);
                }
                None => break,
            }
        }
    }
}

// Comments are never edited or deleted, so a snapshot with a later newest
// comment, or more comments, is the more recent read.
fn freshness(records: &[CommentRecord]) -> (Option<DateTime<Utc>>, usize) {
    (
        records.iter().map(|record| record.created_at).max(),
        records.len(),
    )
}

impl Default for ThreadCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHED_POSTS)
    }
}
