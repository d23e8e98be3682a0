use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::comments::{CommentNode, CommentRecord},
    threading::{
        capability::{AdvancedComment, BasicComment, ThreadedInput, ThreadingMode},
        observer::BuildObserver,
    },
};

const BASIC_REPLY_DEPTH: u32 = 1;

/// Result of one rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadForest {
    pub mode: ThreadingMode,
    pub roots: Vec<CommentNode>,
    /// Nodes reachable from `roots`, roots included.
    pub attached: usize,
    /// Input records that did not make it into the forest.
    pub dropped: usize,
}

/// Turns a flat, already ordered comment list into a forest.
///
/// Never fails: records that cannot be placed are left out and reported to
/// the observer.
pub fn build_forest(records: &[CommentRecord], observer: &dyn BuildObserver) -> ThreadForest {
    let input = ThreadedInput::classify(records);
    let mode = input.mode();
    observer.mode_selected(mode, input.len());

    let roots = match input {
        ThreadedInput::Advanced(items) => build_advanced(&items, observer),
        ThreadedInput::Basic(items) => build_basic(&items, observer),
        ThreadedInput::Flat(items) => items
            .iter()
            .map(|record| CommentNode::new(record.clone(), 0))
            .collect(),
    };

    let attached = roots.iter().map(CommentNode::subtree_len).sum::<usize>();
    observer.forest_built(mode, roots.len(), attached);

    ThreadForest {
        mode,
        roots,
        attached,
        dropped: records.len().saturating_sub(attached),
    }
}

fn build_advanced(items: &[AdvancedComment<'_>], observer: &dyn BuildObserver) -> Vec<CommentNode> {
    let index: HashMap<Uuid, usize> = items
        .iter()
        .enumerate()
        .map(|(pos, item)| (item.record.id, pos))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut root_positions = Vec::new();
    for (pos, item) in items.iter().enumerate() {
        match item.record.parent_id {
            None => root_positions.push(pos),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent_pos) => children[parent_pos].push(pos),
                None => observer.orphan_dropped(item.record.id, parent_id, ThreadingMode::Advanced),
            },
        }
    }

    let mut slots: Vec<Option<CommentNode>> = items
        .iter()
        .map(|item| Some(CommentNode::new(item.record.clone(), item.level)))
        .collect();

    root_positions
        .into_iter()
        .filter_map(|pos| assemble(pos, &mut slots, &children))
        .collect()
}

// Iterative post-order so deep threads cannot exhaust the stack. Records
// caught in a parent cycle are never reached from a root and stay behind.
fn assemble(
    root: usize,
    slots: &mut [Option<CommentNode>],
    children: &[Vec<usize>],
) -> Option<CommentNode> {
    let mut stack = vec![(root, false)];
    while let Some((pos, expanded)) = stack.pop() {
        if expanded {
            let mut node = slots[pos].take()?;
            for &child in &children[pos] {
                if let Some(child_node) = slots[child].take() {
                    node.push_child(child_node);
                }
            }
            slots[pos] = Some(node);
        } else {
            stack.push((pos, true));
            for &child in children[pos].iter().rev() {
                stack.push((child, false));
            }
        }
    }
    slots[root].take()
}

fn build_basic(items: &[BasicComment<'_>], observer: &dyn BuildObserver) -> Vec<CommentNode> {
    let mut replies_by_parent: HashMap<Uuid, Vec<&BasicComment<'_>>> = HashMap::new();
    for item in items {
        if let Some(parent_id) = item.parent_id {
            replies_by_parent.entry(parent_id).or_default().push(item);
        }
    }

    let roots: Vec<CommentNode> = items
        .iter()
        .filter(|item| item.parent_id.is_none())
        .map(|root| {
            let mut node = CommentNode::new(root.record.clone(), 0);
            for reply in replies_by_parent.remove(&root.record.id).unwrap_or_default() {
                let depth = reply.level.unwrap_or(BASIC_REPLY_DEPTH);
                node.push_child(CommentNode::new(reply.record.clone(), depth));
            }
            node
        })
        .collect();

    // Whatever is left points at a reply or at nothing; basic threading only
    // resolves root -> reply edges.
    for item in items {
        if let Some(parent_id) = item.parent_id {
            if replies_by_parent.contains_key(&parent_id) {
                observer.orphan_dropped(item.record.id, parent_id, ThreadingMode::Basic);
            }
        }
    }

    roots
}
