use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::comments::CommentNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    Recent,
    #[default]
    Top,
    Controversial,
}

impl SortStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortStrategy::Recent => "recent",
            SortStrategy::Top => "top",
            SortStrategy::Controversial => "controversial",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortStrategy(pub String);

impl fmt::Display for UnknownSortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown comment sort '{}', expected recent, top or controversial",
            self.0
        )
    }
}

impl std::error::Error for UnknownSortStrategy {}

impl FromStr for SortStrategy {
    type Err = UnknownSortStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortStrategy::Recent),
            "top" => Ok(SortStrategy::Top),
            "controversial" => Ok(SortStrategy::Controversial),
            other => Err(UnknownSortStrategy(other.to_string())),
        }
    }
}

/// Orders top-level comments without touching the input. Replies keep the
/// order the builder gave them.
pub fn sort_roots(roots: &[CommentNode], strategy: SortStrategy) -> Vec<&CommentNode> {
    let mut ordered: Vec<&CommentNode> = roots.iter().collect();
    // `sort_by` is stable, equal keys keep their input order.
    ordered.sort_by(|a, b| compare(a, b, strategy));
    ordered
}

fn compare(a: &CommentNode, b: &CommentNode, strategy: SortStrategy) -> Ordering {
    match strategy {
        SortStrategy::Recent => newest_first(a, b),
        SortStrategy::Top => b
            .total_reactions()
            .cmp(&a.total_reactions())
            .then_with(|| newest_first(a, b)),
        SortStrategy::Controversial => b.controversy_score().cmp(&a.controversy_score()),
    }
}

fn newest_first(a: &CommentNode, b: &CommentNode) -> Ordering {
    b.record.created_at.cmp(&a.record.created_at)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::comments::{
        ReactionKind, ReactionTally,
        fixtures::{id, record},
    };

    fn node(n: u128, minute: u32) -> CommentNode {
        CommentNode::new(record(n, None, minute), 0)
    }

    fn with_reactions(mut node: CommentNode, reactions: &[(ReactionKind, u32)]) -> CommentNode {
        node.reactions = reactions
            .iter()
            .map(|&(kind, count)| ReactionTally { kind, count })
            .collect();
        node
    }

    fn ids(nodes: &[&CommentNode]) -> Vec<Uuid> {
        nodes.iter().map(|node| node.record.id).collect()
    }

    #[test]
    fn recent_is_reverse_chronological() {
        let roots = vec![node(1, 5), node(2, 30), node(3, 10)];
        let sorted = sort_roots(&roots, SortStrategy::Recent);
        assert_eq!(ids(&sorted), vec![id(2), id(3), id(1)]);
        assert_eq!(roots[0].record.id, id(1));
    }

    #[test]
    fn top_without_reactions_falls_back_to_recency() {
        let roots = vec![node(1, 5), node(2, 30), node(3, 10)];
        let top = sort_roots(&roots, SortStrategy::Top);
        let recent = sort_roots(&roots, SortStrategy::Recent);
        assert_eq!(ids(&top), ids(&recent));
    }

    #[test]
    fn controversial_without_reactions_keeps_input_order() {
        let roots = vec![node(1, 5), node(2, 30), node(3, 10)];
        let sorted = sort_roots(&roots, SortStrategy::Controversial);
        assert_eq!(ids(&sorted), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn top_ranks_by_reaction_total_then_recency() {
        let roots = vec![
            with_reactions(node(1, 1), &[(ReactionKind::Like, 2)]),
            with_reactions(node(2, 2), &[(ReactionKind::Love, 5)]),
            with_reactions(node(3, 3), &[(ReactionKind::Like, 1), (ReactionKind::Sad, 1)]),
            node(4, 4),
        ];
        let sorted = sort_roots(&roots, SortStrategy::Top);
        assert_eq!(ids(&sorted), vec![id(2), id(3), id(1), id(4)]);
    }

    #[test]
    fn controversial_ranks_sad_and_angry_only() {
        let roots = vec![
            with_reactions(node(1, 1), &[(ReactionKind::Like, 50)]),
            with_reactions(node(2, 2), &[(ReactionKind::Angry, 2)]),
            with_reactions(node(3, 3), &[(ReactionKind::Sad, 1), (ReactionKind::Angry, 2)]),
            with_reactions(node(4, 4), &[(ReactionKind::Sad, 2)]),
        ];
        let sorted = sort_roots(&roots, SortStrategy::Controversial);
        assert_eq!(ids(&sorted), vec![id(3), id(2), id(4), id(1)]);
    }

    #[test]
    fn sorting_leaves_children_untouched() {
        let mut parent = node(1, 1);
        parent.push_child(CommentNode::new(record(3, Some(1), 9), 1));
        parent.push_child(CommentNode::new(record(2, Some(1), 2), 1));
        let roots = vec![parent, node(4, 0)];
        let sorted = sort_roots(&roots, SortStrategy::Recent);
        let children: Vec<Uuid> = sorted[0].children.iter().map(|c| c.record.id).collect();
        assert_eq!(children, vec![id(3), id(2)]);
    }

    #[test]
    fn parses_known_strategies() {
        assert_eq!("recent".parse::<SortStrategy>(), Ok(SortStrategy::Recent));
        assert_eq!(" TOP ".parse::<SortStrategy>(), Ok(SortStrategy::Top));
        assert_eq!(
            "controversial".parse::<SortStrategy>(),
            Ok(SortStrategy::Controversial)
        );
        assert!("best".parse::<SortStrategy>().is_err());
        assert_eq!(SortStrategy::default(), SortStrategy::Top);
    }
}
