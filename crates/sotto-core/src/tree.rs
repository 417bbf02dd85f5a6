//! Comment forest assembly. A flat, tallied comment set becomes an ordered
//! reply forest; presentation labels ("1", "1.1", …) come from a
//! depth-first walk over sibling order.

use std::collections::{HashMap, HashSet};

use sotto_types::{Comment, ReactionTally};

#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment: Comment,
    pub tally: ReactionTally,
    pub children: Vec<CommentNode>,
}

/// Group a post's comments into a forest. Roots are the comments with no
/// parent; sibling order is ascending creation time, ties broken by
/// ascending id. A comment whose parent id is not in the input set (e.g. it
/// referenced a since-deleted comment) is dropped along with its subtree —
/// tolerated inconsistency, not an error.
pub fn build_forest(
    mut comments: Vec<Comment>,
    tallies: &HashMap<i64, ReactionTally>,
) -> Vec<CommentNode> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let ids: HashSet<i64> = comments.iter().map(|c| c.id).collect();
    let mut by_parent: HashMap<Option<i64>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = comment.parent_comment_id {
            if !ids.contains(&parent) {
                continue;
            }
        }
        by_parent.entry(comment.parent_comment_id).or_default().push(comment);
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    roots
        .into_iter()
        .map(|c| attach(c, &mut by_parent, tallies))
        .collect()
}

fn attach(
    comment: Comment,
    by_parent: &mut HashMap<Option<i64>, Vec<Comment>>,
    tallies: &HashMap<i64, ReactionTally>,
) -> CommentNode {
    let children = by_parent
        .remove(&Some(comment.id))
        .unwrap_or_default()
        .into_iter()
        .map(|c| attach(c, by_parent, tallies))
        .collect();

    CommentNode {
        tally: tallies.get(&comment.id).copied().unwrap_or_default(),
        comment,
        children,
    }
}

/// Depth-first flattening with hierarchical labels: sibling index (1-based)
/// appended to the parent's label with a `.` separator.
pub fn labeled(forest: &[CommentNode]) -> Vec<(String, &CommentNode)> {
    fn walk<'a>(
        nodes: &'a [CommentNode],
        prefix: &str,
        out: &mut Vec<(String, &'a CommentNode)>,
    ) {
        for (i, node) in nodes.iter().enumerate() {
            let label = if prefix.is_empty() {
                (i + 1).to_string()
            } else {
                format!("{prefix}.{}", i + 1)
            };
            out.push((label.clone(), node));
            walk(&node.children, &label, out);
        }
    }

    let mut out = Vec::new();
    walk(forest, "", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn comment(id: i64, parent: Option<i64>, secs: i64) -> Comment {
        Comment {
            id,
            post_id: 1,
            parent_comment_id: parent,
            content: Some(format!("c{id}")),
            media: None,
            created_at: at(secs),
        }
    }

    fn forest(comments: Vec<Comment>) -> Vec<CommentNode> {
        build_forest(comments, &HashMap::new())
    }

    #[test]
    fn children_are_exactly_the_comments_naming_the_parent() {
        let nodes = forest(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(1), 2),
            comment(4, None, 3),
        ]);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].comment.id, 1);
        let child_ids: Vec<i64> = nodes[0].children.iter().map(|n| n.comment.id).collect();
        assert_eq!(child_ids, [2, 3]);
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn sibling_order_is_creation_time_then_id() {
        // Same timestamp for 12 and 3 — id breaks the tie. 9 is oldest.
        let nodes = forest(vec![
            comment(12, None, 5),
            comment(3, None, 5),
            comment(9, None, 1),
        ]);
        let ids: Vec<i64> = nodes.iter().map(|n| n.comment.id).collect();
        assert_eq!(ids, [9, 3, 12]);
    }

    #[test]
    fn dangling_parent_drops_comment_and_its_subtree() {
        let nodes = forest(vec![
            comment(1, None, 0),
            comment(2, Some(99), 1), // parent never existed in this set
            comment(3, Some(2), 2),  // subtree of the orphan goes with it
        ]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].comment.id, 1);
        assert!(nodes[0].children.is_empty());
    }

    #[test]
    fn chain_labels() {
        let nodes = forest(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ]);
        let labels: Vec<String> = labeled(&nodes).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["1", "1.1", "1.1.1"]);
    }

    #[test]
    fn sibling_labels() {
        let nodes = forest(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(1), 2),
            comment(4, None, 3),
        ]);
        let labels: Vec<String> = labeled(&nodes).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["1", "1.1", "1.2", "2"]);
    }

    #[test]
    fn tallies_are_carried_onto_nodes() {
        let mut tallies = HashMap::new();
        let mut tally = ReactionTally::default();
        tally.bump(sotto_types::ReactionKind::Love);
        tallies.insert(1, tally);

        let nodes = build_forest(vec![comment(1, None, 0), comment(2, None, 1)], &tallies);
        assert_eq!(nodes[0].tally.love, 1);
        assert_eq!(nodes[1].tally, ReactionTally::default());
    }
}
