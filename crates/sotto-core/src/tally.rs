//! Reaction aggregation: raw (comment, user, kind) rows into per-comment
//! tallies. Counts always start from zero; kinds with no rows stay zero.

use std::collections::HashMap;

use tracing::warn;

use sotto_db::models::ReactionRow;
use sotto_types::ReactionTally;

/// Tallies for every comment that has at least one reaction. Comments with
/// no rows are simply absent — callers default them.
pub fn tally_by_comment(rows: &[ReactionRow]) -> HashMap<i64, ReactionTally> {
    let mut tallies: HashMap<i64, ReactionTally> = HashMap::new();
    for row in rows {
        match row.kind.parse() {
            Ok(kind) => tallies.entry(row.comment_id).or_default().bump(kind),
            // CHECK constraint should make this unreachable; tolerate anyway.
            Err(e) => warn!("Ignoring reaction row {}: {}", row.id, e),
        }
    }
    tallies
}

/// Tally for a single comment's rows.
pub fn tally_one(rows: &[ReactionRow]) -> ReactionTally {
    let mut tally = ReactionTally::default();
    for row in rows {
        match row.kind.parse() {
            Ok(kind) => tally.bump(kind),
            Err(e) => warn!("Ignoring reaction row {}: {}", row.id, e),
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, comment_id: i64, user_id: i64, kind: &str) -> ReactionRow {
        ReactionRow {
            id,
            comment_id,
            user_id,
            kind: kind.into(),
            created_at: "2026-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn kinds_count_independently_from_zero() {
        let rows = vec![
            row(1, 10, 1, "love"),
            row(2, 10, 2, "love"),
            row(3, 10, 1, "agree"),
            row(4, 11, 1, "amen"),
        ];
        let tallies = tally_by_comment(&rows);

        let ten = tallies[&10];
        assert_eq!(ten.love, 2);
        assert_eq!(ten.agree, 1);
        assert_eq!(ten.support, 0);
        assert_eq!(ten.amen, 0);
        assert_eq!(ten.disagree, 0);

        assert_eq!(tallies[&11].amen, 1);
        assert!(!tallies.contains_key(&12));
    }

    #[test]
    fn unknown_kind_rows_are_skipped() {
        let rows = vec![row(1, 10, 1, "love"), row(2, 10, 2, "sparkle")];
        assert_eq!(tally_one(&rows).total(), 1);
    }

    #[test]
    fn empty_rows_tally_to_zero() {
        assert_eq!(tally_one(&[]), ReactionTally::default());
        assert!(tally_by_comment(&[]).is_empty());
    }
}
