//! The reaction toggle: flip one (comment, user, kind) row, then recompute
//! that comment's tallies for the keyboard refresh. The check-then-act pair
//! in storage is racy by design — the unique constraint prevents duplicate
//! rows, and a retried toggle is self-correcting.

use anyhow::Result;

use sotto_db::Database;
use sotto_types::{ReactionKind, ReactionTally};

use crate::tally;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    /// Short acknowledgment shown in the callback toast.
    pub fn describe(&self, kind: ReactionKind) -> String {
        match self {
            ToggleOutcome::Added => format!("Added {kind}"),
            ToggleOutcome::Removed => format!("Removed {kind}"),
        }
    }
}

pub fn toggle(
    db: &Database,
    comment_id: i64,
    user_id: i64,
    kind: ReactionKind,
) -> Result<(ToggleOutcome, ReactionTally)> {
    let added = db.toggle_reaction(comment_id, user_id, kind)?;
    let outcome = if added { ToggleOutcome::Added } else { ToggleOutcome::Removed };

    // Fresh count across all users, never an in-place increment.
    let rows = db.reactions_for_comment(comment_id)?;
    Ok((outcome, tally::tally_one(&rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_comment() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let post_id = db.insert_post(1, "-100200", Some("p"), None, None).unwrap();
        let comment_id = db.insert_comment(post_id, None, Some("c"), None).unwrap();
        (db, comment_id)
    }

    #[test]
    fn single_toggle_moves_exactly_one_kind_by_one() {
        let (db, comment_id) = seeded_comment();

        let (outcome, tally) = toggle(&db, comment_id, 7, ReactionKind::Support).unwrap();
        assert_eq!(outcome, ToggleOutcome::Added);
        assert_eq!(tally.support, 1);
        assert_eq!(tally.total(), 1);
    }

    #[test]
    fn double_toggle_restores_the_original_tally() {
        let (db, comment_id) = seeded_comment();

        toggle(&db, comment_id, 7, ReactionKind::Love).unwrap();
        let (outcome, tally) = toggle(&db, comment_id, 7, ReactionKind::Love).unwrap();

        assert_eq!(outcome, ToggleOutcome::Removed);
        assert_eq!(tally, ReactionTally::default());
    }

    #[test]
    fn two_users_then_one_retraction() {
        let (db, comment_id) = seeded_comment();

        let (_, t1) = toggle(&db, comment_id, 1, ReactionKind::Love).unwrap();
        assert_eq!(t1.love, 1);
        let (_, t2) = toggle(&db, comment_id, 2, ReactionKind::Love).unwrap();
        assert_eq!(t2.love, 2);

        let (outcome, t3) = toggle(&db, comment_id, 1, ReactionKind::Love).unwrap();
        assert_eq!(outcome, ToggleOutcome::Removed);
        assert_eq!(t3.love, 1);
    }

    #[test]
    fn toast_text() {
        assert_eq!(ToggleOutcome::Added.describe(ReactionKind::Amen), "Added amen");
        assert_eq!(ToggleOutcome::Removed.describe(ReactionKind::Love), "Removed love");
    }
}
