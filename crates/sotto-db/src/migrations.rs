use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS posts (
            id                  INTEGER PRIMARY KEY,
            external_message_id INTEGER NOT NULL UNIQUE,
            chat_ref            TEXT NOT NULL,
            content             TEXT,
            media_kind          TEXT,
            media_ref           TEXT,
            topic_ref           INTEGER,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS comments (
            id                  INTEGER PRIMARY KEY,
            post_id             INTEGER NOT NULL
                                REFERENCES posts(id) ON DELETE CASCADE,
            parent_comment_id   INTEGER
                                REFERENCES comments(id) ON DELETE CASCADE,
            content             TEXT,
            media_kind          TEXT,
            media_ref           TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        CREATE TABLE IF NOT EXISTS reactions (
            id          INTEGER PRIMARY KEY,
            comment_id  INTEGER NOT NULL
                        REFERENCES comments(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL,
            kind        TEXT NOT NULL
                        CHECK (kind IN ('love','support','amen','agree','disagree')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(comment_id, user_id, kind)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_comment
            ON reactions(comment_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
