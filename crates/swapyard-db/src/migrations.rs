use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            identity      TEXT PRIMARY KEY,
            display_name  TEXT,
            lat           REAL,
            lng           REAL,
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS items (
            id          TEXT PRIMARY KEY,
            owner       TEXT NOT NULL REFERENCES users(identity),
            title       TEXT NOT NULL,
            tags        TEXT NOT NULL DEFAULT '[]',
            condition   REAL,
            price       REAL NOT NULL,
            category    TEXT,
            price_band  TEXT,
            rating      REAL NOT NULL DEFAULT 2.5,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_items_owner
            ON items(owner);

        CREATE TABLE IF NOT EXISTS invites (
            id             TEXT PRIMARY KEY,
            from_identity  TEXT NOT NULL REFERENCES users(identity),
            to_identity    TEXT NOT NULL REFERENCES users(identity),
            from_item      TEXT NOT NULL REFERENCES items(id),
            to_item        TEXT NOT NULL REFERENCES items(id),
            status         TEXT NOT NULL DEFAULT 'pending',
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- At most one PENDING invite per exact tuple; insert-if-absent
        -- rides on this index.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_invites_pending
            ON invites(from_identity, to_identity, from_item, to_item)
            WHERE status = 'pending';

        CREATE INDEX IF NOT EXISTS idx_invites_to
            ON invites(to_identity, created_at);

        CREATE TABLE IF NOT EXISTS chats (
            id          TEXT PRIMARY KEY,
            member_a    TEXT NOT NULL REFERENCES users(identity),
            member_b    TEXT NOT NULL REFERENCES users(identity),
            from_item   TEXT NOT NULL REFERENCES items(id),
            to_item     TEXT NOT NULL REFERENCES items(id),
            closed      INTEGER NOT NULL DEFAULT 0,
            closed_at   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Find-or-create key: the member pair is stored sorted and the item
        -- pair is normalized in the index, so a mirrored invite reuses the
        -- same chat.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_key
            ON chats(member_a, member_b, min(from_item, to_item), max(from_item, to_item));

        CREATE TABLE IF NOT EXISTS chat_messages (
            id          TEXT PRIMARY KEY,
            chat_id     TEXT NOT NULL REFERENCES chats(id),
            sender      TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_chat
            ON chat_messages(chat_id);

        CREATE TABLE IF NOT EXISTS chat_confirmations (
            chat_id     TEXT NOT NULL REFERENCES chats(id),
            identity    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(chat_id, identity)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
