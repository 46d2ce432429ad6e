use rusqlite::{Connection, params};

use crate::models::{ChatRow, ConfirmOutcome, InviteRow, ItemRow, MessageRow, UserRow};
use crate::{Database, Result, StoreError};

impl Database {
    // -- Users --

    pub fn upsert_user(
        &self,
        identity: &str,
        display_name: Option<&str>,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (identity, display_name, lat, lng) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(identity) DO UPDATE SET
                     display_name = excluded.display_name,
                     lat = excluded.lat,
                     lng = excluded.lng,
                     updated_at = datetime('now')",
                params![identity, display_name, lat, lng],
            )?;
            query_user(conn, identity)?
                .ok_or_else(|| StoreError::Internal("user missing after upsert".into()))
        })
    }

    pub fn get_user(&self, identity: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, identity))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT identity, display_name, lat, lng, updated_at FROM users",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Items --

    pub fn create_item(
        &self,
        id: &str,
        owner: &str,
        title: &str,
        tags_json: &str,
        condition: Option<f64>,
        price: f64,
        category: Option<&str>,
        price_band: Option<&str>,
    ) -> Result<ItemRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO items (id, owner, title, tags, condition, price, category, price_band)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, owner, title, tags_json, condition, price, category, price_band],
            )?;
            query_item(conn, id)?
                .ok_or_else(|| StoreError::Internal("item missing after insert".into()))
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| query_item(conn, id))
    }

    pub fn list_items(&self) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items"))?;
            let rows = stmt
                .query_map([], item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Keyword search over title and tags, optionally excluding one owner's
    /// listings.
    pub fn search_items(&self, keyword: &str, exclude_owner: Option<&str>) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE (title LIKE '%' || ?1 || '%' OR tags LIKE '%' || ?1 || '%')
                   AND (?2 IS NULL OR owner <> ?2)
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map(params![keyword, exclude_owner], item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Items persisted without a category or price band, for the startup
    /// backfill.
    pub fn items_missing_classification(&self) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE category IS NULL OR category = '' OR price_band IS NULL"
            ))?;
            let rows = stmt
                .query_map([], item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_item_classification(&self, id: &str, category: &str, price_band: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE items SET category = ?2, price_band = ?3 WHERE id = ?1",
                params![id, category, price_band],
            )?;
            Ok(())
        })
    }

    // -- Invites --

    /// Idempotent create. The partial unique index on the pending tuple
    /// makes the insert a no-op when a pending invite already exists, and
    /// the re-select returns that row. Returns `(row, created)`.
    pub fn create_invite(
        &self,
        id: &str,
        from: &str,
        to: &str,
        from_item: &str,
        to_item: &str,
    ) -> Result<(InviteRow, bool)> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO invites (id, from_identity, to_identity, from_item, to_item)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, from, to, from_item, to_item],
            )?;
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {INVITE_COLUMNS} FROM invites
                         WHERE from_identity = ?1 AND to_identity = ?2
                           AND from_item = ?3 AND to_item = ?4
                           AND status = 'pending'"
                    ),
                    params![from, to, from_item, to_item],
                    invite_from_row,
                )
                .optional()?
                .ok_or_else(|| StoreError::Internal("pending invite missing after insert".into()))?;
            Ok((row, inserted > 0))
        })
    }

    pub fn get_invite(&self, id: &str) -> Result<Option<InviteRow>> {
        self.with_conn(|conn| query_invite(conn, id))
    }

    pub fn invites_received(&self, identity: &str) -> Result<Vec<InviteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INVITE_COLUMNS} FROM invites
                 WHERE to_identity = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([identity], invite_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn invites_sent(&self, identity: &str) -> Result<Vec<InviteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INVITE_COLUMNS} FROM invites
                 WHERE from_identity = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([identity], invite_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// pending→accepted plus find-or-create of the linked chat, in one
    /// transaction. Accepting an already-accepted invite returns the
    /// existing chat; accepting a rejected invite is a Conflict.
    pub fn accept_invite(&self, invite_id: &str, new_chat_id: &str) -> Result<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let invite =
                query_invite(&tx, invite_id)?.ok_or(StoreError::NotFound)?;

            match invite.status.as_str() {
                "rejected" => return Err(StoreError::Conflict("invite was rejected")),
                "pending" => {
                    tx.execute(
                        "UPDATE invites SET status = 'accepted' WHERE id = ?1 AND status = 'pending'",
                        [invite_id],
                    )?;
                }
                _ => {}
            }

            let (member_a, member_b) = sorted_pair(&invite.from_identity, &invite.to_identity);

            tx.execute(
                "INSERT OR IGNORE INTO chats (id, member_a, member_b, from_item, to_item)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![new_chat_id, member_a, member_b, invite.from_item, invite.to_item],
            )?;

            let chat_id: String = tx.query_row(
                "SELECT id FROM chats
                 WHERE member_a = ?1 AND member_b = ?2
                   AND min(from_item, to_item) = min(?3, ?4)
                   AND max(from_item, to_item) = max(?3, ?4)",
                params![member_a, member_b, invite.from_item, invite.to_item],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(chat_id)
        })
    }

    /// No-op (success, no mutation) when the invite is already terminal.
    pub fn reject_invite(&self, invite_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM invites WHERE id = ?1",
                    [invite_id],
                    |row| row.get(0),
                )
                .optional()?;

            match status.as_deref() {
                None => Err(StoreError::NotFound),
                Some("pending") => {
                    conn.execute(
                        "UPDATE invites SET status = 'rejected' WHERE id = ?1 AND status = 'pending'",
                        [invite_id],
                    )?;
                    Ok(())
                }
                Some(_) => Ok(()),
            }
        })
    }

    // -- Chats --

    /// All chats the identity is a member of, newest first, each with its
    /// latest message fetched in the same query (no N+1).
    pub fn chats_for(&self, identity: &str) -> Result<Vec<(ChatRow, Option<MessageRow>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.member_a, c.member_b, c.from_item, c.to_item,
                        c.closed, c.closed_at, c.created_at,
                        m.id, m.sender, m.body, m.created_at
                 FROM chats c
                 LEFT JOIN chat_messages m
                   ON m.chat_id = c.id
                  AND m.rowid = (SELECT MAX(rowid) FROM chat_messages WHERE chat_id = c.id)
                 WHERE c.member_a = ?1 OR c.member_b = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC",
            )?;
            let rows = stmt
                .query_map([identity], |row| {
                    let chat = ChatRow {
                        id: row.get(0)?,
                        member_a: row.get(1)?,
                        member_b: row.get(2)?,
                        from_item: row.get(3)?,
                        to_item: row.get(4)?,
                        closed: row.get(5)?,
                        closed_at: row.get(6)?,
                        created_at: row.get(7)?,
                    };
                    let last = match row.get::<_, Option<String>>(8)? {
                        Some(message_id) => Some(MessageRow {
                            id: message_id,
                            chat_id: chat.id.clone(),
                            sender: row.get(9)?,
                            body: row.get(10)?,
                            created_at: row.get(11)?,
                        }),
                        None => None,
                    };
                    Ok((chat, last))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Chat state plus confirmation set plus the full message log in
    /// append order.
    pub fn read_chat(&self, chat_id: &str) -> Result<(ChatRow, Vec<String>, Vec<MessageRow>)> {
        self.with_conn(|conn| {
            let chat = query_chat(conn, chat_id)?.ok_or(StoreError::NotFound)?;
            let confirmations = query_confirmations(conn, chat_id)?;

            let mut stmt = conn.prepare(
                "SELECT id, chat_id, sender, body, created_at
                 FROM chat_messages
                 WHERE chat_id = ?1
                 ORDER BY rowid",
            )?;
            let messages = stmt
                .query_map([chat_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((chat, confirmations, messages))
        })
    }

    /// Append a message. The chat must exist, be open, and the sender must
    /// be a member.
    pub fn post_message(
        &self,
        chat_id: &str,
        id: &str,
        sender: &str,
        body: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let chat = query_chat(&tx, chat_id)?.ok_or(StoreError::NotFound)?;
            if chat.closed {
                return Err(StoreError::Forbidden("chat is closed"));
            }
            if sender != chat.member_a && sender != chat.member_b {
                return Err(StoreError::Forbidden("sender is not a chat member"));
            }

            tx.execute(
                "INSERT INTO chat_messages (id, chat_id, sender, body) VALUES (?1, ?2, ?3, ?4)",
                params![id, chat_id, sender, body],
            )?;
            let row = tx.query_row(
                "SELECT id, chat_id, sender, body, created_at FROM chat_messages WHERE id = ?1",
                [id],
                message_from_row,
            )?;

            tx.commit()?;
            Ok(row)
        })
    }

    /// Idempotent set-union of the confirmation; closes the chat exactly
    /// once when the set covers both members.
    pub fn confirm_done(&self, chat_id: &str, identity: &str) -> Result<ConfirmOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let chat = query_chat(&tx, chat_id)?.ok_or(StoreError::NotFound)?;
            if identity != chat.member_a && identity != chat.member_b {
                return Err(StoreError::Forbidden("not a chat member"));
            }

            tx.execute(
                "INSERT OR IGNORE INTO chat_confirmations (chat_id, identity) VALUES (?1, ?2)",
                params![chat_id, identity],
            )?;

            let confirmations = query_confirmations(&tx, chat_id)?;
            let all_confirmed = confirmations.iter().any(|c| c == &chat.member_a)
                && confirmations.iter().any(|c| c == &chat.member_b);

            if all_confirmed && !chat.closed {
                // Guarded UPDATE so closed_at is stamped only on the
                // transition, never re-stamped.
                tx.execute(
                    "UPDATE chats SET closed = 1, closed_at = datetime('now')
                     WHERE id = ?1 AND closed = 0",
                    [chat_id],
                )?;
            }

            let chat = query_chat(&tx, chat_id)?.ok_or(StoreError::NotFound)?;
            tx.commit()?;

            Ok(ConfirmOutcome {
                closed: chat.closed,
                confirmations,
                closed_at: chat.closed_at,
            })
        })
    }
}

const ITEM_COLUMNS: &str =
    "id, owner, title, tags, condition, price, category, price_band, rating, created_at";

const INVITE_COLUMNS: &str =
    "id, from_identity, to_identity, from_item, to_item, status, created_at";

fn sorted_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

fn query_user(conn: &Connection, identity: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT identity, display_name, lat, lng, updated_at FROM users WHERE identity = ?1",
    )?;
    let row = stmt.query_row([identity], user_from_row).optional()?;
    Ok(row)
}

fn query_item(conn: &Connection, id: &str) -> Result<Option<ItemRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"))?;
    let row = stmt.query_row([id], item_from_row).optional()?;
    Ok(row)
}

fn query_invite(conn: &Connection, id: &str) -> Result<Option<InviteRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVITE_COLUMNS} FROM invites WHERE id = ?1"
    ))?;
    let row = stmt.query_row([id], invite_from_row).optional()?;
    Ok(row)
}

fn query_chat(conn: &Connection, id: &str) -> Result<Option<ChatRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, member_a, member_b, from_item, to_item, closed, closed_at, created_at
         FROM chats WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], chat_from_row).optional()?;
    Ok(row)
}

fn query_confirmations(conn: &Connection, chat_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT identity FROM chat_confirmations WHERE chat_id = ?1 ORDER BY rowid")?;
    let rows = stmt
        .query_map([chat_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        identity: row.get(0)?,
        display_name: row.get(1)?,
        lat: row.get(2)?,
        lng: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        tags: row.get(3)?,
        condition: row.get(4)?,
        price: row.get(5)?,
        category: row.get(6)?,
        price_band: row.get(7)?,
        rating: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn invite_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InviteRow> {
    Ok(InviteRow {
        id: row.get(0)?,
        from_identity: row.get(1)?,
        to_identity: row.get(2)?,
        from_item: row.get(3)?,
        to_item: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn chat_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        member_a: row.get(1)?,
        member_b: row.get(2)?,
        from_item: row.get(3)?,
        to_item: row.get(4)?,
        closed: row.get(5)?,
        closed_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
