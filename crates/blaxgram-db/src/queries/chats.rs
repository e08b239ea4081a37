use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{ChatRow, CreateChatOutcome, NewChat};
use crate::queries::username_taken;
use crate::{Database, timestamp};

impl Database {
    // -- Chats --

    /// Create a chat, enrol its creator where the chat type has membership,
    /// and reserve the chat's public username.
    pub fn create_chat(&self, new: &NewChat<'_>, now: DateTime<Utc>) -> Result<CreateChatOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_chat(&tx, new.id)?.is_some() {
                return Ok(CreateChatOutcome::IdTaken);
            }
            if let Some(username) = new.username {
                if username_taken(&tx, username)? {
                    return Ok(CreateChatOutcome::UsernameTaken);
                }
            }

            tx.execute(
                "INSERT INTO chats (id, type, name, username, avatar, verified, created_by, last_message_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.id,
                    new.chat_type.as_str(),
                    new.name,
                    new.username,
                    new.avatar,
                    new.verified,
                    new.created_by,
                    timestamp(now)
                ],
            )?;

            if let Some(role) = new.creator_role() {
                tx.execute(
                    "INSERT INTO chat_participants (chat_id, user_id, role, joined_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![new.id, new.created_by, role.as_str(), timestamp(now)],
                )?;
            }

            if let Some(username) = new.username {
                tx.execute("INSERT INTO taken_usernames (username) VALUES (?1)", [username])?;
            }

            let chat = query_chat(&tx, new.id)?
                .ok_or_else(|| anyhow::anyhow!("chat {} vanished after insert", new.id))?;
            tx.commit()?;
            Ok(CreateChatOutcome::Created(chat))
        })
    }

    pub fn get_chat(&self, id: i64) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| query_chat(conn, id))
    }

    /// Chats visible to a user: those they participate in or created, plus
    /// every channel and bot chat. Most recently active first.
    pub fn get_chats_for_user(&self, user_id: i64) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM chats
                 WHERE id IN (SELECT chat_id FROM chat_participants WHERE user_id = ?1)
                    OR type IN ('channel', 'bot')
                    OR created_by = ?1
                 ORDER BY last_message_time IS NULL, last_message_time DESC, id",
                ChatRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], ChatRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn query_chat(conn: &Connection, id: i64) -> Result<Option<ChatRow>> {
    let sql = format!("SELECT {} FROM chats WHERE id = ?1", ChatRow::COLUMNS);
    let row = conn.query_row(&sql, [id], ChatRow::from_row).optional()?;
    Ok(row)
}
