use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use blaxgram_types::models::{MessageSender, Reactions};

use crate::models::{MessageRow, NewMessage, SendMessageOutcome, ToggleReactionOutcome};
use crate::queries::chats::query_chat;
use crate::{Database, timestamp};

impl Database {
    // -- Messages --

    /// Insert a message from `new.user_id` and refresh the chat's
    /// last-message preview.
    pub fn send_message(&self, new: &NewMessage<'_>, now: DateTime<Utc>) -> Result<SendMessageOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_chat(&tx, new.chat_id)?.is_none() {
                return Ok(SendMessageOutcome::ChatNotFound);
            }
            if let Some(reply_to) = new.reply_to {
                let same_chat: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM messages WHERE id = ?1 AND chat_id = ?2",
                        params![reply_to, new.chat_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if same_chat.is_none() {
                    return Ok(SendMessageOutcome::ReplyNotFound);
                }
            }

            let sender_name = tx
                .query_row(
                    "SELECT name, last_name FROM users WHERE id = ?1",
                    [new.user_id],
                    |row| Ok(display_name(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?)),
                )
                .optional()?;

            tx.execute(
                "INSERT INTO messages (chat_id, user_id, text, sender, sender_name, time, date, type,
                                       file_name, file_size, gift_id, gift_data, reply_to, reactions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, '{}', ?14)",
                params![
                    new.chat_id,
                    new.user_id,
                    new.text,
                    MessageSender::Me.as_str(),
                    sender_name,
                    now.format("%H:%M").to_string(),
                    now.format("%Y-%m-%d").to_string(),
                    new.kind.as_str(),
                    new.file_name,
                    new.file_size,
                    new.gift_id,
                    new.gift_data,
                    new.reply_to,
                    timestamp(now)
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE chats SET last_message = ?1, last_message_time = ?2 WHERE id = ?3",
                params![new.kind.preview(new.text, new.file_name), timestamp(now), new.chat_id],
            )?;

            let message = query_message(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("message {} vanished after insert", id))?;
            tx.commit()?;
            Ok(SendMessageOutcome::Sent(message))
        })
    }

    /// One page of a chat's history in ascending order. `before` is an
    /// exclusive message-id cursor; the page holds the newest `limit`
    /// messages older than it.
    pub fn get_messages(&self, chat_id: i64, limit: u32, before: Option<i64>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages
                 WHERE chat_id = ?1 AND (?2 IS NULL OR id < ?2)
                 ORDER BY id DESC
                 LIMIT ?3",
                MessageRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt
                .query_map(params![chat_id, before, limit], MessageRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.reverse();
            Ok(rows)
        })
    }

    #[cfg(test)]
    pub(crate) fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    // -- Reactions --

    /// Toggle `username`'s `emoji` reaction on a message.
    pub fn toggle_reaction(&self, message_id: i64, emoji: &str, username: &str) -> Result<ToggleReactionOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let raw: Option<String> = tx
                .query_row("SELECT reactions FROM messages WHERE id = ?1", [message_id], |row| row.get(0))
                .optional()?;
            let Some(raw) = raw else {
                return Ok(ToggleReactionOutcome::MessageNotFound);
            };

            let mut reactions = Reactions::from_json(&raw);
            let added = reactions.toggle(emoji, username);

            tx.execute(
                "UPDATE messages SET reactions = ?1 WHERE id = ?2",
                params![reactions.to_json(), message_id],
            )?;
            tx.commit()?;
            Ok(ToggleReactionOutcome::Toggled { added, reactions })
        })
    }
}

/// "Name Last", or just "Name" when the last name is blank.
fn display_name(name: &str, last_name: &str) -> String {
    let last_name = last_name.trim();
    if last_name.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, last_name)
    }
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let sql = format!("SELECT {} FROM messages WHERE id = ?1", MessageRow::COLUMNS);
    let row = conn.query_row(&sql, [id], MessageRow::from_row).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateChatOutcome, NewChat, NewUser, RegisterOutcome, UserRow};
    use crate::queries::test_support::register;
    use blaxgram_types::models::{ChatType, MessageKind};

    fn setup() -> (Database, UserRow) {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@writer");
        let chat = NewChat {
            id: 42,
            chat_type: ChatType::Group,
            name: "Writers",
            username: None,
            avatar: "✍️",
            verified: false,
            created_by: user.id,
        };
        assert!(matches!(db.create_chat(&chat, Utc::now()).unwrap(), CreateChatOutcome::Created(_)));
        (db, user)
    }

    fn text(chat_id: i64, user_id: i64, text: &str) -> NewMessage<'_> {
        NewMessage {
            chat_id,
            user_id,
            text,
            kind: MessageKind::Text,
            file_name: None,
            file_size: None,
            gift_id: None,
            gift_data: None,
            reply_to: None,
        }
    }

    fn sent(outcome: SendMessageOutcome) -> MessageRow {
        match outcome {
            SendMessageOutcome::Sent(m) => m,
            other => panic!("expected Sent, got {other:?}"),
        }
    }

    #[test]
    fn send_updates_chat_preview() {
        let (db, user) = setup();

        let msg = sent(db.send_message(&text(42, user.id, "hello"), Utc::now()).unwrap());
        assert_eq!(msg.sender, "me");
        assert_eq!(msg.sender_name.as_deref(), Some("Test"));
        assert_eq!(msg.reactions, "{}");

        let file = NewMessage {
            kind: MessageKind::File,
            file_name: Some("notes.pdf"),
            file_size: Some("1.2 MB"),
            ..text(42, user.id, "")
        };
        sent(db.send_message(&file, Utc::now()).unwrap());

        let chat = db.get_chat(42).unwrap().unwrap();
        assert_eq!(chat.last_message.as_deref(), Some("📎 notes.pdf"));
    }

    #[test]
    fn sender_name_includes_last_name() {
        let (db, _) = setup();
        let RegisterOutcome::Created(full) = db
            .register_user(
                &NewUser { name: "Ada", last_name: "Lovelace", username: "@ada", phone: "" },
                Utc::now(),
            )
            .unwrap()
        else {
            panic!("@ada already taken");
        };

        let msg = sent(db.send_message(&text(42, full.id, "hi"), Utc::now()).unwrap());
        assert_eq!(msg.sender_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn send_to_unknown_chat_or_reply() {
        let (db, user) = setup();

        let outcome = db.send_message(&text(7, user.id, "hi"), Utc::now()).unwrap();
        assert!(matches!(outcome, SendMessageOutcome::ChatNotFound));

        let reply = NewMessage { reply_to: Some(999), ..text(42, user.id, "re") };
        let outcome = db.send_message(&reply, Utc::now()).unwrap();
        assert!(matches!(outcome, SendMessageOutcome::ReplyNotFound));

        let first = sent(db.send_message(&text(42, user.id, "first"), Utc::now()).unwrap());
        let reply = NewMessage { reply_to: Some(first.id), ..text(42, user.id, "re") };
        assert_eq!(sent(db.send_message(&reply, Utc::now()).unwrap()).reply_to, Some(first.id));
    }

    #[test]
    fn history_pages_backwards() {
        let (db, user) = setup();
        let ids: Vec<i64> = (0..5)
            .map(|i| sent(db.send_message(&text(42, user.id, &i.to_string()), Utc::now()).unwrap()).id)
            .collect();

        let all: Vec<i64> = db.get_messages(42, 50, None).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(all, ids);

        let page: Vec<i64> = db.get_messages(42, 2, None).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(page, ids[3..].to_vec());

        let older: Vec<i64> = db.get_messages(42, 2, Some(ids[3])).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(older, ids[1..3].to_vec());
    }

    #[test]
    fn reaction_toggle_persists() {
        let (db, user) = setup();
        let msg = sent(db.send_message(&text(42, user.id, "react"), Utc::now()).unwrap());

        match db.toggle_reaction(msg.id, "👍", "@writer").unwrap() {
            ToggleReactionOutcome::Toggled { added, reactions } => {
                assert!(added);
                assert_eq!(reactions.count("👍"), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        match db.toggle_reaction(msg.id, "👍", "@writer").unwrap() {
            ToggleReactionOutcome::Toggled { added, reactions } => {
                assert!(!added);
                assert_eq!(reactions, Reactions::default());
            }
            other => panic!("unexpected {other:?}"),
        }

        let stored = db.get_message(msg.id).unwrap().unwrap();
        assert_eq!(stored.reactions, "{}");

        assert!(matches!(
            db.toggle_reaction(12345, "👍", "@writer").unwrap(),
            ToggleReactionOutcome::MessageNotFound
        ));
    }
}
