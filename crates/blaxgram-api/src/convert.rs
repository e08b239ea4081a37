//! Row-to-response conversions. Corrupt stored values are logged and
//! replaced with defaults rather than failing the whole response.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use blaxgram_db::models::{BotRow, ChatRow, GiftLinkRow, MessageRow, UserGiftRow, UserRow, XostBotRow};
use blaxgram_db::parse_timestamp;
use blaxgram_types::api::{Bot, Chat, GiftLink, Message, User, UserGift, XostBot};
use blaxgram_types::models::{ChatType, MessageKind, MessageSender, Reactions, XostBotStatus};

fn ts(raw: &str, field: &str, owner: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt {} '{}' on {}", field, raw, owner);
        DateTime::default()
    })
}

fn opt_ts(raw: Option<&str>, field: &str, owner: &str) -> Option<DateTime<Utc>> {
    raw.map(|r| ts(r, field, owner))
}

fn variant<T: FromStr + Default>(raw: &str, owner: &str) -> T
where
    T::Err: std::fmt::Display,
{
    raw.parse().unwrap_or_else(|e| {
        warn!("{} on {}", e, owner);
        T::default()
    })
}

/// JSON payload column; `None` when absent or corrupt.
fn json_value(raw: Option<&str>) -> Option<Value> {
    raw.and_then(|r| serde_json::from_str(r).ok())
}

/// JSON list column; empty when corrupt.
fn json_list(raw: &str) -> Vec<Value> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn user(row: UserRow) -> User {
    let owner = format!("user {}", row.id);
    User {
        premium: opt_ts(row.premium_until.as_deref(), "premium_until", &owner),
        created_at: ts(&row.created_at, "created_at", &owner),
        id: row.id,
        name: row.name,
        last_name: row.last_name,
        username: row.username,
        phone: row.phone,
        bio: row.bio,
        stars: row.stars,
        two_fa_enabled: row.two_fa_enabled,
        avatar: row.avatar,
    }
}

pub fn user_gift(row: UserGiftRow) -> UserGift {
    UserGift {
        received_at: ts(&row.received_at, "received_at", &format!("user gift {}", row.id)),
        id: row.id,
        user_id: row.user_id,
        gift_id: row.gift_id,
        gift_name: row.gift_name,
        gift_icon: row.gift_icon,
        gift_price: row.gift_price,
    }
}

pub fn chat(row: ChatRow) -> Chat {
    let owner = format!("chat {}", row.id);
    // The CHECK constraint makes a bad type unreachable short of manual edits.
    let chat_type = ChatType::from_str(&row.chat_type).unwrap_or_else(|e| {
        warn!("{} on {}", e, owner);
        ChatType::Private
    });
    Chat {
        chat_type,
        last_message_time: opt_ts(row.last_message_time.as_deref(), "last_message_time", &owner),
        id: row.id,
        name: row.name,
        username: row.username,
        avatar: row.avatar,
        last_message: row.last_message,
        unread: row.unread,
        online: row.online,
        verified: row.verified,
        created_by: row.created_by,
        bot_id: row.bot_id,
    }
}

pub fn message(row: MessageRow) -> Message {
    let owner = format!("message {}", row.id);
    let sender = MessageSender::from_str(&row.sender).unwrap_or_else(|e| {
        warn!("{} on {}", e, owner);
        MessageSender::System
    });
    Message {
        sender,
        kind: variant::<MessageKind>(&row.kind, &owner),
        gift_data: json_value(row.gift_data.as_deref()),
        call_info: json_value(row.call_info.as_deref()),
        reactions: Reactions::from_json(&row.reactions),
        created_at: ts(&row.created_at, "created_at", &owner),
        id: row.id,
        chat_id: row.chat_id,
        user_id: row.user_id,
        text: row.text,
        sender_name: row.sender_name,
        time: row.time,
        date: row.date,
        file_name: row.file_name,
        file_size: row.file_size,
        gift_id: row.gift_id,
        star_reactions: row.star_reactions,
        edited: row.edited,
        reply_to: row.reply_to,
    }
}

pub fn bot(row: BotRow) -> Bot {
    Bot {
        commands: json_list(&row.commands),
        created_at: ts(&row.created_at, "created_at", &format!("bot {}", row.id)),
        id: row.id,
        name: row.name,
        username: row.username,
        description: row.description,
        token: row.token,
        chats: row.chats,
        users: row.users,
        created_by: row.created_by,
    }
}

pub fn gift_link(row: GiftLinkRow) -> GiftLink {
    let owner = format!("gift link {}", row.id);
    GiftLink {
        created_at: ts(&row.created_at, "created_at", &owner),
        expires_at: ts(&row.expires_at, "expires_at", &owner),
        activated_at: opt_ts(row.activated_at.as_deref(), "activated_at", &owner),
        id: row.id,
        code: row.code,
        created_by: row.created_by,
        created_by_username: row.created_by_username,
        activated_by: row.activated_by,
        activated_by_username: row.activated_by_username,
    }
}

pub fn xost_bot(row: XostBotRow) -> XostBot {
    let owner = format!("hosted bot {}", row.id);
    XostBot {
        status: variant::<XostBotStatus>(&row.status, &owner),
        created_at: ts(&row.created_at, "created_at", &owner),
        payment_deadline: opt_ts(row.payment_deadline.as_deref(), "payment_deadline", &owner),
        logs: json_list(&row.logs),
        id: row.id,
        token: row.token,
        language: row.language,
        code: row.code,
        name: row.name,
        requests: row.requests,
        uptime: row.uptime,
        ram: row.ram,
        user_id: row.user_id,
    }
}
