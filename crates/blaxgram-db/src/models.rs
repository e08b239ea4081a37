//! Database row types. These map directly to SQLite rows.
//! Distinct from blaxgram-types API models to keep the DB layer independent.
use chrono::{DateTime, Utc};
use rusqlite::Row;

use blaxgram_types::models::{ChatType, MessageKind, ParticipantRole, Reactions};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub phone: String,
    pub bio: String,
    pub stars: i64,
    pub premium_until: Option<String>,
    pub two_fa_enabled: bool,
    pub two_fa_password: Option<String>,
    pub avatar: String,
    pub created_at: String,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str = "id, name, last_name, username, phone, bio, stars, \
        premium_until, two_fa_enabled, two_fa_password, avatar, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            last_name: row.get(2)?,
            username: row.get(3)?,
            phone: row.get(4)?,
            bio: row.get(5)?,
            stars: row.get(6)?,
            premium_until: row.get(7)?,
            two_fa_enabled: row.get(8)?,
            two_fa_password: row.get(9)?,
            avatar: row.get(10)?,
            created_at: row.get(11)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChatRow {
    pub id: i64,
    pub chat_type: String,
    pub name: String,
    pub username: Option<String>,
    pub avatar: String,
    pub last_message: Option<String>,
    pub last_message_time: Option<String>,
    pub unread: i64,
    pub online: bool,
    pub verified: bool,
    pub created_by: Option<i64>,
    pub bot_id: Option<String>,
}

impl ChatRow {
    pub(crate) const COLUMNS: &'static str = "id, type, name, username, avatar, last_message, \
        last_message_time, unread, online, verified, created_by, bot_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chat_type: row.get(1)?,
            name: row.get(2)?,
            username: row.get(3)?,
            avatar: row.get(4)?,
            last_message: row.get(5)?,
            last_message_time: row.get(6)?,
            unread: row.get(7)?,
            online: row.get(8)?,
            verified: row.get(9)?,
            created_by: row.get(10)?,
            bot_id: row.get(11)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub text: String,
    pub sender: String,
    pub sender_name: Option<String>,
    pub time: String,
    pub date: String,
    pub kind: String,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub gift_id: Option<i64>,
    pub gift_data: Option<String>,
    pub reactions: String,
    pub star_reactions: i64,
    pub edited: bool,
    pub reply_to: Option<i64>,
    pub call_info: Option<String>,
    pub created_at: String,
}

impl MessageRow {
    pub(crate) const COLUMNS: &'static str = "id, chat_id, user_id, text, sender, sender_name, \
        time, date, type, file_name, file_size, gift_id, gift_data, reactions, star_reactions, \
        edited, reply_to, call_info, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            user_id: row.get(2)?,
            text: row.get(3)?,
            sender: row.get(4)?,
            sender_name: row.get(5)?,
            time: row.get(6)?,
            date: row.get(7)?,
            kind: row.get(8)?,
            file_name: row.get(9)?,
            file_size: row.get(10)?,
            gift_id: row.get(11)?,
            gift_data: row.get(12)?,
            reactions: row.get(13)?,
            star_reactions: row.get(14)?,
            edited: row.get(15)?,
            reply_to: row.get(16)?,
            call_info: row.get(17)?,
            created_at: row.get(18)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BotRow {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: String,
    pub token: String,
    pub commands: String,
    pub chats: i64,
    pub users: i64,
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl BotRow {
    pub(crate) const COLUMNS: &'static str =
        "id, name, username, description, token, commands, chats, users, created_by, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            username: row.get(2)?,
            description: row.get(3)?,
            token: row.get(4)?,
            commands: row.get(5)?,
            chats: row.get(6)?,
            users: row.get(7)?,
            created_by: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GiftLinkRow {
    pub id: String,
    pub code: String,
    pub created_by: i64,
    pub created_by_username: String,
    pub created_at: String,
    pub expires_at: String,
    pub activated_by: Option<i64>,
    pub activated_by_username: Option<String>,
    pub activated_at: Option<String>,
}

impl GiftLinkRow {
    pub(crate) const COLUMNS: &'static str = "id, code, created_by, created_by_username, \
        created_at, expires_at, activated_by, activated_by_username, activated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            created_by: row.get(2)?,
            created_by_username: row.get(3)?,
            created_at: row.get(4)?,
            expires_at: row.get(5)?,
            activated_by: row.get(6)?,
            activated_by_username: row.get(7)?,
            activated_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct XostBotRow {
    pub id: String,
    pub token: String,
    pub language: String,
    pub code: String,
    pub name: String,
    pub status: String,
    pub created_at: String,
    pub requests: i64,
    pub uptime: String,
    pub ram: String,
    pub payment_deadline: Option<String>,
    pub logs: String,
    pub user_id: Option<i64>,
}

impl XostBotRow {
    pub(crate) const COLUMNS: &'static str = "id, token, language, code, name, status, \
        created_at, requests, uptime, ram, payment_deadline, logs, user_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            token: row.get(1)?,
            language: row.get(2)?,
            code: row.get(3)?,
            name: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
            requests: row.get(7)?,
            uptime: row.get(8)?,
            ram: row.get(9)?,
            payment_deadline: row.get(10)?,
            logs: row.get(11)?,
            user_id: row.get(12)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UserGiftRow {
    pub id: i64,
    pub user_id: i64,
    pub gift_id: i64,
    pub gift_name: String,
    pub gift_icon: String,
    pub gift_price: i64,
    pub received_at: String,
}

impl UserGiftRow {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, gift_id, gift_name, gift_icon, gift_price, received_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            gift_id: row.get(2)?,
            gift_name: row.get(3)?,
            gift_icon: row.get(4)?,
            gift_price: row.get(5)?,
            received_at: row.get(6)?,
        })
    }
}

// -- Inserts --

pub struct NewUser<'a> {
    pub name: &'a str,
    pub last_name: &'a str,
    pub username: &'a str,
    pub phone: &'a str,
}

pub struct NewChat<'a> {
    pub id: i64,
    pub chat_type: ChatType,
    pub name: &'a str,
    pub username: Option<&'a str>,
    pub avatar: &'a str,
    pub verified: bool,
    pub created_by: i64,
}

impl NewChat<'_> {
    pub fn creator_role(&self) -> Option<ParticipantRole> {
        self.chat_type.creator_role()
    }
}

pub struct NewMessage<'a> {
    pub chat_id: i64,
    pub user_id: i64,
    pub text: &'a str,
    pub kind: MessageKind,
    pub file_name: Option<&'a str>,
    pub file_size: Option<&'a str>,
    pub gift_id: Option<i64>,
    /// Already-serialized JSON.
    pub gift_data: Option<String>,
    pub reply_to: Option<i64>,
}

pub struct NewBot<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub username: &'a str,
    pub description: &'a str,
    pub token: &'a str,
    /// Already-serialized JSON list.
    pub commands: String,
    pub created_by: i64,
}

pub struct NewGiftLink<'a> {
    pub id: &'a str,
    pub code: &'a str,
    pub created_by: i64,
    pub expires_at: DateTime<Utc>,
}

pub struct NewXostBot<'a> {
    pub id: &'a str,
    pub token: &'a str,
    pub language: &'a str,
    pub code: &'a str,
    pub name: &'a str,
    pub user_id: i64,
}

pub struct NewUserGift<'a> {
    pub gift_id: i64,
    pub gift_name: &'a str,
    pub gift_icon: &'a str,
    pub gift_price: i64,
}

// -- Outcomes of precondition-checked writes --

#[derive(Debug)]
pub enum RegisterOutcome {
    Created(UserRow),
    UsernameTaken,
}

#[derive(Debug)]
pub enum CreateChatOutcome {
    Created(ChatRow),
    IdTaken,
    UsernameTaken,
}

#[derive(Debug)]
pub enum SendMessageOutcome {
    Sent(MessageRow),
    ChatNotFound,
    ReplyNotFound,
}

#[derive(Debug)]
pub enum ToggleReactionOutcome {
    Toggled { added: bool, reactions: Reactions },
    MessageNotFound,
}

#[derive(Debug)]
pub enum CreateGiftLinkOutcome {
    Created(GiftLinkRow),
    InsufficientStars,
    CodeTaken,
    UserNotFound,
}

#[derive(Debug, PartialEq)]
pub enum ActivationOutcome {
    Activated { premium_until: DateTime<Utc> },
    NotFound,
    AlreadyActivated,
    Expired,
    UserNotFound,
}

#[derive(Debug)]
pub enum ProfileOutcome {
    Updated(UserRow),
    /// 2FA was switched on with no stored or supplied password.
    TwoFactorPasswordRequired,
    UserNotFound,
}

#[derive(Debug, PartialEq)]
pub enum BalanceOutcome {
    Updated { stars: i64 },
    InsufficientStars,
    UserNotFound,
}
