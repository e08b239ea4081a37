use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ChatType, MessageKind, MessageSender, Reactions, XostBotStatus};

// -- JWT Claims --

/// Claims carried by bearer tokens issued at register/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Users --

/// Public view of a user row. The 2FA password hash is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub phone: String,
    pub bio: String,
    pub stars: i64,
    /// Premium expiry, if premium was ever granted.
    pub premium: Option<DateTime<Utc>>,
    #[serde(rename = "twoFAEnabled")]
    pub two_fa_enabled: bool,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGift {
    pub id: i64,
    pub user_id: i64,
    pub gift_id: i64,
    pub gift_name: String,
    pub gift_icon: String,
    pub gift_price: i64,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub gifts: Vec<UserGift>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: String,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    #[serde(default, rename = "twoFAEnabled")]
    pub two_fa_enabled: bool,
    #[serde(rename = "twoFAPassword")]
    pub two_fa_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjustStarsRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StarsResponse {
    pub stars: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseGiftRequest {
    pub gift_id: i64,
    pub gift_name: String,
    pub gift_icon: String,
    pub gift_price: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseGiftResponse {
    pub success: bool,
    pub stars: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(rename = "twoFAPassword")]
    pub two_fa_password: Option<String>,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// -- Chats --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub name: String,
    pub username: Option<String>,
    pub avatar: String,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread: i64,
    pub online: bool,
    pub verified: bool,
    pub created_by: Option<i64>,
    pub bot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    #[serde(default)]
    pub name: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub text: String,
    pub sender: MessageSender,
    pub sender_name: Option<String>,
    pub time: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub gift_id: Option<i64>,
    pub gift_data: Option<Value>,
    pub reactions: Reactions,
    pub star_reactions: i64,
    pub edited: bool,
    pub reply_to: Option<i64>,
    pub call_info: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub gift_id: Option<i64>,
    pub gift_data: Option<Value>,
    pub reply_to: Option<i64>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub emoji: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub success: bool,
    pub added: bool,
    pub reactions: Reactions,
}

// -- Bots --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: String,
    pub token: String,
    pub commands: Vec<Value>,
    pub chats: i64,
    pub users: i64,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBotRequest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub description: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub commands: Vec<Value>,
}

// -- Gift links --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftLink {
    pub id: String,
    pub code: String,
    pub created_by: i64,
    pub created_by_username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub activated_by: Option<i64>,
    pub activated_by_username: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftLinkRequest {
    pub code: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateGiftLinkResponse {
    pub success: bool,
    pub premium_until: DateTime<Utc>,
}

// -- Hosted (xost) bots --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XostBot {
    pub id: String,
    pub token: String,
    pub language: String,
    pub code: String,
    pub name: String,
    pub status: XostBotStatus,
    pub created_at: DateTime<Utc>,
    pub requests: i64,
    pub uptime: String,
    pub ram: String,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub logs: Vec<Value>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateXostBotRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    pub name: Option<String>,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
