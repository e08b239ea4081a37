use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted string is not a known enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Generates `as_str`, `Display` and `FromStr` for a lowercase string enum
/// whose spelling matches the SQL CHECK constraint of its column.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Channel,
    Group,
    Bot,
}

string_enum!(ChatType, "chat type", {
    Private => "private",
    Channel => "channel",
    Group => "group",
    Bot => "bot",
});

impl ChatType {
    /// Role the creator receives when joining a freshly created chat.
    /// Channels and bot chats are public and carry no membership row.
    pub fn creator_role(&self) -> Option<ParticipantRole> {
        match self {
            Self::Private => Some(ParticipantRole::Member),
            Self::Group => Some(ParticipantRole::Admin),
            Self::Channel | Self::Bot => None,
        }
    }
}

/// Who a message is attributed to, from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Me,
    Them,
    System,
    Channel,
}

string_enum!(MessageSender, "message sender", {
    Me => "me",
    Them => "them",
    System => "system",
    Channel => "channel",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    File,
    Sticker,
    Gift,
    Call,
}

string_enum!(MessageKind, "message type", {
    Text => "text",
    File => "file",
    Sticker => "sticker",
    Gift => "gift",
    Call => "call",
});

impl MessageKind {
    /// Text shown as the chat's last-message preview.
    pub fn preview(&self, text: &str, file_name: Option<&str>) -> String {
        if !text.is_empty() {
            return text.to_string();
        }
        match self {
            Self::File => format!("📎 {}", file_name.unwrap_or("File")),
            Self::Sticker => "😊 Sticker".to_string(),
            Self::Gift => "🎁 Gift".to_string(),
            Self::Call => "📞 Call".to_string(),
            Self::Text => "New message".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Member,
    Admin,
    Owner,
}

string_enum!(ParticipantRole, "participant role", {
    Member => "member",
    Admin => "admin",
    Owner => "owner",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XostBotStatus {
    Running,
    #[default]
    Stopped,
    Error,
}

string_enum!(XostBotStatus, "hosted bot status", {
    Running => "running",
    Stopped => "stopped",
    Error => "error",
});

/// Reactions on a single message: emoji -> usernames that reacted with it.
///
/// Stored as a JSON object in the `messages.reactions` column. An emoji key
/// never maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(pub BTreeMap<String, Vec<String>>);

impl Reactions {
    /// Parse the stored column. Corrupt JSON yields an empty map.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Add `username` under `emoji`, or remove it if already present.
    /// Returns true when the reaction was added.
    pub fn toggle(&mut self, emoji: &str, username: &str) -> bool {
        let users = self.0.entry(emoji.to_string()).or_default();
        match users.iter().position(|u| u == username) {
            Some(idx) => {
                users.remove(idx);
                if users.is_empty() {
                    self.0.remove(emoji);
                }
                false
            }
            None => {
                users.push(username.to_string());
                true
            }
        }
    }

    pub fn count(&self, emoji: &str) -> usize {
        self.0.get(emoji).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut r = Reactions::default();
        assert!(r.toggle("🔥", "@anna"));
        assert!(r.toggle("🔥", "@ivan"));
        assert_eq!(r.count("🔥"), 2);

        assert!(!r.toggle("🔥", "@anna"));
        assert_eq!(r.0["🔥"], vec!["@ivan".to_string()]);

        assert!(!r.toggle("🔥", "@ivan"));
        assert!(!r.0.contains_key("🔥"));
    }

    #[test]
    fn corrupt_reactions_decode_empty() {
        assert_eq!(Reactions::from_json("not json"), Reactions::default());
        assert_eq!(Reactions::from_json("{}"), Reactions::default());

        let r = Reactions::from_json(r#"{"👍":["@a"]}"#);
        assert_eq!(r.count("👍"), 1);
        assert_eq!(Reactions::from_json(&r.to_json()), r);
    }

    #[test]
    fn enum_strings_match_schema() {
        assert_eq!("group".parse::<ChatType>().unwrap(), ChatType::Group);
        assert_eq!(MessageKind::Sticker.as_str(), "sticker");
        assert_eq!(XostBotStatus::default(), XostBotStatus::Stopped);

        let err = "supergroup".parse::<ChatType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown chat type 'supergroup'");
    }

    #[test]
    fn creator_roles() {
        assert_eq!(ChatType::Group.creator_role(), Some(ParticipantRole::Admin));
        assert_eq!(ChatType::Private.creator_role(), Some(ParticipantRole::Member));
        assert_eq!(ChatType::Channel.creator_role(), None);
    }

    #[test]
    fn previews() {
        assert_eq!(MessageKind::Text.preview("hi", None), "hi");
        assert_eq!(MessageKind::File.preview("", Some("a.pdf")), "📎 a.pdf");
        assert_eq!(MessageKind::Sticker.preview("", None), "😊 Sticker");
        assert_eq!(MessageKind::Text.preview("", None), "New message");
    }
}
