use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Message properties exposed to filters as `flags.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFlag {
    /// `/me` message
    Action,
    Highlighted,
    /// Highlighted via channel points
    PointsRedeemed,
    SubMessage,
    SystemMessage,
    /// Channel point reward redemption
    RewardMessage,
    FirstMessage,
    /// Paid hype chat message
    #[serde(alias = "hype_chat")]
    ElevatedMessage,
    CheerMessage,
    Whisper,
    Reply,
    Automod,
    Restricted,
    Monitored,
    /// Message shared from another channel
    Shared,
    /// Similar to a recent message
    Similar,
}

impl MessageFlag {
    pub const ALL: [MessageFlag; 16] = [
        MessageFlag::Action,
        MessageFlag::Highlighted,
        MessageFlag::PointsRedeemed,
        MessageFlag::SubMessage,
        MessageFlag::SystemMessage,
        MessageFlag::RewardMessage,
        MessageFlag::FirstMessage,
        MessageFlag::ElevatedMessage,
        MessageFlag::CheerMessage,
        MessageFlag::Whisper,
        MessageFlag::Reply,
        MessageFlag::Automod,
        MessageFlag::Restricted,
        MessageFlag::Monitored,
        MessageFlag::Shared,
        MessageFlag::Similar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MessageFlag::Action => "action",
            MessageFlag::Highlighted => "highlighted",
            MessageFlag::PointsRedeemed => "points_redeemed",
            MessageFlag::SubMessage => "sub_message",
            MessageFlag::SystemMessage => "system_message",
            MessageFlag::RewardMessage => "reward_message",
            MessageFlag::FirstMessage => "first_message",
            MessageFlag::ElevatedMessage => "elevated_message",
            MessageFlag::CheerMessage => "cheer_message",
            MessageFlag::Whisper => "whisper",
            MessageFlag::Reply => "reply",
            MessageFlag::Automod => "automod",
            MessageFlag::Restricted => "restricted",
            MessageFlag::Monitored => "monitored",
            MessageFlag::Shared => "shared",
            MessageFlag::Similar => "similar",
        }
    }
}

impl fmt::Display for MessageFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chat badge such as `subscriber/12`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    /// Extra badge info; for subscriber badges the number of months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    /// Login name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub user_id: String,
    /// Username colour as `#rrggbb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub badges: Vec<Badge>,
}

impl Author {
    /// Display name, falling back to the login name
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.name.as_str())
    }
}

/// Channel point reward attached to a redemption message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub cost: i64,
}

/// A recorded chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub channel: String,
    pub author: Author,
    pub content: String,
    pub flags: BTreeSet<MessageFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

impl ChatMessage {
    pub fn has_flag(&self, flag: MessageFlag) -> bool {
        self.flags.contains(&flag)
    }
}
