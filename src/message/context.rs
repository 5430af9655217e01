use crate::config::ChannelState;
use crate::filter::{Color, ContextMap, DynValue};

use super::entities::{ChatMessage, MessageFlag};

const SUB_BADGES: [&str; 2] = ["subscriber", "founder"];

/// Build the identifier table filters are evaluated against.
///
/// Every identifier of the filter catalogue gets a value, so the key set of
/// the result equals the key set of the message typing context.
pub fn build_context_map(message: &ChatMessage, channels: &ChannelState) -> ContextMap {
    let author = &message.author;

    let badges: Vec<String> = author.badges.iter().map(|b| b.name.clone()).collect();

    let mut subbed = false;
    let mut sub_length = 0;
    for sub_badge in SUB_BADGES {
        let Some(badge) = author.badges.iter().find(|b| b.name == sub_badge) else {
            continue;
        };
        subbed = true;
        if let Some(months) = badge.info.as_deref().and_then(|i| i.trim().parse().ok()) {
            sub_length = months;
        }
    }

    let color = author.color.as_deref().and_then(|c| c.parse::<Color>().ok());
    let reward = message.reward.clone().unwrap_or_default();

    let mut vars = ContextMap::from([
        ("author.badges".to_string(), DynValue::StringList(badges)),
        (
            "author.color".to_string(),
            DynValue::Color(color.unwrap_or_default()),
        ),
        ("author.name".to_string(), author.shown_name().into()),
        ("author.user_id".to_string(), author.user_id.as_str().into()),
        ("author.no_color".to_string(), color.is_none().into()),
        ("author.subbed".to_string(), subbed.into()),
        ("author.sub_length".to_string(), DynValue::Int(sub_length)),
        ("channel.name".to_string(), message.channel.as_str().into()),
        (
            "channel.watching".to_string(),
            channels.is_watching(&message.channel).into(),
        ),
        (
            "channel.live".to_string(),
            channels.is_live(&message.channel).into(),
        ),
        ("message.content".to_string(), message.content.as_str().into()),
        (
            "message.length".to_string(),
            DynValue::Int(message.content.chars().count() as i64),
        ),
        ("reward.title".to_string(), reward.title.into()),
        ("reward.cost".to_string(), DynValue::Int(reward.cost)),
        ("reward.id".to_string(), reward.id.into()),
    ]);

    for flag in MessageFlag::ALL {
        vars.insert(
            format!("flags.{}", flag.name()),
            message.has_flag(flag).into(),
        );
    }
    vars.insert(
        "flags.hype_chat".to_string(),
        message.has_flag(MessageFlag::ElevatedMessage).into(),
    );

    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::entities::{Author, Badge};

    fn badge(name: &str, info: Option<&str>) -> Badge {
        Badge {
            name: name.to_string(),
            info: info.map(String::from),
        }
    }

    #[test]
    fn test_founder_badge_counts_as_subscribed() {
        let message = ChatMessage {
            author: Author {
                badges: vec![badge("founder", Some("7"))],
                ..Author::default()
            },
            ..ChatMessage::default()
        };
        let vars = build_context_map(&message, &ChannelState::default());
        assert_eq!(vars["author.subbed"], DynValue::Bool(true));
        assert_eq!(vars["author.sub_length"], DynValue::Int(7));
    }

    #[test]
    fn test_unparseable_sub_length_is_zero() {
        let message = ChatMessage {
            author: Author {
                badges: vec![badge("subscriber", Some("soon"))],
                ..Author::default()
            },
            ..ChatMessage::default()
        };
        let vars = build_context_map(&message, &ChannelState::default());
        assert_eq!(vars["author.subbed"], DynValue::Bool(true));
        assert_eq!(vars["author.sub_length"], DynValue::Int(0));
    }

    #[test]
    fn test_invalid_color_sets_no_color() {
        let message = ChatMessage {
            author: Author {
                color: Some("blue-ish".to_string()),
                ..Author::default()
            },
            ..ChatMessage::default()
        };
        let vars = build_context_map(&message, &ChannelState::default());
        assert_eq!(vars["author.no_color"], DynValue::Bool(true));
        assert_eq!(vars["author.color"], DynValue::Color(Color::default()));
    }

    #[test]
    fn test_message_length_counts_characters() {
        let message = ChatMessage {
            content: "héllo".to_string(),
            ..ChatMessage::default()
        };
        let vars = build_context_map(&message, &ChannelState::default());
        assert_eq!(vars["message.length"], DynValue::Int(5));
    }
}
