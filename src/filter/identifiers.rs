//! The catalogue of identifiers a filter may reference.
//!
//! This table is the only place new message attributes are registered. The
//! tokenizer consults it to classify words as identifiers, the type checker
//! reads each entry's static type, and the context builder in
//! [`crate::message`] must provide a value for every entry.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::types::{Type, TypingContext};

/// A catalogue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    /// Label shown to users when picking an identifier
    pub label: &'static str,
    pub ty: Type,
}

const fn ident(label: &'static str, ty: Type) -> Identifier {
    Identifier { label, ty }
}

static IDENTIFIERS: LazyLock<BTreeMap<&'static str, Identifier>> = LazyLock::new(|| {
    BTreeMap::from([
        ("author.badges", ident("author badges", Type::StringList)),
        ("author.color", ident("author color", Type::Color)),
        ("author.name", ident("author name", Type::String)),
        ("author.user_id", ident("author user id", Type::String)),
        ("author.no_color", ident("author has no color?", Type::Bool)),
        ("author.subbed", ident("author subscribed?", Type::Bool)),
        ("author.sub_length", ident("author sub length", Type::Int)),
        ("channel.name", ident("channel name", Type::String)),
        ("channel.watching", ident("/watching channel?", Type::Bool)),
        ("channel.live", ident("channel live?", Type::Bool)),
        ("flags.action", ident("action/me message?", Type::Bool)),
        ("flags.highlighted", ident("highlighted?", Type::Bool)),
        ("flags.points_redeemed", ident("redeemed points?", Type::Bool)),
        ("flags.sub_message", ident("sub/resub message?", Type::Bool)),
        ("flags.system_message", ident("system message?", Type::Bool)),
        ("flags.reward_message", ident("channel point reward message?", Type::Bool)),
        ("flags.first_message", ident("first message?", Type::Bool)),
        ("flags.elevated_message", ident("hype chat message?", Type::Bool)),
        ("flags.hype_chat", ident("hype chat message?", Type::Bool)),
        ("flags.cheer_message", ident("cheer message?", Type::Bool)),
        ("flags.whisper", ident("whisper message?", Type::Bool)),
        ("flags.reply", ident("reply message?", Type::Bool)),
        ("flags.automod", ident("automod message?", Type::Bool)),
        ("flags.restricted", ident("restricted message?", Type::Bool)),
        ("flags.monitored", ident("monitored message?", Type::Bool)),
        ("flags.shared", ident("shared message?", Type::Bool)),
        ("flags.similar", ident("similar message?", Type::Bool)),
        ("message.content", ident("message text", Type::String)),
        ("message.length", ident("message length", Type::Int)),
        ("reward.title", ident("point reward title", Type::String)),
        ("reward.cost", ident("point reward cost", Type::Int)),
        ("reward.id", ident("point reward id", Type::String)),
    ])
});

static MESSAGE_TYPING_CONTEXT: LazyLock<TypingContext> = LazyLock::new(|| {
    IDENTIFIERS
        .iter()
        .map(|(name, ident)| (name.to_string(), ident.ty))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static Identifier> {
    IDENTIFIERS.get(name)
}

/// All identifiers, sorted by name.
pub fn identifiers() -> impl Iterator<Item = (&'static str, &'static Identifier)> {
    IDENTIFIERS.iter().map(|(name, ident)| (*name, ident))
}

/// Typing context used for filters over chat messages.
pub fn message_typing_context() -> &'static TypingContext {
    &MESSAGE_TYPING_CONTEXT
}
