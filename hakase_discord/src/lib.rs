mod delivery;

pub use serenity;

pub use delivery::{DiscordNotificationSink, DiscordSinkError};
