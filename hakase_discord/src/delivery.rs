use std::sync::Arc;

use async_trait::async_trait;
use hakase_notifications::NotificationSink;
use serenity::{
    http::Http,
    model::id::{ChannelId, GuildId},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscordSinkError {
    #[error("Not a valid Discord id: {0:?}")]
    InvalidSnowflake(String),

    #[error("Guild has no system channel configured {0}")]
    NoSystemChannel(String),

    #[error(transparent)]
    Serenity(#[from] serenity::Error),
}

/// Posts notifications through the Discord REST API.
pub struct DiscordNotificationSink {
    http: Arc<Http>,
}

impl DiscordNotificationSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Tag of the bot account the token belongs to.
    pub async fn current_user_tag(&self) -> Result<String, DiscordSinkError> {
        let user = self.http.get_current_user().await?;
        Ok(user.tag())
    }

    async fn post(&self, channel_id: &str, text: &str) -> Result<(), DiscordSinkError> {
        let channel_id = ChannelId::new(parse_snowflake(channel_id)?);
        channel_id.say(self.http.as_ref(), text).await?;
        Ok(())
    }

    async fn system_channel(&self, guild_id: &str) -> Result<String, DiscordSinkError> {
        let guild = self
            .http
            .get_guild(GuildId::new(parse_snowflake(guild_id)?))
            .await?;

        system_channel_of(guild_id, guild.system_channel_id)
    }
}

#[async_trait]
impl NotificationSink for DiscordNotificationSink {
    async fn send(&self, channel_id: &str, text: &str) -> anyhow::Result<()> {
        Ok(self.post(channel_id, text).await?)
    }

    async fn resolve_default_channel(&self, guild_id: &str) -> anyhow::Result<String> {
        Ok(self.system_channel(guild_id).await?)
    }
}

/// Discord ids are non-zero 64-bit integers.
fn parse_snowflake(id: &str) -> Result<u64, DiscordSinkError> {
    id.trim()
        .parse::<u64>()
        .ok()
        .filter(|&id| id != 0)
        .ok_or_else(|| DiscordSinkError::InvalidSnowflake(id.to_owned()))
}

fn system_channel_of(
    guild_id: &str,
    system_channel_id: Option<ChannelId>,
) -> Result<String, DiscordSinkError> {
    system_channel_id
        .map(|channel_id| channel_id.to_string())
        .ok_or_else(|| DiscordSinkError::NoSystemChannel(guild_id.to_owned()))
}
