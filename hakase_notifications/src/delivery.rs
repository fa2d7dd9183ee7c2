use async_trait::async_trait;

/// Posts rendered text into the chat platform.
///
/// Every error is treated as transient by the dispatcher.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn send(&self, channel_id: &str, text: &str) -> anyhow::Result<()>;

    /// Default channel of a guild, used when a course has no notification
    /// channel configured.
    async fn resolve_default_channel(&self, guild_id: &str) -> anyhow::Result<String>;
}
