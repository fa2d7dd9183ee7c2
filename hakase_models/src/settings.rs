use std::time::Duration;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct DiscordSettings {
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
}

#[derive(Deserialize, Debug)]
pub struct NatsSettings {
    pub url: String,
    pub stream_name: String,
    #[serde(default = "default_ack_wait_secs")]
    pub ack_wait_secs: u64,
    #[serde(default = "default_max_idle_publishers")]
    pub max_idle_publishers: usize,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    #[serde(default = "default_lead_times_minutes")]
    pub lead_times_minutes: Vec<u64>,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl NotificationSettings {
    pub fn lead_times(&self) -> Vec<Duration> {
        self.lead_times_minutes
            .iter()
            .map(|&minutes| Duration::from_secs(minutes * 60))
            .collect()
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            lead_times_minutes: default_lead_times_minutes(),
            retry_delay_secs: default_retry_delay_secs(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub discord: DiscordSettings,
    pub backend: BackendSettings,
    pub nats: NatsSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_ack_wait_secs() -> u64 {
    30
}

fn default_max_idle_publishers() -> usize {
    4
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_lead_times_minutes() -> Vec<u64> {
    vec![24 * 60, 60]
}

fn default_retry_delay_secs() -> u64 {
    15 * 60
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_times_are_configured_in_minutes() {
        let settings = NotificationSettings {
            lead_times_minutes: vec![1440, 60, 5],
            ..Default::default()
        };

        assert_eq!(
            settings.lead_times(),
            [
                Duration::from_secs(24 * 3600),
                Duration::from_secs(3600),
                Duration::from_secs(300)
            ]
        );
    }

    #[test]
    fn default_lead_times_are_a_day_and_an_hour() {
        assert_eq!(
            NotificationSettings::default().lead_times(),
            [Duration::from_secs(24 * 3600), Duration::from_secs(3600)]
        );
    }
}
