use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use once_cell::sync::Lazy;

use crate::enums::{PersistencePolicy, Role};

pub static APP_CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    Config::parse()
});

#[derive(Debug, Parser)]
pub struct Config {
    #[clap(long, env, default_value = "http://localhost:5000/api")]
    pub api_base_url: String,

    /// Token used when no stored session exists.
    #[clap(long, env)]
    pub auth_token: Option<String>,

    #[clap(long, env, default_value = "doctor")]
    pub role: Role,

    #[clap(long, env)]
    pub session_file: Option<PathBuf>,

    #[clap(long, env, default_value = "tab-scoped")]
    pub persistence: PersistencePolicy,

    #[clap(long, env, default_value_t = 2000, value_parser = poll_interval_ms())]
    pub notification_poll_ms: u64,

    #[clap(long, env, default_value_t = 30000, value_parser = poll_interval_ms())]
    pub summary_poll_ms: u64,

    #[clap(long, env, default_value_t = 5000, value_parser = poll_interval_ms())]
    pub consultation_poll_ms: u64,

    #[clap(long, env, default_value_t = 10000)]
    pub request_timeout_ms: u64,

    #[clap(long, env, default_value_t = 4000)]
    pub alert_ttl_ms: u64,

    #[clap(long, env, default_value_t = 500)]
    pub resend_refetch_delay_ms: u64,

    #[clap(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_select: bool,

    #[clap(long, env, default_value = "info")]
    pub log_level: String,

    #[clap(long, env, default_value = "local")]
    pub app_env: String,
}

/// Runtime knobs for the sync layer, detached from the process-wide config.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub role: Role,
    pub notification_poll: Duration,
    pub summary_poll: Duration,
    pub consultation_poll: Duration,
    pub request_timeout: Duration,
    pub alert_ttl: Duration,
    pub resend_refetch_delay: Duration,
    pub resend_refetch_attempts: usize,
    pub auto_select: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            role: Role::Doctor,
            notification_poll: Duration::from_millis(2000),
            summary_poll: Duration::from_millis(30000),
            consultation_poll: Duration::from_millis(5000),
            request_timeout: Duration::from_millis(10000),
            alert_ttl: Duration::from_millis(4000),
            resend_refetch_delay: Duration::from_millis(500),
            resend_refetch_attempts: 3,
            auto_select: true,
        }
    }
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            role: config.role,
            notification_poll: Duration::from_millis(config.notification_poll_ms),
            summary_poll: Duration::from_millis(config.summary_poll_ms),
            consultation_poll: Duration::from_millis(config.consultation_poll_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            alert_ttl: Duration::from_millis(config.alert_ttl_ms),
            resend_refetch_delay: Duration::from_millis(config.resend_refetch_delay_ms),
            auto_select: config.auto_select,
            ..Self::default()
        }
    }
}

/// Poll intervals outside 2 s to 30 s are rejected at startup.
fn poll_interval_ms() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(2000..=30000)
}

/// Appends `/api` to the base url unless it already ends with it.
pub fn normalize_api_base(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}
