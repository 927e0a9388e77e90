//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Application configuration.
///
/// Defaults mirror the production bot: ±3-day flex window, 3 free offers,
/// pages of 5, merged set capped at 40.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Currency code sent to providers and shown in prices.
    pub currency: String,
    /// Locale forwarded to affiliate deeplinks.
    pub locale: String,
    /// Symmetric date-flex window in days around the requested departure.
    pub date_flex_days: u32,
    /// Maximum size of the merged, ranked result set.
    pub result_limit: usize,
    /// Offers visible to every user regardless of tier.
    pub free_count: usize,
    /// Offers per rendered page.
    pub page_size: usize,
    /// Per-call deadline for one provider query.
    pub provider_timeout: Duration,
    /// Base backoff before the single provider retry.
    pub retry_backoff: Duration,
    /// Session idle timeout (sessions are pruned after this duration).
    pub session_idle_timeout: Duration,
    /// Affiliate partner marker substituted into deeplinks.
    pub affiliate_marker: String,
    /// Optional static sub-id prefixed to the attribution token.
    pub affiliate_sub_id: Option<String>,
    /// Service fee charged to unlock the gated tail, in minor units.
    pub service_fee_amount: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: "uzs".to_string(),
            locale: "ru".to_string(),
            date_flex_days: 3,
            result_limit: 40,
            free_count: 3,
            page_size: 5,
            provider_timeout: Duration::from_secs(20),
            retry_backoff: Duration::from_millis(300),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            affiliate_marker: String::new(),
            affiliate_sub_id: None,
            service_fee_amount: 50_000,
        }
    }
}

impl AppConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CURRENCY") {
            config.currency = v.to_lowercase();
        }
        if let Ok(v) = std::env::var("LOCALE") {
            config.locale = v;
        }
        if let Ok(v) = std::env::var("DATE_FLEX_DAYS") {
            config.date_flex_days = parse_env("DATE_FLEX_DAYS", &v)?;
        }
        if let Ok(v) = std::env::var("RESULT_LIMIT") {
            config.result_limit = parse_env("RESULT_LIMIT", &v)?;
        }
        if let Ok(v) = std::env::var("FREE_COUNT") {
            config.free_count = parse_env("FREE_COUNT", &v)?;
        }
        if let Ok(v) = std::env::var("PAGE_SIZE") {
            config.page_size = parse_env("PAGE_SIZE", &v)?;
        }
        if let Ok(v) = std::env::var("PROVIDER_TIMEOUT_SECS") {
            config.provider_timeout = Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", &v)?);
        }
        if let Ok(v) = std::env::var("SESSION_TTL_SECS") {
            config.session_idle_timeout = Duration::from_secs(parse_env("SESSION_TTL_SECS", &v)?);
        }
        if let Ok(v) = std::env::var("AFFILIATE_MARKER") {
            config.affiliate_marker = v;
        }
        if let Ok(v) = std::env::var("SUB_ID") {
            if !v.is_empty() {
                config.affiliate_sub_id = Some(v);
            }
        }
        if let Ok(v) = std::env::var("SERVICE_FEE_AMOUNT") {
            config.service_fee_amount = parse_env("SERVICE_FEE_AMOUNT", &v)?;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
