use std::env;
use std::ops::RangeInclusive;
use tracing::warn;

/// Longest session lifetime accepted from the environment (30 days).
pub const MAX_SESSION_TTL_HOURS: i64 = 720;
/// Longest availability publish window accepted from the environment.
pub const MAX_AVAILABILITY_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bind_address: String,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_contact: String,
    pub default_doctor_password: String,
    pub availability_window_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_PATH not set, using default");
                    "clinic.sqlite3".to_string()
                }),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SESSION_SECRET not set, using empty value");
                    String::new()
                }),
            session_ttl_hours: parse_in_range("SESSION_TTL_HOURS", 24, 1..=MAX_SESSION_TTL_HOURS),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_username: env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "Superuser".to_string()),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@gmail.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_PASSWORD not set, using built-in bootstrap password");
                    "1234567890".to_string()
                }),
            admin_contact: env::var("ADMIN_CONTACT")
                .unwrap_or_else(|_| "0000000000".to_string()),
            default_doctor_password: env::var("DEFAULT_DOCTOR_PASSWORD")
                .unwrap_or_else(|_| "temp123".to_string()),
            availability_window_days: parse_in_range("AVAILABILITY_WINDOW_DAYS", 7, 1..=MAX_AVAILABILITY_WINDOW_DAYS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_path.is_empty() && !self.session_secret.is_empty()
    }
}

fn parse_or(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a number ({}), using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_in_range(key: &str, default: i64, range: RangeInclusive<i64>) -> i64 {
    clamp_setting(key, parse_or(key, default), range)
}

fn clamp_setting(key: &str, value: i64, range: RangeInclusive<i64>) -> i64 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!("{} = {} is outside {:?}, using {}", key, value, range, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_inside_range_are_kept() {
        assert_eq!(clamp_setting("SESSION_TTL_HOURS", 24, 1..=MAX_SESSION_TTL_HOURS), 24);
        assert_eq!(clamp_setting("AVAILABILITY_WINDOW_DAYS", 1, 1..=MAX_AVAILABILITY_WINDOW_DAYS), 1);
    }

    #[test]
    fn oversized_settings_are_clamped() {
        assert_eq!(
            clamp_setting("SESSION_TTL_HOURS", i64::MAX, 1..=MAX_SESSION_TTL_HOURS),
            MAX_SESSION_TTL_HOURS
        );
        assert_eq!(
            clamp_setting("AVAILABILITY_WINDOW_DAYS", 1_000_000_000, 1..=MAX_AVAILABILITY_WINDOW_DAYS),
            MAX_AVAILABILITY_WINDOW_DAYS
        );
        assert_eq!(clamp_setting("SESSION_TTL_HOURS", -5, 1..=MAX_SESSION_TTL_HOURS), 1);
    }
}
