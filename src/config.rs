use anyhow::Context;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Lateness thresholds and history window used by the attendance classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub late_after_minutes: i64,
    pub absent_after_minutes: i64,
    pub history_days: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_after_minutes: 15,
            absent_after_minutes: 30,
            history_days: 7,
        }
    }
}

/// Ten years of daily history.
pub const MAX_HISTORY_DAYS: i64 = 3650;

impl AttendancePolicy {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.late_after_minutes <= self.absent_after_minutes,
            "ATTENDANCE_LATE_AFTER_MINUTES must not exceed ATTENDANCE_ABSENT_AFTER_MINUTES"
        );
        anyhow::ensure!(
            (1..=MAX_HISTORY_DAYS).contains(&self.history_days),
            "ATTENDANCE_HISTORY_DAYS must be between 1 and {MAX_HISTORY_DAYS}"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    /// Offset of the campus clock; weekdays and class windows are evaluated in it.
    pub utc_offset: UtcOffset,
    pub attendance: AttendancePolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "eindex".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "eindex-clients".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
        };

        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)?,
            Err(_) => UtcOffset::UTC,
        };

        let defaults = AttendancePolicy::default();
        let attendance = AttendancePolicy {
            late_after_minutes: env_parse("ATTENDANCE_LATE_AFTER_MINUTES", defaults.late_after_minutes),
            absent_after_minutes: env_parse(
                "ATTENDANCE_ABSENT_AFTER_MINUTES",
                defaults.absent_after_minutes,
            ),
            history_days: env_parse("ATTENDANCE_HISTORY_DAYS", defaults.history_days),
        };
        attendance.validate()?;

        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            utc_offset,
            attendance,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses offsets written as `+08:00` or `-05:30`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), &format).with_context(|| format!("invalid APP_UTC_OFFSET {raw:?}"))
}
