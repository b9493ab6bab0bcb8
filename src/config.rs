use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Runtime configuration, read from the process environment once at
/// startup and passed down explicitly. Nothing in the pipeline reads
/// ambient state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet link or raw id, as provided by the operator.
    pub sheet_link: String,
    /// Sheet holding the vacancy table; `None` addresses the first sheet.
    pub vacancy_sheet: Option<String>,
    /// Sheet holding the institution table; `None` addresses the first sheet.
    pub institution_sheet: Option<String>,
    /// Socket address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Bound on each remote fetch.
    pub fetch_timeout: Duration,
    /// Table cache time-to-live; zero disables caching.
    pub cache_ttl: Duration,
    /// Apply the +1 month correction to `Date(Y,M,D)` deadlines.
    pub deadline_month_fix: bool,
}

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3030";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a `Config` from any key→value source. Tests use this with a
    /// closure over a map instead of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let sheet_link = match lookup("SHEET_LINK").or_else(|| lookup("SPREADSHEET_LINK")) {
            Some(link) if !link.trim().is_empty() => link.trim().to_string(),
            _ => bail!("SHEET_LINK (or SPREADSHEET_LINK) must be set to a spreadsheet link or id"),
        };

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("parsing LISTEN_ADDR")?;

        let fetch_timeout = Duration::from_secs(parse_secs(
            lookup("FETCH_TIMEOUT_SECS"),
            "FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);
        let cache_ttl = Duration::from_secs(parse_secs(
            lookup("CACHE_TTL_SECS"),
            "CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);

        let deadline_month_fix = match lookup("DEADLINE_MONTH_FIX") {
            None => true,
            Some(raw) => parse_bool(&raw).context("parsing DEADLINE_MONTH_FIX")?,
        };

        Ok(Config {
            sheet_link,
            vacancy_sheet: non_empty(lookup("VACANCY_SHEET_NAME")),
            institution_sheet: non_empty(lookup("UNIVERSITY_SHEET_NAME")),
            listen_addr,
            fetch_timeout,
            cache_ttl,
            deadline_month_fix,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("parsing {} ({:?})", key, raw)),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}
