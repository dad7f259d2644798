use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub scoring_api_url: String,
    pub scoring_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub max_sessions: u64,
    pub breaker_failure_threshold: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Scoring API URL: {}", config.scoring_api_url);
        tracing::debug!("Scoring timeout: {}s", config.scoring_timeout_secs);
        tracing::debug!(
            "Sessions: idle {}s, max {}",
            config.session_idle_secs,
            config.max_sessions
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8050".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            scoring_api_url: lookup("SCORING_API_URL")
                .ok_or_else(|| anyhow::anyhow!("SCORING_API_URL environment variable required"))
                .and_then(|url| {
                    let url = url.trim().to_string();
                    if url.is_empty() {
                        anyhow::bail!("SCORING_API_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SCORING_API_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            scoring_timeout_secs: positive(&lookup, "SCORING_TIMEOUT_SECS", 30)?,
            session_idle_secs: positive(&lookup, "SESSION_IDLE_SECS", 1800)?,
            max_sessions: positive(&lookup, "MAX_SESSIONS", 10_000)?,
            breaker_failure_threshold: positive(&lookup, "BREAKER_FAILURE_THRESHOLD", 5)?,
        })
    }
}

fn positive<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => anyhow::bail!("{} must be a positive integer", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            Config::from_lookup(lookup(&[("SCORING_API_URL", "https://scoring.example")])).unwrap();

        assert_eq!(config.port, 8050);
        assert_eq!(config.scoring_api_url, "https://scoring.example");
        assert_eq!(config.scoring_timeout_secs, 30);
        assert_eq!(config.session_idle_secs, 1800);
        assert_eq!(config.max_sessions, 10_000);
        assert_eq!(config.breaker_failure_threshold, 5);
    }

    #[test]
    fn test_scoring_url_required_and_validated() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("SCORING_API_URL", "  ")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SCORING_API_URL", "ftp://scoring")])).is_err());
    }

    #[test]
    fn test_numeric_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SCORING_API_URL", "http://localhost:5000"),
            ("PORT", "9000"),
            ("SCORING_TIMEOUT_SECS", "5"),
            ("BREAKER_FAILURE_THRESHOLD", "3"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.scoring_timeout_secs, 5);
        assert_eq!(config.breaker_failure_threshold, 3);
    }

    #[test]
    fn test_zero_and_garbage_rejected() {
        let base = ("SCORING_API_URL", "http://localhost:5000");
        assert!(Config::from_lookup(lookup(&[base, ("SESSION_IDLE_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[base, ("MAX_SESSIONS", "lots")])).is_err());
        assert!(Config::from_lookup(lookup(&[base, ("PORT", "70000")])).is_err());
    }
}
