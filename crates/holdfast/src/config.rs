//! Server configuration.

use std::time::Duration;

/// Settings for the server and its connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// How long a new connection has to send `Hello`.
    pub hello_timeout: Duration,
    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
    /// Command queue depth of each room actor.
    pub room_mailbox: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            hello_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(30),
            room_mailbox: 64,
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the environment:
    ///
    /// - `HOLDFAST_BIND` — listen address
    /// - `HOLDFAST_IDLE_TIMEOUT_SECS` — idle timeout in seconds
    /// - `HOLDFAST_HELLO_TIMEOUT_SECS` — handshake timeout in seconds
    ///
    /// Unset variables keep their defaults; unparsable ones are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = lookup("HOLDFAST_BIND") {
            let addr = addr.trim();
            if addr.is_empty() {
                tracing::warn!("HOLDFAST_BIND is empty, using {}", config.bind_addr);
            } else {
                config.bind_addr = addr.to_string();
            }
        }
        if let Some(secs) = secs_var(&lookup, "HOLDFAST_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = secs;
        }
        if let Some(secs) = secs_var(&lookup, "HOLDFAST_HELLO_TIMEOUT_SECS") {
            config.hello_timeout = secs;
        }
        config
    }
}

/// A positive whole number of seconds, or `None` with a warning.
fn secs_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid timeout, keeping default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_no_variables_means_defaults() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[])), ServerConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOLDFAST_BIND", "0.0.0.0:9000"),
            ("HOLDFAST_IDLE_TIMEOUT_SECS", "90"),
            ("HOLDFAST_HELLO_TIMEOUT_SECS", " 2 "),
        ]));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.idle_timeout, Duration::from_secs(90));
        assert_eq!(config.hello_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOLDFAST_BIND", "  "),
            ("HOLDFAST_IDLE_TIMEOUT_SECS", "soon"),
            ("HOLDFAST_HELLO_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config, ServerConfig::default());
    }
}
