use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(default)]
    pub upstream_address: Option<String>,
    #[serde(default = "default_max_pending_connections")]
    pub max_pending_connections: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// The legacy wire's `ProtocolVersion`, normally negotiated by the
    /// RakNet-compatible transport before a connection ever reaches proxy
    /// code; since that negotiation is out of scope here, the accept loop
    /// assumes every incoming connection is this version.
    #[serde(default = "default_legacy_protocol_version")]
    pub legacy_protocol_version: u8,
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_bind_port() -> u16 {
    19132
}

fn default_max_pending_connections() -> usize {
    64
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_legacy_protocol_version() -> u8 {
    9
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            upstream_address: None,
            max_pending_connections: default_max_pending_connections(),
            log_filter: default_log_filter(),
            legacy_protocol_version: default_legacy_protocol_version(),
        }
    }
}

impl ProxyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ProxyConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ProxyConfig::load(Path::new("/nonexistent/relic-proxy.toml")).unwrap();
        assert_eq!(config.bind_port, 19132);
        assert_eq!(config.legacy_protocol_version, 9);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = std::env::temp_dir().join("relic-proxy-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        std::fs::write(&path, "bind_port = 12345\n").unwrap();

        let config = ProxyConfig::load(&path).unwrap();
        assert_eq!(config.bind_port, 12345);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.max_pending_connections, 64);
    }
}
