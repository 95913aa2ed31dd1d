//! Client configuration.
//!
//! Settings come from an optional TOML file, then command-line flags
//! override individual fields. Every file field is optional.
//!
//! ```toml
//! origin = "https://review.example.com"
//! user_id = "alice"
//! heartbeat_interval_secs = 30
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use draftdesk_app::SessionConfig;
use draftdesk_core::{
    ConnectionConfig, Endpoint, EndpointError, NotifyConfig, ReconnectPolicy,
    endpoint::{DEFAULT_PATH, DEFAULT_PORT, DEFAULT_USER_ID},
};
use serde::Deserialize;
use thiserror::Error;

/// Longest heartbeat interval or connect timeout accepted, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "draftdesk", version, about = "Review drafted email replies from the terminal")]
pub struct Args {
    /// Configuration file
    #[arg(long, env = "DRAFTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Origin the draft service is reached from (http or https)
    #[arg(long)]
    pub origin: Option<String>,

    /// Draft service port
    #[arg(long)]
    pub port: Option<u16>,

    /// Identity sent to the draft service
    #[arg(long)]
    pub user_id: Option<String>,

    /// Never show desktop notifications
    #[arg(long)]
    pub no_notifications: bool,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this client
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No socket URL can be derived
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Origin the draft service is reached from
    pub origin: String,
    /// Draft service port
    pub port: u16,
    /// Socket path on the draft service
    pub path: String,
    /// Identity sent to the draft service
    pub user_id: String,
    /// Whether desktop notifications are used
    pub notifications: bool,
    /// Seconds between heartbeats
    pub heartbeat_interval_secs: u64,
    /// Seconds an attempt may take to open
    pub connect_timeout_secs: u64,
    /// Automatic retries before giving up
    pub max_reconnect_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let connection = ConnectionConfig::default();
        Self {
            origin: "http://localhost".to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            notifications: true,
            heartbeat_interval_secs: connection.heartbeat_interval.as_secs(),
            connect_timeout_secs: connection.connect_timeout.as_secs(),
            max_reconnect_attempts: connection.policy.max_attempts,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load the file named by `args` (if any) and apply the flag overrides.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                Self::from_toml(&text)?
            },
            None => Self::default(),
        };
        config.apply(args);
        Ok(config)
    }

    /// Override fields given on the command line.
    pub fn apply(&mut self, args: &Args) {
        if let Some(origin) = &args.origin {
            self.origin.clone_from(origin);
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(user_id) = &args.user_id {
            self.user_id.clone_from(user_id);
        }
        if args.no_notifications {
            self.notifications = false;
        }
    }

    /// Session settings for this configuration.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        if !(1..=MAX_INTERVAL_SECS).contains(&self.heartbeat_interval_secs) {
            return Err(ConfigError::Invalid("heartbeat_interval_secs must be between 1 and 86400"));
        }
        if !(1..=MAX_INTERVAL_SECS).contains(&self.connect_timeout_secs) {
            return Err(ConfigError::Invalid("connect_timeout_secs must be between 1 and 86400"));
        }

        let endpoint = Endpoint::parse(&self.origin)?
            .with_port(self.port)
            .with_path(self.path.clone())
            .with_user_id(self.user_id.clone());
        // Fail now rather than on the first connect.
        endpoint.url()?;

        let connection = ConnectionConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            policy: ReconnectPolicy {
                max_attempts: self.max_reconnect_attempts,
                ..ReconnectPolicy::default()
            },
        };

        Ok(SessionConfig { endpoint, connection, notify: NotifyConfig::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(ClientConfig::from_toml("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            origin = "https://review.example.com"
            max_reconnect_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.origin, "https://review.example.com");
        assert_eq!(config.max_reconnect_attempts, 3);
        assert_eq!(config.port, 8000);
        assert!(config.notifications);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(matches!(ClientConfig::from_toml("prot = 1"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn flags_override_file() {
        let args = Args::try_parse_from([
            "draftdesk",
            "--origin",
            "https://other.example.com",
            "--user-id",
            "bob",
            "--no-notifications",
        ])
        .unwrap();

        let mut config = ClientConfig::from_toml("user_id = \"alice\"\nport = 9000").unwrap();
        config.apply(&args);

        assert_eq!(config.origin, "https://other.example.com");
        assert_eq!(config.user_id, "bob");
        assert_eq!(config.port, 9000);
        assert!(!config.notifications);
    }

    #[test]
    fn session_config_derives_socket_url() {
        let config = ClientConfig {
            origin: "https://review.example.com".into(),
            user_id: "alice".into(),
            heartbeat_interval_secs: 10,
            ..ClientConfig::default()
        };
        let session = config.session_config().unwrap();

        assert_eq!(
            session.endpoint.url().unwrap().as_str(),
            "wss://review.example.com:8000/api/v1/ws/drafts?user_id=alice"
        );
        assert_eq!(session.connection.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(session.connection.policy.max_attempts, 10);
    }

    #[test]
    fn bad_origin_is_reported() {
        let config = ClientConfig { origin: "ftp://files.example.com".into(), ..ClientConfig::default() };
        assert!(matches!(
            config.session_config(),
            Err(ConfigError::Endpoint(EndpointError::UnsupportedScheme(_)))
        ));
    }

    #[test]
    fn oversized_timeout_is_rejected() {
        let config = ClientConfig::from_toml("connect_timeout_secs = 9223372036854775807").unwrap();
        assert!(matches!(config.session_config(), Err(ConfigError::Invalid(_))));

        let config = ClientConfig { heartbeat_interval_secs: MAX_INTERVAL_SECS + 1, ..ClientConfig::default() };
        assert!(matches!(config.session_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn longest_accepted_timeout_connects() {
        use draftdesk_app::Session;

        use crate::DesktopHost;

        let config = ClientConfig {
            connect_timeout_secs: MAX_INTERVAL_SECS,
            heartbeat_interval_secs: MAX_INTERVAL_SECS,
            ..ClientConfig::default()
        };
        let mut session = Session::new(config.session_config().unwrap(), DesktopHost::disabled()).unwrap();

        let now = std::time::Instant::now();
        assert!(!session.connect(now).is_empty());
        assert_eq!(session.next_deadline(), Some(now + Duration::from_secs(MAX_INTERVAL_SECS)));
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let config = ClientConfig { heartbeat_interval_secs: 0, ..ClientConfig::default() };
        assert!(matches!(config.session_config(), Err(ConfigError::Invalid(_))));
    }
}
