use std::env;
use std::fmt::{self, Display};

use ivy_chat_core::DEFAULT_BOOKING_URL;
use ivy_chat_http::{ChatConfig, ChatConfigBuilder};

const BASE_URL_VAR: &str = "IVY_CHAT_BASE_URL";
const ENDPOINT_VAR: &str = "IVY_CHAT_ENDPOINT";
const BOOKING_URL_VAR: &str = "IVY_BOOKING_URL";

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => {
                write!(f, "{name} environment variable is not set")
            }
        }
    }
}

/// Settings of the terminal client, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub chat: ChatConfig,
    pub booking_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|v: &String| !v.is_empty());

        let Some(base_url) = lookup(BASE_URL_VAR) else {
            return Err(ConfigError::MissingVar(BASE_URL_VAR));
        };
        let mut chat = ChatConfigBuilder::with_base_url(base_url);
        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            chat = chat.with_endpoint(endpoint);
        }
        let booking_url = lookup(BOOKING_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BOOKING_URL.to_owned());

        Ok(Self {
            chat: chat.build(),
            booking_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config =
            from_vars(&[(BASE_URL_VAR, "http://localhost:3000")]).unwrap();
        assert_eq!(
            config.chat.endpoint_url(),
            "http://localhost:3000/api/chat-stream"
        );
        assert_eq!(config.booking_url, DEFAULT_BOOKING_URL);
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            (BASE_URL_VAR, "https://ivy.example.com"),
            (ENDPOINT_VAR, "/chat"),
            (BOOKING_URL_VAR, "https://cal.example.com/30min"),
        ])
        .unwrap();
        assert_eq!(config.chat.endpoint_url(), "https://ivy.example.com/chat");
        assert_eq!(config.booking_url, "https://cal.example.com/30min");
    }

    #[test]
    fn test_missing_base_url() {
        let err = from_vars(&[(BASE_URL_VAR, "")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(BASE_URL_VAR));
    }
}
