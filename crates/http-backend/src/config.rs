/// Builder for [`ChatConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatConfigBuilder {
    base_url: String,
    endpoint: Option<String>,
}

impl ChatConfigBuilder {
    /// Creates a builder with the given server base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: None,
        }
    }

    /// Sets a custom endpoint path.
    #[inline]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ChatConfig {
        ChatConfig {
            base_url: self.base_url,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| "/api/chat-stream".to_string()),
        }
    }
}

/// Configuration for the HTTP chat backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatConfig {
    pub(crate) base_url: String,
    pub(crate) endpoint: String,
}

impl ChatConfig {
    /// Returns the full URL that user turns are posted to.
    pub fn endpoint_url(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        if self.endpoint.starts_with('/') {
            format!("{base_url}{}", self.endpoint)
        } else {
            format!("{base_url}/{}", self.endpoint)
        }
    }
}
