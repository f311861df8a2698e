use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::quote::{Quote, SERVER_CATEGORY};

/// One item as served by the placeholder endpoint. Only the title is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePost {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl RemotePost {
    pub fn into_quote(self) -> Quote {
        Quote::new(self.title, SERVER_CATEGORY)
    }
}

/// Where sync reads remote items from and pushes local quotes to.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RemotePost>>;

    async fn push(&self, quotes: &[Quote]) -> Result<()>;
}

#[cfg(feature = "sync")]
pub use http::HttpRemote;

#[cfg(feature = "sync")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{RemotePost, RemoteSource};
    use crate::error::Result;
    use crate::quote::Quote;

    static APP_USER_AGENT: &str = concat!("quoter/", env!("CARGO_PKG_VERSION"));

    /// Remote source speaking plain JSON over HTTP.
    #[derive(Debug, Clone)]
    pub struct HttpRemote {
        client: reqwest::Client,
        endpoint: String,
    }

    impl HttpRemote {
        pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
            // reqwest is built without a default crypto provider. Installing
            // fails harmlessly if one is already in place.
            let _ = rustls::crypto::ring::default_provider().install_default();

            let client = reqwest::Client::builder()
                .user_agent(APP_USER_AGENT)
                .timeout(timeout)
                .build()?;

            Ok(Self {
                client,
                endpoint: endpoint.into(),
            })
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    #[async_trait]
    impl RemoteSource for HttpRemote {
        async fn fetch(&self) -> Result<Vec<RemotePost>> {
            tracing::debug!(endpoint = %self.endpoint, "fetching remote quotes");

            let posts = self
                .client
                .get(&self.endpoint)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<RemotePost>>()
                .await?;

            Ok(posts)
        }

        async fn push(&self, quotes: &[Quote]) -> Result<()> {
            tracing::debug!(endpoint = %self.endpoint, count = quotes.len(), "pushing local quotes");

            self.client
                .post(&self.endpoint)
                .json(quotes)
                .send()
                .await?
                .error_for_status()?;

            Ok(())
        }
    }
}
