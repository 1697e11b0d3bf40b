//! Operator plugin for the Spaarnelanden underground container map (Haarlem).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use kliko_core::{
    extract::VariableNames,
    model::{OperatorId, OperatorMeta},
    plugin::OperatorPlugin,
    ports::{FetchError, UpstreamPort},
};

/// Public page embedding the container map data.
pub const BASE_URL: &str = "https://inzameling.spaarnelanden.nl/";

/// Script variable holding the district array.
pub const DISTRICT_VARIABLE: &str = "districts";
/// Script variable holding the container array.
pub const CONTAINER_VARIABLE: &str = "oContainerModel";

/// Page download for Spaarnelanden.
pub struct SpaarnelandenUpstream {
    client: Client,
    meta: OperatorMeta,
}

impl SpaarnelandenUpstream {
    /// Create a new upstream bound to the given HTTP client and page URL.
    ///
    /// Request timeouts are taken from `client`.
    #[must_use]
    pub fn new<U: Into<String>>(client: Client, url: U) -> Self {
        Self {
            client,
            meta: operator_meta(url.into()),
        }
    }
}

#[async_trait]
impl UpstreamPort for SpaarnelandenUpstream {
    fn operator(&self) -> &OperatorMeta {
        &self.meta
    }

    async fn fetch_document(&self) -> Result<Vec<u8>, FetchError> {
        let body = self
            .client
            .get(&self.meta.url)
            .send()
            .await
            .map_err(FetchError::from)?
            .error_for_status()
            .map_err(FetchError::from)?
            .bytes()
            .await
            .map_err(FetchError::from)?;

        debug!(url = %self.meta.url, bytes = body.len(), "fetched container page");
        Ok(body.to_vec())
    }
}

/// Build the plugin bundle for Spaarnelanden using the public page.
#[must_use]
pub fn plugin(client: Client) -> OperatorPlugin {
    plugin_with_url(client, BASE_URL)
}

/// Build the plugin bundle for Spaarnelanden reading from `url` instead of the public page.
#[must_use]
pub fn plugin_with_url<U: Into<String>>(client: Client, url: U) -> OperatorPlugin {
    let upstream = Arc::new(SpaarnelandenUpstream::new(client, url));

    OperatorPlugin {
        meta: upstream.meta.clone(),
        variables: variables(),
        upstream,
    }
}

/// Script variables used on the Spaarnelanden page.
#[must_use]
pub fn variables() -> VariableNames {
    VariableNames::new(DISTRICT_VARIABLE, CONTAINER_VARIABLE)
}

fn operator_meta(url: String) -> OperatorMeta {
    OperatorMeta {
        id: OperatorId(String::from("spaarnelanden")),
        name: String::from("Spaarnelanden"),
        url,
    }
}
