use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use super::{ApiClient, ApiError};
use crate::config::ApiConfig;

/// Catalog of vessel profiles. The query goes out untouched.
pub struct VesselsApi {
    client: ApiClient,
}

impl VesselsApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(config, &config.vessels_path)?,
        })
    }

    pub fn url(&self) -> &Url {
        self.client.url()
    }

    pub async fn get<Q: Serialize + ?Sized>(&self, query: &Q) -> Result<Value, ApiError> {
        self.client.get(query).await
    }
}
