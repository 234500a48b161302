use std::sync::Arc;

use reqwest::{Client, Method, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::state::stopwatch::{Stopwatch, StopwatchGroup};

use super::ClientError;

const STOPWATCH_PATH: &str = "stopwatch";
const GROUP_PATH: &str = "stopwatchgroup";
const SYNC_PATH: &str = "ws";

/// HTTP mutation interface of the record routes.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<Url>,
}

impl ApiClient {
    /// Build a client for the server at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|_| ClientError::BaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::builder().build()?,
            base_url: Arc::new(base_url),
        })
    }

    /// URL of the sync socket served next to the record routes.
    pub fn sync_url(&self) -> Result<Url, ClientError> {
        let mut url = self.endpoint(SYNC_PATH, None)?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            _ => return Err(ClientError::BaseUrl(self.base_url.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?;
        Ok(url)
    }

    /// Stored stopwatch, or the default the server materializes.
    pub async fn get_stopwatch(&self, id: &str) -> Result<Stopwatch, ClientError> {
        self.fetch(STOPWATCH_PATH, id).await
    }

    /// Replace a stopwatch; listeners receive an `update` event.
    pub async fn put_stopwatch(&self, id: &str, record: &Stopwatch) -> Result<(), ClientError> {
        self.store(STOPWATCH_PATH, id, record).await
    }

    /// Delete a stopwatch; listeners receive a `delete` event.
    pub async fn delete_stopwatch(&self, id: &str) -> Result<(), ClientError> {
        self.remove(STOPWATCH_PATH, id).await
    }

    /// Stored group, or the default the server materializes.
    pub async fn get_group(&self, id: &str) -> Result<StopwatchGroup, ClientError> {
        self.fetch(GROUP_PATH, id).await
    }

    /// Replace a group.
    pub async fn put_group(&self, id: &str, group: &StopwatchGroup) -> Result<(), ClientError> {
        self.store(GROUP_PATH, id, group).await
    }

    /// Delete a group; its stopwatches are kept.
    pub async fn delete_group(&self, id: &str) -> Result<(), ClientError> {
        self.remove(GROUP_PATH, id).await
    }

    fn endpoint(&self, collection: &str, id: Option<&str>) -> Result<Url, ClientError> {
        let mut url = Url::clone(&self.base_url);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        collection: &str,
        id: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = self.endpoint(collection, Some(id))?;
        Ok(self.client.request(method, url))
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, ClientError> {
        let response = self
            .request(Method::GET, collection, id)?
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn store<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        body: &T,
    ) -> Result<(), ClientError> {
        self.request(Method::PUT, collection, id)?
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), ClientError> {
        self.request(Method::DELETE, collection, id)?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_urls_escape_ids() {
        let api = ApiClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(
            api.endpoint(STOPWATCH_PATH, Some("a b")).unwrap().as_str(),
            "http://127.0.0.1:8080/stopwatch/a%20b"
        );
        assert_eq!(
            api.endpoint(GROUP_PATH, Some("g")).unwrap().as_str(),
            "http://127.0.0.1:8080/stopwatchgroup/g"
        );
    }

    #[test]
    fn sync_url_follows_the_http_scheme() {
        let api = ApiClient::new("http://localhost:9000").unwrap();
        assert_eq!(api.sync_url().unwrap().as_str(), "ws://localhost:9000/ws");

        let api = ApiClient::new("https://timers.example.org/app").unwrap();
        assert_eq!(
            api.sync_url().unwrap().as_str(),
            "wss://timers.example.org/app/ws"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::BaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.org"),
            Err(ClientError::BaseUrl(_))
        ));
    }
}
