use anyhow::Context as _;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret as _, SecretString};
use tracing as log;

use crate::NotificationId;
use crate::notification::{FeedResponse, Notification};

/// The REST collaborator surface the store depends on.
///
/// `ApiClient` is the production implementation; tests substitute their own
/// to simulate rejected updates without a network.
#[async_trait::async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetches the current user's notifications.
    async fn notifications(&self) -> anyhow::Result<Vec<Notification>>;

    /// Persists the read state for one notification.
    async fn mark_read(&self, id: NotificationId) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct ApiClient {
    token: SecretString,
    client: Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(token: SecretString, api_url: String) -> Self {
        ApiClient {
            client: Client::new(),
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn raw(&self) -> &Client {
        &self.client
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(self.token.expose_secret())
    }

    async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<Bytes> {
        log::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("building reqwest {req_dbg}"))?;

        let resp = self.client.execute(req).await?;
        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl NotificationApi for ApiClient {
    async fn notifications(&self) -> anyhow::Result<Vec<Notification>> {
        let url = format!("{}/users/notifications/", self.api_url);
        let body = self
            .send_req(self.authed(self.client.get(&url)))
            .await
            .context("fetching notifications")?;
        let feed: FeedResponse =
            serde_json::from_slice(&body).context("notification list failed to deserialize")?;
        Ok(feed.into_records())
    }

    async fn mark_read(&self, id: NotificationId) -> anyhow::Result<()> {
        let url = format!("{}/users/notifications/{}/mark-read/", self.api_url, id);
        // The response body, if any, is irrelevant.
        self.send_req(self.authed(self.client.patch(&url)))
            .await
            .with_context(|| format!("marking notification {id} read"))?;
        Ok(())
    }
}
