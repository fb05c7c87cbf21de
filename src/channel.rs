use std::time::Duration;

use futures::StreamExt as _;
use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing as log;
use url::Url;

use crate::deserialize_payload;
use crate::notification::{Notification, PushFrame};

/// How many times a lost stream is redialed before giving up; after that the
/// feed stays stale until the next session.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct ChannelConfig {
    /// Stream endpoint, e.g. `ws://host/ws/notifications/`.
    pub endpoint: String,
    /// Session token appended as the `token` query parameter. `None` means
    /// the viewer is unauthenticated and the channel stays inactive.
    pub token: Option<SecretString>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl ChannelConfig {
    pub fn new(endpoint: String, token: Option<SecretString>) -> Self {
        ChannelConfig {
            endpoint,
            token,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            retry_delay: RECONNECT_DELAY,
        }
    }

    fn connect_url(&self) -> anyhow::Result<Option<Url>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };
        let mut url: Url = self.endpoint.parse()?;
        url.query_pairs_mut()
            .append_pair("token", token.expose_secret());
        Ok(Some(url))
    }
}

/// Maintains the realtime connection and feeds decoded records into `tx`.
///
/// Runs until the receiver is dropped or the reconnect budget is exhausted.
/// A successful connection resets the budget. Returns `Ok(())` immediately
/// when no token is configured.
pub async fn run(config: ChannelConfig, tx: mpsc::Sender<Notification>) -> anyhow::Result<()> {
    let Some(url) = config.connect_url()? else {
        log::info!("no session token, notification stream disabled");
        return Ok(());
    };

    let mut attempts = 0u32;
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                log::info!("notification stream connected");
                attempts = 0;
                while let Some(msg) = stream.next().await {
                    match msg {
                        Ok(Message::Text(frame)) => {
                            let record = match decode_frame(&frame) {
                                Ok(record) => record,
                                Err(e) => {
                                    log::warn!("skipping malformed frame: {:?}", e);
                                    continue;
                                }
                            };
                            if tx.send(record).await.is_err() {
                                log::debug!("receiver dropped, closing notification stream");
                                return Ok(());
                            }
                        }
                        Ok(Message::Close(_)) => {
                            log::warn!("server closed the notification stream");
                            break;
                        }
                        // Keepalive traffic; tungstenite answers pings itself.
                        Ok(_) => {}
                        Err(e) => {
                            log::warn!("notification stream error: {e}");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("failed to connect notification stream: {e}");
            }
        }

        if tx.is_closed() {
            return Ok(());
        }
        attempts += 1;
        if attempts >= config.max_attempts {
            anyhow::bail!(
                "giving up on the notification stream after {} attempts",
                config.max_attempts
            );
        }
        log::info!(
            "redialing notification stream in {:?} (attempt {}/{})",
            config.retry_delay,
            attempts + 1,
            config.max_attempts
        );
        tokio::time::sleep(config.retry_delay).await;
    }
}

fn decode_frame(frame: &str) -> anyhow::Result<Notification> {
    Ok(deserialize_payload::<PushFrame>(frame)?.into_record())
}
