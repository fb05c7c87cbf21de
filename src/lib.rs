#![allow(clippy::new_without_default)]

use anyhow::Context;

pub mod api;
pub mod channel;
pub mod config;
pub mod listing;
pub mod logger;
pub mod notification;
pub mod presenter;
pub mod service;
pub mod store;

pub type NotificationId = u64;

/// Deserializes `v`, reporting the JSON path at which decoding failed.
///
/// Used for inbound realtime frames, where "expected a string at
/// `.content.titre`" beats a bare serde error.
pub fn deserialize_payload<T: serde::de::DeserializeOwned>(v: &str) -> anyhow::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(v);
    let res: Result<T, _> = serde_path_to_error::deserialize(&mut deserializer);
    match res {
        Ok(r) => Ok(r),
        Err(e) => {
            let ctx = format!("at {:?}", e.path());
            Err(e.into_inner()).context(ctx)
        }
    }
}
