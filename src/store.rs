use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::NotificationId;
use crate::api::NotificationApi;
use crate::notification::Notification;

/// Single source of truth for the notification list and unread count.
///
/// The unread count is derived: after every mutation it equals the number of
/// records with `read == false`. Mutations are synchronous under the state
/// lock; only the REST round-trips suspend.
pub struct NotificationStore {
    api: Arc<dyn NotificationApi>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    records: Vec<Notification>,
    unread: usize,
}

impl State {
    fn recount(&mut self) {
        self.unread = self.records.iter().filter(|n| !n.read).count();
    }
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        NotificationStore {
            api,
            state: Mutex::new(State::default()),
        }
    }

    /// Fetches the feed and reconciles it into the in-memory list by id.
    ///
    /// Records present in the response adopt the server's state and order.
    /// Records known only locally (pushed while the fetch was in flight) are
    /// kept ahead of the fetched ones, so a refresh never loses a push. On
    /// error the previous state is untouched.
    ///
    /// Returns the resulting unread count.
    pub async fn refresh(&self) -> anyhow::Result<usize> {
        let fetched = self
            .api
            .notifications()
            .await
            .context("refreshing notification feed")?;

        let mut state = self.state.lock().unwrap();
        let mut merged: Vec<Notification> = state
            .records
            .iter()
            .filter(|local| !fetched.iter().any(|f| f.id == local.id))
            .cloned()
            .collect();
        merged.extend(fetched);
        state.records = merged;
        state.recount();
        Ok(state.unread)
    }

    /// Records an inbound realtime notification.
    ///
    /// The record is prepended and counts as unread at arrival. If the same
    /// id was already delivered (stream redelivery), the older copy is
    /// dropped first.
    ///
    /// Returns the resulting unread count.
    pub fn receive_push(&self, record: Notification) -> usize {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.records.iter().position(|n| n.id == record.id) {
            let stale = state.records.remove(pos);
            if !stale.read {
                state.unread = state.unread.saturating_sub(1);
            }
        }
        let mut record = record;
        record.read = false;
        state.records.insert(0, record);
        state.unread += 1;
        state.unread
    }

    /// Persists the read state server-side, then applies it locally.
    ///
    /// Local state only changes once the server accepted the update; a
    /// rejected update must not leave the record looking read. Flipping an
    /// already-read record is a no-op, so the counter never goes below zero
    /// on a double invocation.
    ///
    /// Returns the resulting unread count.
    pub async fn mark_read(&self, id: NotificationId) -> anyhow::Result<usize> {
        self.api.mark_read(id).await?;

        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.records.iter_mut().find(|n| n.id == id) {
            if !record.read {
                record.read = true;
                state.unread = state.unread.saturating_sub(1);
            }
        }
        Ok(state.unread)
    }

    /// Marks every record read, locally only.
    ///
    /// The backend has no bulk endpoint, so this is an ephemeral UI
    /// convenience: the next `refresh()` restores the server's view.
    ///
    /// Returns the resulting unread count (always 0).
    pub fn mark_all_read(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        for record in &mut state.records {
            record.read = true;
        }
        state.unread = 0;
        state.unread
    }

    /// The current list, newest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn unread(&self) -> usize {
        self.state.lock().unwrap().unread
    }
}
