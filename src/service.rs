use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing as log;

use crate::NotificationId;
use crate::channel::{self, ChannelConfig};
use crate::notification::Notification;
use crate::presenter::{Presenter, tab_title};
use crate::store::NotificationStore;

/// How long a toast stays up before it is cleared.
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

/// Inbound records waiting for the pump; the stream stalls, rather than
/// drops, if the consumer falls this far behind.
const PUSH_BUFFER: usize = 64;

/// Owner of the notification feed lifecycle.
///
/// `init()` seeds the store from the REST collaborator, then subscribes to
/// the realtime stream; `dispose()` tears the background tasks down. The
/// seed completes before the subscription starts, so a record can never be
/// seen by the stream before the store exists to hold it.
pub struct NotificationService {
    store: Arc<NotificationStore>,
    presenter: Arc<dyn Presenter>,
    app_title: String,
    toast_duration: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl NotificationService {
    pub fn new(
        store: Arc<NotificationStore>,
        presenter: Arc<dyn Presenter>,
        app_title: String,
    ) -> Self {
        NotificationService {
            store,
            presenter,
            app_title,
            toast_duration: TOAST_DURATION,
            tasks: Vec::new(),
        }
    }

    /// Shortens the toast interval. Tests use this to avoid multi-second
    /// sleeps.
    pub fn set_toast_duration(&mut self, duration: Duration) {
        self.toast_duration = duration;
    }

    /// Seeds the feed and starts the realtime subscription.
    ///
    /// A failed seed fetch is logged and leaves the feed empty; the service
    /// still subscribes, and a later `refresh()` can recover.
    pub async fn init(&mut self, channel_config: ChannelConfig) {
        if let Err(e) = self.store.refresh().await {
            log::error!("seeding notification feed failed: {:?}", e);
        }
        self.emit_badge(self.store.unread()).await;

        let (tx, rx) = mpsc::channel(PUSH_BUFFER);
        let stream = tokio::spawn(async move {
            if let Err(e) = channel::run(channel_config, tx).await {
                log::error!("notification stream terminated: {:?}", e);
            }
        });
        let pump = tokio::spawn(pump(
            self.store.clone(),
            self.presenter.clone(),
            self.app_title.clone(),
            self.toast_duration,
            rx,
        ));
        self.tasks = vec![stream, pump];
    }

    /// Stops the background tasks. The store stops mutating immediately;
    /// already-scheduled toast dismissals are allowed to finish.
    pub fn dispose(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub async fn refresh(&self) -> anyhow::Result<()> {
        let unread = self.store.refresh().await?;
        self.emit_badge(unread).await;
        Ok(())
    }

    pub async fn mark_read(&self, id: NotificationId) -> anyhow::Result<()> {
        let unread = self.store.mark_read(id).await?;
        self.emit_badge(unread).await;
        Ok(())
    }

    pub async fn mark_all_read(&self) {
        let unread = self.store.mark_all_read();
        self.emit_badge(unread).await;
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.store.snapshot()
    }

    pub fn unread(&self) -> usize {
        self.store.unread()
    }

    async fn emit_badge(&self, unread: usize) {
        let title = tab_title(&self.app_title, unread);
        if let Err(e) = self.presenter.unread_changed(unread, &title).await {
            log::warn!("badge update failed: {:?}", e);
        }
    }
}

impl Drop for NotificationService {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Applies each inbound record to the store and drives the presentation
/// side effects. Presenter failures (a blocked audio device, a closed
/// terminal) are logged and never interrupt processing.
async fn pump(
    store: Arc<NotificationStore>,
    presenter: Arc<dyn Presenter>,
    app_title: String,
    toast_duration: Duration,
    mut rx: mpsc::Receiver<Notification>,
) {
    while let Some(record) = rx.recv().await {
        let unread = store.receive_push(record.clone());
        let title = tab_title(&app_title, unread);

        if let Err(e) = presenter.unread_changed(unread, &title).await {
            log::warn!("badge update failed: {:?}", e);
        }
        if let Err(e) = presenter.show_toast(&record).await {
            log::warn!("toast display failed: {:?}", e);
        }
        if let Err(e) = presenter.play_cue().await {
            log::warn!("arrival cue failed: {:?}", e);
        }

        // Auto-dismiss without holding up the next record.
        let presenter = presenter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(toast_duration).await;
            if let Err(e) = presenter.clear_toast().await {
                log::warn!("toast dismissal failed: {:?}", e);
            }
        });
    }
}
