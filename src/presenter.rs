use std::io::Write as _;
use std::time::Duration;

use async_trait::async_trait;

use crate::listing;
use crate::notification::Notification;

/// Formats the tab/window title: `"App (3)"`, reverting to the bare
/// application name when nothing is unread.
pub fn tab_title(app: &str, unread: usize) -> String {
    if unread == 0 {
        app.to_string()
    } else {
        format!("{app} ({unread})")
    }
}

/// Rendering seam between the service and whatever surface displays the
/// feed. Every method is fallible; the service logs failures and keeps
/// processing, so a broken surface can never stall the stream.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// The unread count changed; update the badge and the window title.
    async fn unread_changed(&self, unread: usize, title: &str) -> anyhow::Result<()>;

    /// Show a transient notice for a just-arrived record.
    async fn show_toast(&self, record: &Notification) -> anyhow::Result<()>;

    /// The transient notice expired.
    async fn clear_toast(&self) -> anyhow::Result<()>;

    /// Play the short two-tone arrival cue.
    async fn play_cue(&self) -> anyhow::Result<()>;
}

/// Terminal renderer: badge and toast lines on stdout, OSC 0 for the title,
/// the terminal bell (twice, spaced) for the arrival cue.
pub struct TerminalPresenter;

const CUE_TONE_GAP: Duration = Duration::from_millis(150);

impl TerminalPresenter {
    pub fn new() -> Self {
        TerminalPresenter
    }

    fn write_all(&self, chunk: &str) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(chunk.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn unread_changed(&self, unread: usize, title: &str) -> anyhow::Result<()> {
        self.write_all(&format!("\x1b]0;{title}\x07unread: {unread}\n"))
    }

    async fn show_toast(&self, record: &Notification) -> anyhow::Result<()> {
        let marker = listing::marker(record.kind);
        let body = listing::ellipsize(&record.body, listing::TOAST_WIDTH);
        self.write_all(&format!("{marker} {} — {body}\n", record.title))
    }

    async fn clear_toast(&self) -> anyhow::Result<()> {
        // A scrolled line needs no dismissal.
        Ok(())
    }

    async fn play_cue(&self) -> anyhow::Result<()> {
        self.write_all("\x07")?;
        tokio::time::sleep(CUE_TONE_GAP).await;
        self.write_all("\x07")
    }
}

/// The dropdown panel is either closed (initial) or open. The trigger
/// toggles it; any outside interaction or navigation dismisses it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

impl PanelState {
    /// Trigger click. Returns whether the panel is now open.
    pub fn toggle(&mut self) -> bool {
        *self = match self {
            PanelState::Closed => PanelState::Open,
            PanelState::Open => PanelState::Closed,
        };
        self.is_open()
    }

    /// Outside click or navigation.
    pub fn dismiss(&mut self) {
        *self = PanelState::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PanelState::Open)
    }
}
