//! Feed expansion through a browsing session
//!
//! The landing page of the site shows a limited number of previews and a
//! "load more" control. [`PaginationDriver`] clicks that control until it
//! disappears and returns the markup of the fully expanded feed.
//!
//! The session itself sits behind [`SessionLauncher`] / [`BrowserSession`]
//! so discovery can run against Chromium, a plain HTTP page, or a scripted
//! session in tests.

use crate::config::{CrawlConfig, PaginationConfig};
use crate::state::PaginationState;
use crate::SessionError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// An open page the driver can interact with
#[async_trait]
pub trait BrowserSession: Send {
    /// Activates the first element matching `selector`
    ///
    /// Returns `Ok(false)` when no such element is on the page.
    async fn activate_control(&mut self, selector: &str) -> Result<bool, SessionError>;

    /// Current markup of the page
    async fn markup(&mut self) -> Result<String, SessionError>;

    /// Releases the session
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens browsing sessions on a URL
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self, url: &str) -> Result<Self::Session, SessionError>;
}

/// How a feed expansion ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    /// The reveal control is gone (or the reveal ceiling was hit)
    Exhausted,

    /// A session error stopped the loop; the snapshot is partial
    Failed(String),

    /// The run was cancelled mid-expansion
    Cancelled,
}

/// Result of expanding the feed: the snapshot plus how the loop ended
#[derive(Debug, Clone)]
pub struct FeedExpansion {
    /// Best markup captured (may be empty if the page never loaded)
    pub snapshot: String,
    pub outcome: ExpansionOutcome,
    /// Number of successful reveal activations
    pub reveals: usize,
}

impl FeedExpansion {
    /// The terminal pagination state matching the outcome
    pub fn final_state(&self) -> PaginationState {
        terminal_state(&self.outcome)
    }
}

/// Drives the reveal loop on the feed landing page
pub struct PaginationDriver<L> {
    launcher: L,
    reveal_selector: String,
    pagination: PaginationConfig,
}

impl<L: SessionLauncher> PaginationDriver<L> {
    pub fn new(
        launcher: L,
        reveal_selector: impl Into<String>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            launcher,
            reveal_selector: reveal_selector.into(),
            pagination,
        }
    }

    /// Creates a driver using the reveal selector and pauses from `config`
    pub fn from_config(launcher: L, config: &CrawlConfig) -> Self {
        Self::new(
            launcher,
            config.site.reveal_control.clone(),
            config.pagination.clone(),
        )
    }

    /// Loads `landing_url` and reveals content until the control disappears
    ///
    /// Never returns an error: session failures end the loop with
    /// [`ExpansionOutcome::Failed`] and whatever snapshot was captured. The
    /// session is closed on every exit path.
    ///
    /// # Arguments
    ///
    /// * `landing_url` - The feed page to expand
    /// * `cancel` - Stops the loop between reveals
    pub async fn expand_feed(
        &self,
        landing_url: &str,
        cancel: &CancellationToken,
    ) -> FeedExpansion {
        let mut state = PaginationState::Idle;

        if cancel.is_cancelled() {
            advance(&mut state, PaginationState::Cancelled);
            return FeedExpansion {
                snapshot: String::new(),
                outcome: ExpansionOutcome::Cancelled,
                reveals: 0,
            };
        }

        tracing::info!(url = %landing_url, "Opening feed session");

        let mut session = match self.launcher.open(landing_url).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(url = %landing_url, error = %e, "Could not open feed session");
                advance(&mut state, PaginationState::Failed);
                return FeedExpansion {
                    snapshot: String::new(),
                    outcome: ExpansionOutcome::Failed(e.to_string()),
                    reveals: 0,
                };
            }
        };

        let expansion = self.drive(&mut session, &mut state, cancel).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close feed session");
        }

        tracing::info!(
            state = %state,
            reveals = expansion.reveals,
            bytes = expansion.snapshot.len(),
            "Feed expansion finished"
        );

        expansion
    }

    async fn drive<S: BrowserSession>(
        &self,
        session: &mut S,
        state: &mut PaginationState,
        cancel: &CancellationToken,
    ) -> FeedExpansion {
        let mut snapshot = match session.markup().await {
            Ok(markup) => markup,
            Err(e) => {
                advance(state, PaginationState::Failed);
                return FeedExpansion {
                    snapshot: String::new(),
                    outcome: ExpansionOutcome::Failed(e.to_string()),
                    reveals: 0,
                };
            }
        };
        advance(state, PaginationState::Loaded);

        let mut reveals = 0;
        let outcome = loop {
            if cancel.is_cancelled() {
                break ExpansionOutcome::Cancelled;
            }

            if reveals >= self.pagination.max_reveals {
                tracing::warn!(reveals, "Reveal ceiling reached, treating feed as exhausted");
                break ExpansionOutcome::Exhausted;
            }

            match session.activate_control(&self.reveal_selector).await {
                Ok(false) => break ExpansionOutcome::Exhausted,
                Ok(true) => {
                    reveals += 1;
                    advance(state, PaginationState::Expanding);
                    tracing::debug!(reveals, "Revealed more feed content");
                }
                Err(e) => {
                    tracing::warn!(reveals, error = %e, "Reveal failed, keeping partial feed");
                    break ExpansionOutcome::Failed(e.to_string());
                }
            }

            let pause = self.random_pause();
            tokio::select! {
                _ = cancel.cancelled() => break ExpansionOutcome::Cancelled,
                _ = tokio::time::sleep(pause) => {}
            }
        };

        advance(state, terminal_state(&outcome));

        // Take the latest markup; fall back to the landing snapshot
        match session.markup().await {
            Ok(markup) => snapshot = markup,
            Err(e) => tracing::warn!(error = %e, "Could not read final feed markup"),
        }

        FeedExpansion {
            snapshot,
            outcome,
            reveals,
        }
    }

    /// Random pause in `[min_pause_secs, max_pause_secs]`, millisecond resolution
    fn random_pause(&self) -> Duration {
        let min = self.pagination.min_pause_secs.saturating_mul(1000);
        let max = self.pagination.max_pause_secs.saturating_mul(1000).max(min);
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

fn terminal_state(outcome: &ExpansionOutcome) -> PaginationState {
    match outcome {
        ExpansionOutcome::Exhausted => PaginationState::Exhausted,
        ExpansionOutcome::Failed(_) => PaginationState::Failed,
        ExpansionOutcome::Cancelled => PaginationState::Cancelled,
    }
}

fn advance(state: &mut PaginationState, next: PaginationState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid pagination transition {} -> {}",
        state,
        next
    );
    tracing::trace!(from = %state, to = %next, "Pagination state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Session whose reveal control works `available` times, then vanishes
    struct ScriptedSession {
        available: usize,
        fail_on_reveal: Option<usize>,
        clicks: usize,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl BrowserSession for ScriptedSession {
        async fn activate_control(&mut self, _selector: &str) -> Result<bool, SessionError> {
            if self.fail_on_reveal == Some(self.clicks) {
                return Err(SessionError::Interaction("element detached".to_string()));
            }
            if self.clicks >= self.available {
                return Ok(false);
            }
            self.clicks += 1;
            Ok(true)
        }

        async fn markup(&mut self) -> Result<String, SessionError> {
            Ok(format!("<html><body>{} pages</body></html>", self.clicks + 1))
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedLauncher {
        available: usize,
        fail_on_reveal: Option<usize>,
        fail_open: bool,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedLauncher {
        fn new(available: usize) -> Self {
            Self {
                available,
                fail_on_reveal: None,
                fail_open: false,
                opened: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl SessionLauncher for ScriptedLauncher {
        type Session = ScriptedSession;

        async fn open(&self, url: &str) -> Result<ScriptedSession, SessionError> {
            if self.fail_open {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedSession {
                available: self.available,
                fail_on_reveal: self.fail_on_reveal,
                clicks: 0,
                closed: self.closed.clone(),
            })
        }
    }

    fn no_pause() -> PaginationConfig {
        PaginationConfig {
            min_pause_secs: 0,
            max_pause_secs: 0,
            max_reveals: 500,
        }
    }

    #[tokio::test]
    async fn test_expands_until_control_disappears() {
        let launcher = ScriptedLauncher::new(3);
        let closed = launcher.closed.clone();
        let driver = PaginationDriver::new(launcher, ".more", no_pause());

        let expansion = driver
            .expand_feed("https://example.com/", &CancellationToken::new())
            .await;

        assert_eq!(expansion.outcome, ExpansionOutcome::Exhausted);
        assert_eq!(expansion.reveals, 3);
        assert!(expansion.snapshot.contains("4 pages"));
        assert_eq!(expansion.final_state(), PaginationState::Exhausted);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_feed_without_control() {
        let driver = PaginationDriver::new(ScriptedLauncher::new(0), ".more", no_pause());

        let expansion = driver
            .expand_feed("https://example.com/", &CancellationToken::new())
            .await;

        assert_eq!(expansion.outcome, ExpansionOutcome::Exhausted);
        assert_eq!(expansion.reveals, 0);
        assert!(expansion.snapshot.contains("1 pages"));
    }

    #[tokio::test]
    async fn test_reveal_failure_keeps_partial_snapshot() {
        let mut launcher = ScriptedLauncher::new(10);
        launcher.fail_on_reveal = Some(2);
        let closed = launcher.closed.clone();
        let driver = PaginationDriver::new(launcher, ".more", no_pause());

        let expansion = driver
            .expand_feed("https://example.com/", &CancellationToken::new())
            .await;

        assert!(matches!(expansion.outcome, ExpansionOutcome::Failed(_)));
        assert_eq!(expansion.reveals, 2);
        assert!(expansion.snapshot.contains("3 pages"));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_open_failure_is_an_outcome() {
        let mut launcher = ScriptedLauncher::new(1);
        launcher.fail_open = true;
        let driver = PaginationDriver::new(launcher, ".more", no_pause());

        let expansion = driver
            .expand_feed("https://example.com/", &CancellationToken::new())
            .await;

        assert!(matches!(expansion.outcome, ExpansionOutcome::Failed(_)));
        assert!(expansion.snapshot.is_empty());
        assert_eq!(expansion.final_state(), PaginationState::Failed);
    }

    #[tokio::test]
    async fn test_reveal_ceiling() {
        let mut pagination = no_pause();
        pagination.max_reveals = 2;
        let driver = PaginationDriver::new(ScriptedLauncher::new(100), ".more", pagination);

        let expansion = driver
            .expand_feed("https://example.com/", &CancellationToken::new())
            .await;

        assert_eq!(expansion.outcome, ExpansionOutcome::Exhausted);
        assert_eq!(expansion.reveals, 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let launcher = ScriptedLauncher::new(3);
        let opened = launcher.opened.clone();
        let driver = PaginationDriver::new(launcher, ".more", no_pause());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let expansion = driver.expand_feed("https://example.com/", &cancel).await;

        assert_eq!(expansion.outcome, ExpansionOutcome::Cancelled);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pause() {
        let pagination = PaginationConfig {
            min_pause_secs: 30,
            max_pause_secs: 30,
            max_reveals: 500,
        };
        let launcher = ScriptedLauncher::new(5);
        let closed = launcher.closed.clone();
        let driver = PaginationDriver::new(launcher, ".more", pagination);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let expansion = tokio::time::timeout(
            Duration::from_secs(5),
            driver.expand_feed("https://example.com/", &cancel),
        )
        .await
        .unwrap();

        assert_eq!(expansion.outcome, ExpansionOutcome::Cancelled);
        assert_eq!(expansion.reveals, 1);
        assert!(closed.load(Ordering::SeqCst));
    }
}
