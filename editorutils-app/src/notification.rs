//! Build status notification
//!
//! The state behind the "Build in progress..." toast. It lives on the
//! foreground thread and is updated through [`StatusSink`].

use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use strum_macros::{AsRefStr, Display};

use crate::build::{BuildOutcome, StatusSink};

pub const TEXT_IN_PROGRESS: &str = "Build in progress...";
pub const TEXT_SUCCESS: &str = "Build completed successfully!";
pub const TEXT_FAILED: &str = "Build failed!";
pub const TEXT_FAILED_TO_START: &str = "Build failed to start!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum CompletionState {
    None,
    Pending,
    Success,
    Fail,
}

/// What the notification currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSnapshot {
    pub text: String,
    pub state: CompletionState,
    /// Latest line of build output
    pub detail: Option<String>,
    /// Set once the notification reached a final state and should fade out
    pub expiring: bool,
}

type UpdateHook = Box<dyn Fn(&NotificationSnapshot) + Send + Sync>;

/// Notification for a single build
pub struct BuildNotification {
    owner: ThreadId,
    state: Mutex<NotificationSnapshot>,
    on_update: Option<UpdateHook>,
}

impl BuildNotification {
    /// Create the notification on the thread that will own it.
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            state: Mutex::new(NotificationSnapshot {
                text: TEXT_IN_PROGRESS.to_string(),
                state: CompletionState::None,
                detail: None,
                expiring: false,
            }),
            on_update: None,
        }
    }

    /// Call `hook` after every change, e.g. to redraw.
    pub fn on_update(mut self, hook: impl Fn(&NotificationSnapshot) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.state.lock().clone()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state.lock().state,
            CompletionState::Success | CompletionState::Fail
        )
    }

    fn update(&self, f: impl FnOnce(&mut NotificationSnapshot)) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "build notification touched off the foreground thread"
        );
        let snapshot = {
            let mut state = self.state.lock();
            f(&mut state);
            state.clone()
        };
        if let Some(hook) = &self.on_update {
            hook(&snapshot);
        }
    }
}

impl Default for BuildNotification {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for BuildNotification {
    fn on_started(&self) {
        self.update(|s| {
            s.text = TEXT_IN_PROGRESS.to_string();
            s.state = CompletionState::Pending;
        });
    }

    fn on_progress(&self, message: &str) {
        self.update(|s| s.detail = Some(message.to_string()));
    }

    fn on_completed(&self, outcome: &BuildOutcome) {
        self.update(|s| {
            let (text, state) = match outcome {
                BuildOutcome::Success => (TEXT_SUCCESS, CompletionState::Success),
                BuildOutcome::Failed(_) => (TEXT_FAILED, CompletionState::Fail),
                BuildOutcome::FailedToStart(_) => (TEXT_FAILED_TO_START, CompletionState::Fail),
            };
            s.text = text.to_string();
            s.state = state;
            s.expiring = true;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notification_lifecycle() {
        let notification = BuildNotification::new();
        assert_eq!(notification.snapshot().state, CompletionState::None);

        notification.on_started();
        assert_eq!(notification.snapshot().state, CompletionState::Pending);
        assert!(!notification.is_finished());

        notification.on_progress("[3/4] Linking");
        assert_eq!(notification.snapshot().detail.as_deref(), Some("[3/4] Linking"));

        notification.on_completed(&BuildOutcome::Success);
        let snapshot = notification.snapshot();
        assert_eq!(snapshot.text, TEXT_SUCCESS);
        assert_eq!(snapshot.state, CompletionState::Success);
        assert!(snapshot.expiring);
        assert!(notification.is_finished());
    }

    #[test]
    fn test_failure_texts() {
        let failed = BuildNotification::new();
        failed.on_completed(&BuildOutcome::Failed(1));
        assert_eq!(failed.snapshot().text, TEXT_FAILED);
        assert_eq!(failed.snapshot().state.as_ref(), "Fail");

        let not_started = BuildNotification::new();
        not_started.on_completed(&BuildOutcome::FailedToStart("missing executable".into()));
        assert_eq!(not_started.snapshot().text, TEXT_FAILED_TO_START);
    }

    #[test]
    fn test_update_hook() {
        let updates = Arc::new(AtomicUsize::new(0));
        let counted = updates.clone();
        let notification = BuildNotification::new().on_update(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        notification.on_started();
        notification.on_completed(&BuildOutcome::Failed(2));
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }
}
