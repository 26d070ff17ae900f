// SPDX-License-Identifier: GPL-3.0-only

//! Session-scoped asynchronous work
//!
//! Every future the controller starts runs here and reports back with a
//! [`Message`]. Tasks are grouped by [`TaskKind`] so a group can be cancelled
//! (a newer flip, leaving the session), and all of them are aborted when the
//! session is dropped, so no pending update outlives it.

use super::state::Message;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Icon swap and flip completion timers
    Lens,
    /// Waiting on a recording completion
    Recording,
    /// Waiting on a permission response
    Permissions,
    /// Watching the bound preview for pipeline errors
    Camera,
    /// Watching the loaded clip for pipeline errors
    Playback,
}

pub struct SessionTasks {
    sender: UnboundedSender<Message>,
    handles: Vec<(TaskKind, JoinHandle<()>)>,
}

impl SessionTasks {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            sender,
            handles: Vec::new(),
        }
    }

    /// Run `future` and feed its message back to the session
    pub fn spawn<F>(&mut self, kind: TaskKind, future: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        self.handles.retain(|(_, handle)| !handle.is_finished());

        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let message = future.await;
            // The receiver is gone once the session loop has ended
            let _ = sender.send(message);
        });
        self.handles.push((kind, handle));
    }

    /// Deliver `message` after `delay`
    pub fn delay(&mut self, kind: TaskKind, delay: Duration, message: Message) {
        self.spawn(kind, async move {
            tokio::time::sleep(delay).await;
            message
        });
    }

    /// Abort every pending task of `kind`
    pub fn cancel(&mut self, kind: TaskKind) {
        self.handles.retain(|(k, handle)| {
            if *k == kind {
                handle.abort();
                false
            } else {
                true
            }
        });
        debug!(?kind, "Cancelled session tasks");
    }

}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delayed_message_arrives() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tasks = SessionTasks::new(tx);
        tasks.delay(TaskKind::Lens, Duration::from_millis(100), Message::SwitchLens);

        assert!(matches!(rx.recv().await, Some(Message::SwitchLens)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tasks_never_deliver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tasks = SessionTasks::new(tx);
        tasks.delay(TaskKind::Lens, Duration::from_millis(100), Message::SwitchLens);
        tasks.delay(TaskKind::Recording, Duration::from_millis(200), Message::Foreground);
        tasks.cancel(TaskKind::Lens);

        // The Lens message was due first
        assert!(matches!(rx.recv().await, Some(Message::Foreground)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_aborts_pending_work() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tasks = SessionTasks::new(tx);
        tasks.delay(TaskKind::Lens, Duration::from_millis(100), Message::SwitchLens);
        drop(tasks);

        // All senders are gone once the aborted task is dropped
        assert!(rx.recv().await.is_none());
    }
}
