//! Bounded channel carrying actions from controllers to the driver.
//!
//! Controllers run on their own schedule. They answer a decision by
//! sending an [`ActionMessage`] through a cloned [`ActionSender`]; the
//! [`Env`](crate::Env) drains the inbox between ticks and queues each
//! action for the tick it is currently processing. An action may arrive
//! several ticks after the decision that asked for it.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use thiserror::Error;

use depot_core::{Action, TickId};

/// An action plus the decision tick it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionMessage {
    /// Tick of the decision event this action responds to.
    pub decision_tick: TickId,
    /// The action itself.
    pub action: Action,
}

/// Inbox failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InboxError {
    /// The inbox is at capacity.
    #[error("action inbox is full ({capacity} pending)")]
    Full {
        /// Inbox capacity.
        capacity: usize,
    },
    /// The receiving side is gone.
    #[error("action inbox is closed")]
    Disconnected,
}

/// Sending half, cloneable across controller threads.
#[derive(Clone, Debug)]
pub struct ActionSender {
    tx: Sender<ActionMessage>,
    capacity: usize,
}

impl ActionSender {
    /// Queue an action without blocking.
    pub fn submit(&self, decision_tick: TickId, action: Action) -> Result<(), InboxError> {
        self.tx
            .try_send(ActionMessage {
                decision_tick,
                action,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => InboxError::Full {
                    capacity: self.capacity,
                },
                TrySendError::Disconnected(_) => InboxError::Disconnected,
            })
    }
}

/// Receiving half, owned by the driver.
#[derive(Debug)]
pub struct ActionInbox {
    rx: Receiver<ActionMessage>,
    sender: ActionSender,
}

impl ActionInbox {
    /// An inbox holding at most `capacity` undelivered messages.
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            rx,
            sender: ActionSender { tx, capacity },
        }
    }

    /// A new sender handle.
    pub fn sender(&self) -> ActionSender {
        self.sender.clone()
    }

    /// Every message ready right now, in arrival order.
    pub fn drain(&self) -> Vec<ActionMessage> {
        self.rx.try_iter().collect()
    }

    /// Block up to `timeout` for the next message. `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<ActionMessage>, InboxError> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(InboxError::Disconnected),
        }
    }

    /// Messages waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no message is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
