//! The event buffer and its handler dispatch table.
//!
//! # Ordering
//!
//! Events are dispatched in `(tick, insertion order)`. Events inserted
//! while a tick is executing (for example an action answering a decision
//! of the same tick) are picked up by the next `execute` call for that
//! tick; nothing is dispatched re-entrantly.

use std::collections::{BTreeMap, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use depot_core::{Action, EventError, StepError, TickId};

use crate::event::{DecisionEvent, Event, EventId, EventKind};

/// A component that consumes routed events.
///
/// The orchestrator implements this for [`EventKind::TakeAction`].
pub trait EventHandler {
    /// Name under which the handler registers its kinds.
    fn handler_name(&self) -> &str;

    /// Handle one event routed to this handler.
    fn on_event(&mut self, event: &Event) -> Result<(), StepError>;
}

/// Tick-addressed event queue.
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: BTreeMap<TickId, VecDeque<Event>>,
    routes: IndexMap<EventKind, String>,
    current_tick: Option<TickId>,
    next_id: u64,
    dispatched: u64,
    unrouted: u64,
}

impl EventBuffer {
    /// An empty buffer with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `kind` to the handler named `handler`.
    ///
    /// A kind can be routed once; [`EventKind::Decision`] is reserved for
    /// the driver and cannot be routed.
    pub fn register_event_handler(&mut self, kind: EventKind, handler: &str) -> Result<(), EventError> {
        if kind == EventKind::Decision {
            return Err(EventError::DuplicateHandler {
                kind: kind.to_string(),
                existing: "<driver>".to_string(),
            });
        }
        if let Some(existing) = self.routes.get(&kind) {
            return Err(EventError::DuplicateHandler {
                kind: kind.to_string(),
                existing: existing.clone(),
            });
        }
        debug!(%kind, handler, "registered event handler");
        self.routes.insert(kind, handler.to_string());
        Ok(())
    }

    /// The routing table, in registration order.
    pub fn registered_handlers(&self) -> impl Iterator<Item = (EventKind, &str)> {
        self.routes.iter().map(|(k, h)| (*k, h.as_str()))
    }

    /// Build a decision event for `tick`. Not queued until inserted.
    pub fn gen_decision_event(&mut self, tick: TickId, payload: Option<Action>) -> Event {
        self.gen_event(tick, EventKind::Decision, payload)
    }

    /// Build an action event for `tick`. Not queued until inserted.
    pub fn gen_action_event(&mut self, tick: TickId, action: Action) -> Event {
        self.gen_event(tick, EventKind::TakeAction, Some(action))
    }

    /// Build an event of any kind. Not queued until inserted.
    pub fn gen_event(&mut self, tick: TickId, kind: EventKind, payload: Option<Action>) -> Event {
        let id = EventId(self.next_id);
        self.next_id += 1;
        Event {
            id,
            tick,
            kind,
            payload,
        }
    }

    /// Queue an event.
    ///
    /// Events for a tick before the last executed tick are rejected; they
    /// could never be dispatched in order.
    pub fn insert_event(&mut self, event: Event) -> Result<(), EventError> {
        if let Some(current) = self.current_tick {
            if event.tick < current {
                return Err(EventError::InThePast {
                    event_tick: event.tick,
                    current,
                });
            }
        }
        trace!(id = %event.id, tick = %event.tick, kind = %event.kind, "event queued");
        self.pending.entry(event.tick).or_default().push_back(event);
        Ok(())
    }

    /// Dispatch every event due at or before `tick`.
    ///
    /// Routed events go to `handler`; decision events are returned in
    /// order. Events of unrouted kinds are dropped with a warning. If the
    /// handler fails, the failing event is consumed and the rest stay
    /// queued.
    pub fn execute(
        &mut self,
        tick: TickId,
        handler: &mut dyn EventHandler,
    ) -> Result<Vec<DecisionEvent>, StepError> {
        self.current_tick = Some(tick);
        let mut decisions = Vec::new();
        while let Some(event) = self.pop_due(tick) {
            self.dispatched += 1;
            match event.kind {
                EventKind::Decision => decisions.push(DecisionEvent {
                    id: event.id,
                    tick: event.tick,
                }),
                kind => match self.routes.get(&kind) {
                    Some(name) if name == handler.handler_name() => handler.on_event(&event)?,
                    Some(name) => {
                        return Err(EventError::HandlerMismatch {
                            kind: kind.to_string(),
                            expected: name.clone(),
                            got: handler.handler_name().to_string(),
                        }
                        .into())
                    }
                    None => {
                        self.unrouted += 1;
                        warn!(id = %event.id, %kind, "no handler registered, event dropped");
                    }
                },
            }
        }
        Ok(decisions)
    }

    fn pop_due(&mut self, tick: TickId) -> Option<Event> {
        let mut entry = self.pending.first_entry()?;
        if *entry.key() > tick {
            return None;
        }
        let event = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        event
    }

    /// Number of queued events.
    pub fn pending_len(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    /// Queued events for exactly `tick`, in dispatch order.
    pub fn pending_at(&self, tick: TickId) -> impl Iterator<Item = &Event> {
        self.pending.get(&tick).into_iter().flatten()
    }

    /// Events dispatched since the last reset.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Events dropped for lack of a route since the last reset.
    pub fn unrouted(&self) -> u64 {
        self.unrouted
    }

    /// Drop all queued events and counters. Routes survive.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.current_tick = None;
        self.next_id = 0;
        self.dispatched = 0;
        self.unrouted = 0;
    }
}
