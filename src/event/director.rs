use bevy::prelude::*;
use std::collections::VecDeque;

use super::event::{ActorEvent, ActorEventObserver, AppEvent, ObserverFn};

const LOG_TARGET: &str = "director";

#[derive(Clone, Copy)]
struct Registration {
    observer: Entity,
    handle: ObserverFn,
}

/// One delivered event and which observer (if any) claimed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRecord {
    pub event: ActorEvent,
    pub handled_by: Option<Entity>,
    pub frame: u64,
}

/// Scene-wide event dispatcher. Observers are delivered to in registration order;
/// the first one to report the event handled ends delivery.
#[derive(Resource)]
pub struct Director {
    observers: Vec<Registration>,
    pending: VecDeque<ActorEvent>,
    journal: VecDeque<DispatchRecord>,
    journal_capacity: usize,
    frame: u64,
}

impl Default for Director {
    fn default() -> Self {
        Self::with_journal_capacity(256)
    }
}

impl Director {
    /// Deliveries allowed per dispatch pass; the remainder waits for the next frame.
    pub const DISPATCH_BUDGET: usize = 1024;

    pub fn with_journal_capacity(cap: usize) -> Self {
        Self {
            observers: Vec::new(),
            pending: VecDeque::new(),
            journal: VecDeque::new(),
            journal_capacity: cap,
            frame: 0,
        }
    }

    /// Returns `false` (and leaves the registration untouched) if `observer` is
    /// already registered.
    pub fn register_event_handler<O: ActorEventObserver>(&mut self, observer: Entity) -> bool {
        self.register_with(observer, O::handle_event)
    }

    pub fn register_with(&mut self, observer: Entity, handle: ObserverFn) -> bool {
        if self.is_registered(observer) {
            return false;
        }
        self.observers.push(Registration { observer, handle });
        true
    }

    /// Unknown observers are ignored.
    pub fn deregister_event_handler(&mut self, observer: Entity) -> bool {
        let before = self.observers.len();
        self.observers.retain(|r| r.observer != observer);
        before != self.observers.len()
    }

    pub fn is_registered(&self, observer: Entity) -> bool {
        self.observers.iter().any(|r| r.observer == observer)
    }

    pub fn observers(&self) -> impl Iterator<Item = Entity> + '_ {
        self.observers.iter().map(|r| r.observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn send_event(&mut self, kind: AppEvent, actor: Entity) {
        self.pending.push_back(ActorEvent::new(kind, actor));
    }

    pub fn pending_events(&self) -> impl Iterator<Item = &ActorEvent> {
        self.pending.iter()
    }

    pub fn journal(&self) -> impl DoubleEndedIterator<Item = &DispatchRecord> {
        self.journal.iter()
    }

    fn push_journal(&mut self, record: DispatchRecord) {
        if self.journal_capacity == 0 {
            return;
        }
        if self.journal.len() == self.journal_capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(record);
    }
}

/// Delivers one event immediately. Observers deregistered by an earlier observer
/// during this delivery are skipped.
pub fn deliver(world: &mut World, event: &ActorEvent) -> Option<Entity> {
    let snapshot = world.resource::<Director>().observers.clone();
    for reg in snapshot {
        if !world.resource::<Director>().is_registered(reg.observer) {
            continue;
        }
        if (reg.handle)(world, reg.observer, event) {
            return Some(reg.observer);
        }
    }
    None
}

/// Exclusive system: drains queued events (including ones sent while handling)
/// until the queue is empty or the budget is spent.
pub fn dispatch_actor_events(world: &mut World) {
    let frame = {
        let mut director = world.resource_mut::<Director>();
        director.frame += 1;
        director.frame
    };
    let mut delivered = 0usize;
    loop {
        if delivered >= Director::DISPATCH_BUDGET {
            let left = world.resource::<Director>().pending.len();
            if left > 0 {
                warn!(target: LOG_TARGET, "dispatch budget spent; {left} event(s) deferred");
            }
            break;
        }
        let Some(event) = world.resource_mut::<Director>().pending.pop_front() else {
            break;
        };
        let handled_by = deliver(world, &event);
        #[cfg(feature = "debug")]
        debug!(target: LOG_TARGET, "{:?} actor={} handled_by={:?}", event.kind, event.actor, handled_by);
        world.resource_mut::<Director>().push_journal(DispatchRecord {
            event,
            handled_by,
            frame,
        });
        delivered += 1;
    }
}
