//! Event sink (§6): a closed set of events the engine emits, delivered
//! through a bounded queue with a drop-oldest overflow policy so a slow or
//! absent consumer never backs up the table mutex.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::payout::Winner;
use crate::player::Action;

/// How many events the queue holds before the sink starts dropping the
/// oldest queued event to make room for the newest.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventData {
    HandStart {
        hand_number: u64,
        dealer_seat: usize,
    },
    ActionRequired {
        player_id: String,
        deadline: SystemTime,
    },
    PlayerAction {
        player_id: String,
        action: Action,
    },
    RoundAdvanced {
        community_card_count: usize,
    },
    HandComplete {
        winners: Vec<Winner>,
    },
    PlayerBusted {
        player_id: String,
    },
    GameAbandoned {
        consecutive_timeout_hands: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub table_id: String,
    pub data: EventData,
}

struct Shared {
    queue: Mutex<VecDeque<Event>>,
    dropped: AtomicUsize,
}

/// A bounded, non-blocking fan-out point for table events. `send` never
/// blocks the caller (the table mutex holder): on a full queue it evicts
/// the oldest queued event and logs a warning rather than applying
/// backpressure to the game loop.
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(EVENT_QUEUE_CAPACITY)),
                dropped: AtomicUsize::new(0),
            }),
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drains everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        let mut queue = self.shared.queue.lock().expect("event queue poisoned");
        queue.drain(..).collect()
    }

    /// Number of events dropped for overflow since the sink was created.
    pub fn dropped_count(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

/// The cloneable handle tables use to publish events.
#[derive(Clone)]
pub struct EventSender {
    shared: Arc<Shared>,
}

impl EventSender {
    pub fn send(&self, table_id: impl Into<String>, data: EventData) {
        let event = Event {
            table_id: table_id.into(),
            data,
        };
        let mut queue = self.shared.queue.lock().expect("event queue poisoned");
        if queue.len() >= EVENT_QUEUE_CAPACITY {
            queue.pop_front();
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(table_id = %event.table_id, "event queue full, dropped oldest queued event");
        }
        queue.push_back(event);
    }
}
