use std::collections::VecDeque;

/// Events kept before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// What happened during a render pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    LoadIssued,
    LoadFailed,
    ParseFailed,
    StaleDiscarded,
    Rendered,
}

/// Minimal event record for traceability.
///
/// `pass` is the render pass that was current when the event happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub pass: u64,
    pub kind: EventKind,
    pub message: String,
}

/// Bounded log of recent events. Once full, each new event evicts the oldest.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    pub fn emit(&mut self, pass: u64, kind: EventKind, message: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(Event {
            pass,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> impl ExactSizeIterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}
