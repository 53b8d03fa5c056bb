//! Deferred event queue between the editing session and the app shell.
//!
//! The session emits typed events while it handles input; the shell drains
//! them once per frame with `poll()` and reacts (status line, 3D framing,
//! save feedback). Nothing is dispatched synchronously: everything runs on
//! the UI thread and ordering within one frame is emission order.

use std::any::Any;
use std::sync::{Arc, Mutex};

use log::warn;

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 256;

/// Marker trait for events.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

type Queue = Arc<Mutex<Vec<BoxedEvent>>>;

fn push_bounded(queue: &Queue, event: BoxedEvent) {
    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUE_SIZE {
        let evict_count = queue.len() / 2;
        warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
        queue.drain(0..evict_count);
    }
    queue.push(event);
}

/// Event queue owned by the app; cloned handles share one queue.
#[derive(Clone, Default)]
pub struct EventBus {
    queue: Queue,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("queue_len", &self.queue_len()).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit<E: Event>(&self, event: E) {
        push_bounded(&self.queue, Box::new(event));
    }

    /// Queue an already boxed event (widget action queues).
    pub fn emit_boxed(&self, event: BoxedEvent) {
        push_bounded(&self.queue, event);
    }

    /// Drain all events emitted since the last poll, oldest first.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Emitter handle for the editing session.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter { inner: Some(Arc::clone(&self.queue)) }
    }

    pub fn clear(&self) {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Emitter handle. The default (detached) emitter drops events, which is
/// what headless sessions and tests want.
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Option<Queue>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").field("attached", &self.inner.is_some()).finish()
    }
}

impl EventEmitter {
    pub fn detached() -> Self {
        Self { inner: None }
    }

    pub fn emit<E: Event>(&self, event: E) {
        if let Some(ref queue) = self.inner {
            push_bounded(queue, Box::new(event));
        }
    }
}

/// Helper: downcast BoxedEvent to concrete type
///
/// Must deref to `dyn Event` before calling `as_any()`, otherwise the blanket
/// impl for `Box<dyn Event>` answers and the downcast always fails.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct TestEvent {
        value: i32,
    }

    #[derive(Clone, Debug)]
    struct OtherEvent;

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();
        bus.emit(TestEvent { value: 1 });
        bus.emit(OtherEvent);

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(downcast_event::<TestEvent>(&events[0]).map(|e| e.value), Some(1));
        assert!(downcast_event::<TestEvent>(&events[1]).is_none());
        assert!(downcast_event::<OtherEvent>(&events[1]).is_some());
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_emitter_shares_queue() {
        let bus = EventBus::new();
        let emitter = bus.emitter();
        emitter.emit(TestEvent { value: 42 });
        assert_eq!(bus.queue_len(), 1);
    }

    #[test]
    fn test_emit_boxed_keeps_type() {
        let bus = EventBus::new();
        let boxed: BoxedEvent = Box::new(TestEvent { value: 7 });
        bus.emit_boxed(boxed);
        let events = bus.poll();
        assert_eq!(downcast_event::<TestEvent>(&events[0]).map(|e| e.value), Some(7));
    }

    #[test]
    fn test_detached_emitter_drops() {
        let emitter = EventEmitter::detached();
        emitter.emit(TestEvent { value: 1 });
        let bus = EventBus::new();
        assert_eq!(bus.queue_len(), 0);
    }

    #[test]
    fn test_eviction() {
        let bus = EventBus::new();
        for i in 0..(MAX_QUEUE_SIZE as i32 + 10) {
            bus.emit(TestEvent { value: i });
        }
        let events = bus.poll();
        assert!(events.len() <= MAX_QUEUE_SIZE);
        let last = events.last().and_then(downcast_event::<TestEvent>).map(|e| e.value);
        assert_eq!(last, Some(MAX_QUEUE_SIZE as i32 + 9));
    }
}
