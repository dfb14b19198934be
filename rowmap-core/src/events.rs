use crate::DataMap;

/// Sink for the events raised by the [`EntityManager`](crate::EntityManager).
///
/// Emission is fire and forget, the sink cannot influence the operation.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &str, payload: &DataMap);
}

/// Discards every event.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoopEvents;

impl EventEmitter for NoopEvents {
    fn emit(&self, event: &str, _payload: &DataMap) {
        log::trace!("Event `{event}` discarded");
    }
}
