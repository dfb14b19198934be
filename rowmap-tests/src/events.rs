use rowmap::{DataMap, EventEmitter};
use std::sync::Mutex;

/// Remembers the name of every emitted event.
#[derive(Default, Debug)]
pub struct RecordingEvents {
    emitted: Mutex<Vec<String>>,
}

impl RecordingEvents {
    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl EventEmitter for RecordingEvents {
    fn emit(&self, event: &str, _payload: &DataMap) {
        if let Ok(mut emitted) = self.emitted.lock() {
            emitted.push(event.to_string());
        }
    }
}
