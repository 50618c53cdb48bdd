//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative transport implementations.

use super::{DeviceEvent, DiagnosticEvent, SessionEvent};

/// Trait for emitting domain events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct MyService {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyService {
///     fn do_something(&self) {
///         self.emitter.emit_session(SessionEvent::PickerOpened { ... });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a session state event.
    fn emit_session(&self, event: SessionEvent);

    /// Emits a device discovery/connection event.
    fn emit_device(&self, event: DeviceEvent);

    /// Emits a diagnostic event.
    fn emit_diagnostic(&self, event: DiagnosticEvent);
}

/// No-op emitter for embedding or testing.
///
/// Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_session(&self, _event: SessionEvent) {}

    fn emit_device(&self, _event: DeviceEvent) {}

    fn emit_diagnostic(&self, _event: DiagnosticEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_session(&self, event: SessionEvent) {
        tracing::debug!(?event, "session_event");
    }

    fn emit_device(&self, event: DeviceEvent) {
        tracing::debug!(?event, "device_event");
    }

    fn emit_diagnostic(&self, event: DiagnosticEvent) {
        tracing::debug!(?event, "diagnostic_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        session_count: AtomicUsize,
        diagnostic_count: AtomicUsize,
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_session(&self, _event: SessionEvent) {
            self.session_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_device(&self, _event: DeviceEvent) {}

        fn emit_diagnostic(&self, _event: DiagnosticEvent) {
            self.diagnostic_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter {
            session_count: AtomicUsize::new(0),
            diagnostic_count: AtomicUsize::new(0),
        });

        emitter.emit_session(SessionEvent::PickerOpened { timestamp: 0 });
        emitter.emit_session(SessionEvent::PickerClosed { timestamp: 0 });
        emitter.emit_diagnostic(DiagnosticEvent::TargetUnavailable {
            reason: "gone".to_string(),
            timestamp: 0,
        });

        assert_eq!(emitter.session_count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.diagnostic_count.load(Ordering::SeqCst), 1);
    }
}
