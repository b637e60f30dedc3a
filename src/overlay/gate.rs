use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// One-shot readiness flag. Once opened it stays open.
#[derive(Debug, Default)]
pub struct LoadingGate {
    ready: Mutex<bool>,
    cvar: Condvar,
}

impl LoadingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake every waiter. Opening twice is harmless.
    pub fn open(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        *ready = true;
        self.cvar.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the gate opens or `timeout` passes; returns readiness.
    /// The event loop polls `is_ready` instead so it keeps drawing; worker threads may block here.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        let (ready, _) = self
            .cvar
            .wait_timeout_while(guard, timeout, |ready| !*ready)
            .unwrap_or_else(PoisonError::into_inner);
        *ready
    }
}
