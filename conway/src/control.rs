// control.rs - Stop and pacing signals for a running simulation
//
// Polled only at generation boundaries, by the one worker that releases
// phase 2, so a stop never interrupts a compute or commit in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// How generations are admitted once a run has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Run back to back.
    #[default]
    Free,
    /// Each generation waits for a `notify_next_generation` permit.
    Stepped,
}

#[derive(Debug, Default)]
pub(crate) struct RunControl {
    stop:    AtomicBool,
    permits: Mutex<u64>,
    cvar:    Condvar,
}

impl RunControl {
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Take the lock so a waiter between its check and its wait cannot miss this.
        let _permits = self.permits.lock();
        self.cvar.notify_all();
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub(crate) fn notify_next_generation(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.cvar.notify_all();
    }

    pub(crate) fn pending_permits(&self) -> u64 {
        *self.permits.lock()
    }

    /// Forget the finished run's stop request and unused permits.
    pub(crate) fn reset(&self) {
        let mut permits = self.permits.lock();
        *permits = 0;
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Whether the next generation may run. In stepped mode this blocks
    /// until a permit arrives or a stop is requested.
    pub(crate) fn admit(&self, pacing: Pacing) -> bool {
        if self.stop_requested() {
            return false;
        }
        match pacing {
            Pacing::Free => true,
            Pacing::Stepped => {
                let mut permits = self.permits.lock();
                while *permits == 0 && !self.stop_requested() {
                    self.cvar.wait(&mut permits);
                }
                if self.stop_requested() {
                    return false;
                }
                *permits -= 1;
                true
            }
        }
    }
}

/// Cloneable handle for collaborators outside the run (UI, signal handlers).
#[derive(Debug, Clone, Default)]
pub struct RunHandle {
    pub(crate) control: Arc<RunControl>,
}

impl RunHandle {
    /// Ask the run to finish at the next generation boundary. Holds until
    /// the current (or next) run ends.
    pub fn stop(&self) {
        self.control.request_stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.control.stop_requested()
    }

    /// Admit one more generation of a stepped run.
    pub fn notify_next_generation(&self) {
        self.control.notify_next_generation();
    }

    /// Permits granted but not yet consumed.
    pub fn pending_generations(&self) -> u64 {
        self.control.pending_permits()
    }
}
