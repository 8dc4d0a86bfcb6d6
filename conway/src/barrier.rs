// barrier.rs - Reusable two-phase rendezvous for a fixed set of workers
//
// Phase 1 (arrival) separates "everyone finished reading" from the commit,
// phase 2 (departure) separates "everyone finished writing" from the next
// generation's reads. Each phase has its own counter and epoch; the last
// party to arrive resets the counter and bumps the epoch, and waiters sleep
// until the epoch moves. No external reset is ever needed.

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::warn;

use crate::error::BarrierError;

/// Observable position in the barrier's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierPhase {
    /// No party is inside the barrier.
    Idle,
    /// Some, but not all, parties have called `phase1`.
    ArrivalFilling,
    /// Phase 1 released; nobody has reached `phase2` yet.
    Computed,
    /// Some, but not all, parties have called `phase2`.
    DepartureFilling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    leader: bool,
}

impl BarrierWaitResult {
    /// True for exactly one party per phase: the one whose arrival released the rest.
    pub fn is_leader(&self) -> bool {
        self.leader
    }
}

#[derive(Debug, Default)]
struct Turnstile {
    count: usize,
    epoch: u64,
}

#[derive(Debug)]
struct State {
    arrival:   Turnstile,
    departure: Turnstile,
    verdict:   bool,
    abandoned: bool,
}

#[derive(Debug)]
pub struct Barrier {
    parties: usize,
    state:   Mutex<State>,
    cvar:    Condvar,
}

impl Barrier {
    /// # Panics
    /// If `parties` is zero.
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "a barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(State {
                arrival:   Turnstile::default(),
                departure: Turnstile::default(),
                verdict:   true,
                abandoned: false,
            }),
            cvar: Condvar::new(),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until all parties have finished computing.
    pub fn phase1(&self) -> Result<BarrierWaitResult, BarrierError> {
        let mut state = self.state.lock();
        if state.abandoned {
            return Err(BarrierError::Abandoned);
        }

        state.arrival.count += 1;
        if state.arrival.count == self.parties {
            state.arrival.count = 0;
            state.arrival.epoch += 1;
            self.cvar.notify_all();
            return Ok(BarrierWaitResult { leader: true });
        }

        let epoch = state.arrival.epoch;
        while state.arrival.epoch == epoch {
            if state.abandoned {
                return Err(BarrierError::Abandoned);
            }
            self.cvar.wait(&mut state);
        }
        Ok(BarrierWaitResult { leader: false })
    }

    /// Block until all parties have finished committing.
    pub fn phase2(&self) -> Result<BarrierWaitResult, BarrierError> {
        let mut leader = false;
        self.depart(|| {
            leader = true;
            true
        })?;
        Ok(BarrierWaitResult { leader })
    }

    /// Phase 2, where the releasing party runs `decide` before anyone leaves
    /// and every party receives its answer. Used to agree on whether another
    /// generation runs, so no worker can stop while its peers carry on.
    ///
    /// `decide` runs without the barrier's lock held and may block; the
    /// barrier reports `DepartureFilling` and can be abandoned meanwhile.
    pub fn phase2_with<F>(&self, decide: F) -> Result<bool, BarrierError>
    where
        F: FnOnce() -> bool,
    {
        self.depart(decide)
    }

    fn depart<F>(&self, decide: F) -> Result<bool, BarrierError>
    where
        F: FnOnce() -> bool,
    {
        let mut state = self.state.lock();
        if state.abandoned {
            return Err(BarrierError::Abandoned);
        }

        state.departure.count += 1;
        if state.departure.count == self.parties {
            // Peers stay parked on the unchanged epoch until the verdict lands.
            let verdict = MutexGuard::unlocked(&mut state, decide);
            state.verdict = verdict;
            state.departure.count = 0;
            state.departure.epoch += 1;
            self.cvar.notify_all();
            if state.abandoned {
                return Err(BarrierError::Abandoned);
            }
            return Ok(verdict);
        }

        let epoch = state.departure.epoch;
        while state.departure.epoch == epoch {
            if state.abandoned {
                return Err(BarrierError::Abandoned);
            }
            self.cvar.wait(&mut state);
        }
        Ok(state.verdict)
    }

    /// Full rendezvous: phase 1 then phase 2.
    pub fn wait(&self) -> Result<BarrierWaitResult, BarrierError> {
        let first = self.phase1()?;
        self.phase2()?;
        Ok(first)
    }

    /// Permanently break the barrier; current and future waiters get `Abandoned`.
    pub fn abandon(&self) {
        let mut state = self.state.lock();
        if !state.abandoned {
            warn!(parties = self.parties, "barrier abandoned");
            state.abandoned = true;
            self.cvar.notify_all();
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.lock().abandoned
    }

    pub fn phase(&self) -> BarrierPhase {
        let state = self.state.lock();
        if state.arrival.count > 0 {
            BarrierPhase::ArrivalFilling
        } else if state.departure.count > 0 {
            BarrierPhase::DepartureFilling
        } else if state.arrival.epoch > state.departure.epoch {
            BarrierPhase::Computed
        } else {
            BarrierPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_party_never_blocks() {
        let barrier = Barrier::new(1);
        for _ in 0..3 {
            assert!(barrier.phase1().unwrap().is_leader());
            assert_eq!(barrier.phase(), BarrierPhase::Computed);
            assert!(barrier.phase2().unwrap().is_leader());
            assert_eq!(barrier.phase(), BarrierPhase::Idle);
        }
    }

    #[test]
    fn phases_keep_parties_in_lockstep() {
        const PARTIES: usize = 8;
        const ROUNDS: usize = 200;

        let barrier = Arc::new(Barrier::new(PARTIES));
        let computed = Arc::new(AtomicUsize::new(0));
        let committed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..PARTIES)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let computed = Arc::clone(&computed);
                let committed = Arc::clone(&committed);
                thread::spawn(move || {
                    let mut leaders = 0;
                    for round in 0..ROUNDS {
                        computed.fetch_add(1, Ordering::SeqCst);
                        if barrier.phase1().unwrap().is_leader() {
                            leaders += 1;
                        }
                        // Nobody can be past phase 1 of this round yet, nor still computing.
                        assert_eq!(computed.load(Ordering::SeqCst), (round + 1) * PARTIES);

                        committed.fetch_add(1, Ordering::SeqCst);
                        barrier.phase2().unwrap();
                        assert_eq!(committed.load(Ordering::SeqCst), (round + 1) * PARTIES);
                    }
                    leaders
                })
            })
            .collect();

        let leaders: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(leaders, ROUNDS);
        assert_eq!(barrier.phase(), BarrierPhase::Idle);
    }

    #[test]
    fn verdict_reaches_every_party() {
        const PARTIES: usize = 4;
        let barrier = Arc::new(Barrier::new(PARTIES));
        let decisions = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..PARTIES)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let decisions = Arc::clone(&decisions);
                thread::spawn(move || {
                    let mut rounds = 0;
                    loop {
                        barrier.phase1().unwrap();
                        rounds += 1;
                        let go_on = barrier
                            .phase2_with(|| decisions.fetch_add(1, Ordering::SeqCst) < 4)
                            .unwrap();
                        if !go_on {
                            break rounds;
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 5);
        }
        assert_eq!(decisions.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn abandon_releases_waiters() {
        let barrier = Arc::new(Barrier::new(3));
        let waiter = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.phase1())
        };

        while barrier.phase() != BarrierPhase::ArrivalFilling {
            thread::sleep(Duration::from_millis(1));
        }
        barrier.abandon();

        assert_eq!(waiter.join().unwrap(), Err(BarrierError::Abandoned));
        assert!(barrier.is_abandoned());
        assert_eq!(barrier.phase2(), Err(BarrierError::Abandoned));
    }

    #[test]
    fn wait_reuses_across_rounds() {
        const PARTIES: usize = 4;
        let barrier = Arc::new(Barrier::new(PARTIES));
        let handles: Vec<_> = (0..PARTIES)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || (0..50).filter(|_| barrier.wait().unwrap().is_leader()).count())
            })
            .collect();

        let leaders: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(leaders, 50);
        assert_eq!(barrier.phase(), BarrierPhase::Idle);
    }

    #[test]
    fn slow_decision_leaves_the_barrier_observable() {
        let barrier = Arc::new(Barrier::new(1));
        let (go, gate) = mpsc::channel::<()>();
        let leader = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.phase2_with(move || gate.recv().is_ok()))
        };

        // Each of these takes the state lock; they return while `decide` is still blocked.
        while barrier.phase() != BarrierPhase::DepartureFilling {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!barrier.is_abandoned());

        go.send(()).unwrap();
        assert_eq!(leader.join().unwrap(), Ok(true));
        assert_eq!(barrier.phase(), BarrierPhase::Idle);
    }

    #[test]
    fn abandon_during_decision_fails_the_leader() {
        let barrier = Arc::new(Barrier::new(1));
        let (go, gate) = mpsc::channel::<()>();
        let leader = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.phase2_with(move || gate.recv().is_ok()))
        };

        while barrier.phase() != BarrierPhase::DepartureFilling {
            thread::sleep(Duration::from_millis(1));
        }
        barrier.abandon();
        go.send(()).unwrap();

        assert_eq!(leader.join().unwrap(), Err(BarrierError::Abandoned));
    }
}
