//! Debounced check runs.
//!
//! Edits call [`RunScheduler::schedule`], which collects the edited uris and
//! (re)starts a timer; when the timer fires, one run covers every uri
//! collected so far. File-system events call [`RunScheduler::force_run`],
//! which takes whatever is pending and runs immediately, so nothing scheduled
//! before it is lost.
//!
//! Runs never overlap: each one holds the run lock until it completes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::Url;
use tracing::debug;

/// Default debounce delay.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Work executed when the scheduler fires.
#[async_trait]
pub trait RunChecks: Send + Sync + 'static {
    /// Re-checks everything affected by `uris`.
    async fn run_checks(&self, uris: BTreeSet<Url>);
}

#[async_trait]
impl<T: RunChecks + ?Sized> RunChecks for Arc<T> {
    async fn run_checks(&self, uris: BTreeSet<Url>) {
        (**self).run_checks(uris).await;
    }
}

enum State {
    Idle,
    Pending {
        timer: JoinHandle<()>,
        uris: BTreeSet<Url>,
        generation: u64,
    },
}

struct Inner<R> {
    target: R,
    delay: Mutex<Duration>,
    state: Mutex<State>,
    generations: AtomicU64,
    run_lock: tokio::sync::Mutex<()>,
}

/// Coalesces run requests.
pub struct RunScheduler<R> {
    inner: Arc<Inner<R>>,
}

impl<R: RunChecks> RunScheduler<R> {
    pub fn new(target: R, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                delay: Mutex::new(delay),
                state: Mutex::new(State::Idle),
                generations: AtomicU64::new(0),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn target(&self) -> &R {
        &self.inner.target
    }

    pub fn delay(&self) -> Duration {
        *self.inner.delay.lock()
    }

    /// Changes the delay used by later calls to `schedule`.
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock() = delay;
    }

    /// Returns true while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Pending { .. })
    }

    /// Adds `uris` to the pending set and restarts the timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, uris: impl IntoIterator<Item = Url>) {
        let delay = self.delay();

        let mut state = self.inner.state.lock();
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = take_pending(&mut state);
        pending.extend(uris);
        debug!("Scheduling check run for {} uris in {:?}", pending.len(), delay);

        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(generation).await;
        });
        *state = State::Pending {
            timer,
            uris: pending,
            generation,
        };
    }

    /// Cancels the timer and runs the pending uris plus `uris` now.
    ///
    /// Returns once the run has completed.
    pub async fn force_run(&self, uris: impl IntoIterator<Item = Url>) {
        let mut pending = take_pending(&mut self.inner.state.lock());
        pending.extend(uris);
        debug!("Forcing check run for {} uris", pending.len());
        self.inner.execute(pending).await;
    }
}

/// Moves the state to `Idle`, aborting the timer and returning its uris.
fn take_pending(state: &mut State) -> BTreeSet<Url> {
    match std::mem::replace(state, State::Idle) {
        State::Idle => BTreeSet::new(),
        State::Pending { timer, uris, .. } => {
            // The timer has not taken its uris yet, so aborting it loses nothing.
            timer.abort();
            uris
        }
    }
}

impl<R: RunChecks> Inner<R> {
    async fn fire(&self, generation: u64) {
        let uris = {
            let mut state = self.state.lock();
            match &*state {
                State::Pending {
                    generation: current,
                    ..
                } if *current == generation => {}
                _ => return,
            }
            match std::mem::replace(&mut *state, State::Idle) {
                State::Pending { uris, .. } => uris,
                State::Idle => return,
            }
        };
        self.execute(uris).await;
    }

    async fn execute(&self, uris: BTreeSet<Url>) {
        if uris.is_empty() {
            return;
        }
        let _running = self.run_lock.lock().await;
        self.target.run_checks(uris).await;
    }
}
