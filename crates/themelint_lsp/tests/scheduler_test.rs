use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;
use tower_lsp::lsp_types::Url;

use themelint_lsp::{RunChecks, RunScheduler};

const DELAY: Duration = Duration::from_millis(100);

/// Records runs; each run waits for a permit before finishing.
struct Recorder {
    started: Mutex<Vec<Vec<String>>>,
    finished: Mutex<Vec<Vec<String>>>,
    gate: Semaphore,
}

impl Recorder {
    fn open() -> Arc<Self> {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    fn gated() -> Arc<Self> {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            gate: Semaphore::new(permits),
        })
    }

    fn started(&self) -> Vec<Vec<String>> {
        self.started.lock().clone()
    }

    fn finished(&self) -> Vec<Vec<String>> {
        self.finished.lock().clone()
    }
}

#[async_trait]
impl RunChecks for Recorder {
    async fn run_checks(&self, uris: BTreeSet<Url>) {
        let names: Vec<String> = uris
            .iter()
            .filter_map(|uri| uri.path_segments()?.next_back().map(str::to_string))
            .collect();
        self.started.lock().push(names.clone());
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        self.finished.lock().push(names);
    }
}

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///theme/snippets/{name}")).unwrap()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_rapid_schedules_coalesce_into_one_run() {
    let recorder = Recorder::open();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    for _ in 0..5 {
        scheduler.schedule([uri("a.liquid")]);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(recorder.finished(), vec![names(&["a.liquid"])]);
}

#[tokio::test(start_paused = true)]
async fn test_pending_uris_are_merged() {
    let recorder = Recorder::open();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    scheduler.schedule([uri("a.liquid")]);
    scheduler.schedule([uri("b.liquid")]);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(recorder.finished(), vec![names(&["a.liquid", "b.liquid"])]);
}

#[tokio::test(start_paused = true)]
async fn test_force_run_includes_pending_uris() {
    let recorder = Recorder::open();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    scheduler.schedule([uri("a.liquid")]);
    scheduler.force_run([uri("b.liquid")]).await;

    // The forced run completed before returning, without time passing.
    assert_eq!(recorder.finished(), vec![names(&["a.liquid", "b.liquid"])]);
    assert!(!scheduler.is_pending());

    // The cancelled timer does not run a second time.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(recorder.finished().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_run_with_nothing_pending() {
    let recorder = Recorder::open();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    scheduler.force_run([uri("c.liquid")]).await;

    assert_eq!(recorder.finished(), vec![names(&["c.liquid"])]);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_after_force_starts_a_new_timer() {
    let recorder = Recorder::open();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    scheduler.force_run([uri("a.liquid")]).await;
    scheduler.schedule([uri("b.liquid")]);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        recorder.finished(),
        vec![names(&["a.liquid"]), names(&["b.liquid"])]
    );
}

#[tokio::test(start_paused = true)]
async fn test_force_run_waits_for_the_running_timer_run() {
    let recorder = Recorder::gated();
    let scheduler = Arc::new(RunScheduler::new(Arc::clone(&recorder), DELAY));

    scheduler.schedule([uri("a.liquid")]);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(recorder.started(), vec![names(&["a.liquid"])]);

    let forced = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.force_run([uri("b.liquid")]).await }
    });
    tokio::task::yield_now().await;

    // Runs never overlap.
    assert_eq!(recorder.started().len(), 1);

    recorder.gate.add_permits(2);
    forced.await.unwrap();

    assert_eq!(
        recorder.finished(),
        vec![names(&["a.liquid"]), names(&["b.liquid"])]
    );
}

#[tokio::test(start_paused = true)]
async fn test_edits_during_a_run_get_their_own_run() {
    let recorder = Recorder::gated();
    let scheduler = RunScheduler::new(Arc::clone(&recorder), DELAY);

    scheduler.schedule([uri("a.liquid")]);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(recorder.started().len(), 1);

    scheduler.schedule([uri("b.liquid")]);
    tokio::time::sleep(Duration::from_millis(150)).await;

    recorder.gate.add_permits(2);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        recorder.finished(),
        vec![names(&["a.liquid"]), names(&["b.liquid"])]
    );
}
