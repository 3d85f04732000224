//! The frontier manager: single-task event loop and worker-facing handle
//!
//! One spawned task owns every work queue, counter, the journal, and the
//! already-seen filter; no lock guards any of them. Workers and operators
//! interact through two bounded channels plus the dispatch gate:
//!
//! - the inbound command channel carries `schedule`, `finished`, and state
//!   requests into the manager, in FIFO order;
//! - the outbound channel carries ready-to-fetch CrawlURIs to workers, its
//!   small capacity limiting how far dispatch can run ahead of politeness;
//! - the gate lets the manager halt all outbound consumption during PAUSE
//!   and FINISH without draining the channel.

use crate::checkpoint::{CounterSnapshot, FrontierSnapshot, QueueSnapshot, UriSnapshot};
use crate::config::FrontierConfig;
use crate::frontier::gate::DispatchGate;
use crate::frontier::politeness::{needs_retrying, politeness_wait};
use crate::frontier::precedence::{BasePrecedencePolicy, PrecedencePolicy};
use crate::frontier::topology::{QueueTopology, ReadySnoozedTopology};
use crate::journal::{Journal, JournalRecord};
use crate::model::{AttributeRegistry, CrawlURI, FetchStatus};
use crate::seen::SeenFilter;
use crate::url::{canonicalize, QueueAssignmentPolicy};
use crate::{Result, ShioriError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex, OwnedRwLockWriteGuard};
use tokio::time::Instant;

/// How long a worker's outbound receive waits before releasing the gate so a
/// pending pause can proceed
const RECEIVE_POLL: Duration = Duration::from_millis(100);

/// Frontier lifecycle states
///
/// `Hold` is accepted as a target and treated identically to `Pause`.
/// `Finish` is terminal: once reached the manager task exits and the
/// frontier cannot be restarted in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    Run,
    Hold,
    Pause,
    Finish,
}

impl std::fmt::Display for FrontierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrontierState::Run => "RUN",
            FrontierState::Hold => "HOLD",
            FrontierState::Pause => "PAUSE",
            FrontierState::Finish => "FINISH",
        };
        write!(f, "{name}")
    }
}

/// Commands carried on the inbound channel
enum Command {
    Schedule(Box<CrawlURI>),
    Finished(Box<CrawlURI>),
    RequestState(FrontierState),
    Checkpoint {
        dir: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
    Report(oneshot::Sender<String>),
}

/// Lifetime progress counters, readable lock-free from any thread
///
/// `queued` counts URIs admitted but not yet terminally finished, so retries
/// and re-emits do not perturb it.
#[derive(Debug, Default)]
pub struct FrontierCounters {
    queued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    disregarded: AtomicU64,
}

impl FrontierCounters {
    fn from_snapshot(snapshot: CounterSnapshot) -> Self {
        Self {
            queued: AtomicU64::new(snapshot.queued),
            succeeded: AtomicU64::new(snapshot.succeeded),
            failed: AtomicU64::new(snapshot.failed),
            disregarded: AtomicU64::new(snapshot.disregarded),
        }
    }

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            queued: self.queued(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            disregarded: self.disregarded(),
        }
    }

    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn disregarded(&self) -> u64 {
        self.disregarded.load(Ordering::Relaxed)
    }

    /// Terminally finished URIs: succeeded + failed + disregarded
    pub fn finished(&self) -> u64 {
        self.succeeded() + self.failed() + self.disregarded()
    }
}

struct Manager {
    config: FrontierConfig,
    config_hash: Option<String>,
    registry: AttributeRegistry,
    assignment: QueueAssignmentPolicy,
    precedence: BasePrecedencePolicy,
    topology: Box<dyn QueueTopology>,
    seen: Box<dyn SeenFilter>,
    journal: Option<Journal>,
    inbound_rx: mpsc::Receiver<Command>,
    outbound_tx: mpsc::Sender<CrawlURI>,
    outbound_rx: Arc<Mutex<mpsc::Receiver<CrawlURI>>>,
    outbound_capacity: usize,
    gate: DispatchGate,
    gate_guard: Option<OwnedRwLockWriteGuard<()>>,
    state_tx: watch::Sender<FrontierState>,
    target: FrontierState,
    counters: Arc<FrontierCounters>,
    next_ordinal: u64,
}

impl Manager {
    async fn run(mut self) {
        tracing::info!("frontier manager started");
        loop {
            let step = match self.target {
                FrontierState::Run => self.run_step().await,
                FrontierState::Pause | FrontierState::Hold => self.pause_step().await,
                FrontierState::Finish => {
                    if let Err(e) = self.finish_step().await {
                        tracing::error!(error = %e, "error while finishing");
                    }
                    break;
                }
            };

            // Fail-safe: an unexpected error pauses the crawl rather than
            // killing the manager
            if let Err(e) = step {
                tracing::error!(error = %e, "manager step failed, pausing");
                self.target = FrontierState::Pause;
            }
        }
        self.shutdown();
    }

    /// One RUN iteration: dispatch eligible work, then digest commands
    async fn run_step(&mut self) -> Result<()> {
        self.gate_guard = None;
        self.announce(FrontierState::Run);
        self.refill_outbound()?;

        // Block for a command, but no longer than the soonest queue wake so
        // snoozed queues become eligible promptly
        let next_wake = self.topology.next_wake(Instant::now());
        let received = match next_wake {
            Some(wake) => match tokio::time::timeout_at(wake, self.inbound_rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(()),
            },
            None => self.inbound_rx.recv().await,
        };

        let Some(command) = received else {
            tracing::info!("all frontier handles dropped, finishing");
            self.target = FrontierState::Finish;
            return Ok(());
        };
        self.handle(command)?;
        while let Ok(command) = self.inbound_rx.try_recv() {
            self.handle(command)?;
        }

        if self.counters.queued() == 0 {
            tracing::info!("no URIs queued, pausing");
            self.target = FrontierState::Pause;
        }
        Ok(())
    }

    /// One PAUSE/HOLD iteration: dispatch disabled, digest commands, announce
    /// the pause once outbound and in-process counts agree
    async fn pause_step(&mut self) -> Result<()> {
        if self.gate_guard.is_none() {
            self.gate_guard = Some(self.gate.disable().await);
        }

        if self.outbound_len() as u64 == self.topology.in_flight_count() {
            self.announce(self.target);
        }

        let Some(command) = self.inbound_rx.recv().await else {
            self.target = FrontierState::Finish;
            return Ok(());
        };
        self.handle(command)?;
        while let Ok(command) = self.inbound_rx.try_recv() {
            self.handle(command)?;
        }
        Ok(())
    }

    /// Terminal drain: settle all in-process work, then exit
    async fn finish_step(&mut self) -> Result<()> {
        if self.gate_guard.is_none() {
            self.gate_guard = Some(self.gate.disable().await);
        }

        while self.topology.in_flight_count() > self.outbound_len() as u64 {
            let Some(command) = self.inbound_rx.recv().await else {
                break;
            };
            self.handle(command)?;
        }

        self.announce(FrontierState::Finish);
        Ok(())
    }

    fn shutdown(mut self) {
        if let Some(journal) = self.journal.take() {
            if let Err(e) = journal.close() {
                tracing::error!(error = %e, "failed to close journal");
            }
        }
        if let Err(e) = self.seen.close() {
            tracing::error!(error = %e, "failed to close seen filter");
        }
        tracing::info!(
            succeeded = self.counters.succeeded(),
            failed = self.counters.failed(),
            disregarded = self.counters.disregarded(),
            "frontier manager exited"
        );
    }

    fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Schedule(curi) => self.handle_schedule(*curi),
            Command::Finished(curi) => self.handle_finished(*curi),
            Command::RequestState(state) => {
                if self.target == FrontierState::Finish {
                    tracing::debug!(requested = %state, "state request after FINISH ignored");
                } else {
                    tracing::info!(target_state = %state, "state requested");
                    self.target = state;
                }
                Ok(())
            }
            Command::Checkpoint { dir, reply } => {
                let result = self.handle_checkpoint(&dir);
                let _ = reply.send(result);
                Ok(())
            }
            Command::Report(reply) => {
                let _ = reply.send(self.report());
                Ok(())
            }
        }
    }

    /// Admission: canonicalize, consult the seen filter, assign identity,
    /// journal, enqueue
    fn handle_schedule(&mut self, mut curi: CrawlURI) -> Result<()> {
        let canonical = canonicalize(curi.uri());
        let first_sighting = self.seen.admit(&canonical)?;
        if !first_sighting && !curi.force_fetch {
            tracing::debug!(uri = %curi, "already seen, dropped");
            return Ok(());
        }

        let key = match self.assignment.class_key(curi.uri()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(target: "shiori::uri_errors", uri = %curi, error = %e, "unassignable URI dropped");
                return Ok(());
            }
        };

        curi.set_class_key(key.clone());
        curi.assign_ordinal(self.next_ordinal);
        self.next_ordinal += 1;
        let precedence = self.precedence.queue_created(&key);
        curi.precedence = precedence;

        self.journal_write(JournalRecord::added(&curi))?;
        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(uri = %curi, ordinal = curi.ordinal(), key = %key, "scheduled");
        self.topology.enqueue(curi, precedence);
        Ok(())
    }

    /// Outcome processing: retry, or journal terminally and snooze the queue
    fn handle_finished(&mut self, mut curi: CrawlURI) -> Result<()> {
        let Some(key) = curi.class_key().map(str::to_owned) else {
            tracing::warn!(uri = %curi, "finished report without class key ignored");
            return Ok(());
        };
        let now = Instant::now();

        curi.fetch_attempts += 1;
        if curi.fetch_status == FetchStatus::Deferred {
            curi.deferrals += 1;
        }

        // No politeness snooze for outcomes decided before any network
        // activity (no fetch timing)
        let politeness = curi
            .fetch_duration_ms()
            .map(|ms| politeness_wait(ms, curi.content_size, &self.config.politeness));

        if needs_retrying(&curi, &self.config.retry) {
            self.journal_write(JournalRecord::rescheduled(&curi))?;
            let retry_delay = Duration::from_secs(self.config.retry.retry_delay_seconds);
            let wait = politeness.map_or(retry_delay, |p| p.max(retry_delay));
            tracing::debug!(uri = %curi, attempts = curi.fetch_attempts, "rescheduled for retry");
            curi.processing_cleanup(&self.registry);
            self.topology.finish(&key, Some(curi), Some(now + wait), now);
            return Ok(());
        }

        // A retryable status that ran out of attempts becomes a permanent
        // failure
        let exhausted_transient = curi.fetch_status.is_transient()
            || (curi.fetch_status == FetchStatus::HttpError(401) && curi.retry_with_credentials);
        if exhausted_transient {
            curi.fetch_status = FetchStatus::TooManyRetries;
        }

        if curi.fetch_status.is_success() {
            self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            self.journal_write(JournalRecord::finished_success(&curi))?;
        } else if curi.fetch_status.is_disregarded() {
            self.counters.disregarded.fetch_add(1, Ordering::Relaxed);
            self.journal_write(JournalRecord::finished_disregard(&curi))?;
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            self.journal_write(JournalRecord::finished_failure(&curi))?;
        }
        self.counters.queued.fetch_sub(1, Ordering::Relaxed);
        tracing::debug!(uri = %curi, status = %curi.fetch_status, "finished");

        self.topology
            .finish(&key, None, politeness.map(|p| now + p), now);
        Ok(())
    }

    /// Fills the outbound channel with eligible URIs until it is full or no
    /// queue is ready
    fn refill_outbound(&mut self) -> Result<()> {
        loop {
            let Ok(permit) = self.outbound_tx.try_reserve() else {
                return Ok(());
            };
            let Some(curi) = self.topology.find_eligible(Instant::now()) else {
                return Ok(());
            };
            if let Some(journal) = &mut self.journal {
                journal.write(&JournalRecord::emitted(&curi))?;
            }
            tracing::debug!(uri = %curi, "emitted");
            permit.send(curi);
        }
    }

    /// Snapshot to `dir`. Requires a paused, fully settled frontier; URIs
    /// pre-staged on the outbound channel are pulled back into their queues
    /// first so the snapshot sees all pending work.
    fn handle_checkpoint(&mut self, dir: &Path) -> Result<()> {
        if self.gate_guard.is_none() {
            return Err(ShioriError::NotPaused);
        }
        self.reclaim_outbound()?;
        if self.topology.in_flight_count() > 0 {
            return Err(ShioriError::NotPaused);
        }

        if let Some(journal) = &mut self.journal {
            journal.flush()?;
        }
        self.seen.close()?;

        let queues = self
            .topology
            .export()
            .into_iter()
            .map(|q| QueueSnapshot {
                key: q.key,
                precedence: q.precedence,
                items: q.items.iter().map(UriSnapshot::from_curi).collect(),
            })
            .collect();

        let journal_path = match &self.journal {
            Some(journal) => journal.path().display().to_string(),
            None => self.config.journal.path.clone(),
        };
        let snapshot = FrontierSnapshot::new(
            self.config_hash.clone(),
            journal_path,
            self.next_ordinal,
            self.counters.snapshot(),
            queues,
        );
        snapshot.save(dir)?;
        tracing::info!(dir = %dir.display(), uris = snapshot.uri_count(), "checkpoint written");
        Ok(())
    }

    /// Returns channel-resident URIs to their queues. Only callable while
    /// the gate is held, so no worker is racing for the receiver.
    fn reclaim_outbound(&mut self) -> Result<()> {
        let mut rx = self
            .outbound_rx
            .try_lock()
            .map_err(|_| ShioriError::NotPaused)?;
        let now = Instant::now();
        while let Ok(curi) = rx.try_recv() {
            if let Some(key) = curi.class_key().map(str::to_owned) {
                self.topology.finish(&key, Some(curi), None, now);
            }
        }
        Ok(())
    }

    fn outbound_len(&self) -> usize {
        self.outbound_capacity - self.outbound_tx.capacity()
    }

    fn journal_write(&mut self, record: JournalRecord) -> Result<()> {
        if let Some(journal) = &mut self.journal {
            journal.write(&record)?;
        }
        Ok(())
    }

    /// Publishes a reached state, suppressing duplicate announcements
    fn announce(&self, state: FrontierState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            tracing::info!(state = %state, "frontier reached state");
        }
    }

    fn report(&self) -> String {
        let stats = self.topology.stats();
        let seen = self.seen.count().unwrap_or(0);
        format!(
            "Frontier report\n\
             ---------------\n\
             Target state:      {}\n\
             Last reached:      {}\n\
             Queued URIs:       {}\n\
             Succeeded fetches: {}\n\
             Failed fetches:    {}\n\
             Disregarded URIs:  {}\n\
             Queues resident:   {} (ready {}, snoozed {}, busy {})\n\
             Pending in queues: {}\n\
             In flight:         {}\n\
             Outbound staged:   {}\n\
             Next ordinal:      {}\n\
             Seen keys:         {}",
            self.target,
            *self.state_tx.borrow(),
            self.counters.queued(),
            self.counters.succeeded(),
            self.counters.failed(),
            self.counters.disregarded(),
            stats.queues,
            stats.ready,
            stats.snoozed,
            stats.busy,
            stats.pending_uris,
            stats.in_flight_uris,
            self.outbound_len(),
            self.next_ordinal,
            seen,
        )
    }
}

/// Cloneable handle to a running frontier
///
/// All methods are safe to call from any task. Counter reads are lock-free;
/// everything else flows through the inbound channel and is applied by the
/// manager in arrival order.
#[derive(Clone)]
pub struct Frontier {
    inbound_tx: mpsc::Sender<Command>,
    outbound_rx: Arc<Mutex<mpsc::Receiver<CrawlURI>>>,
    gate: DispatchGate,
    state_rx: watch::Receiver<FrontierState>,
    counters: Arc<FrontierCounters>,
}

impl Frontier {
    /// Starts a fresh frontier. Fails if the configuration is invalid or a
    /// requested journal cannot be opened: a crawl must not silently run
    /// without its journal.
    ///
    /// The frontier starts with target state `PAUSE`; call
    /// [`unpause`](Frontier::unpause) to begin dispatch.
    pub fn start(config: FrontierConfig, seen: Box<dyn SeenFilter>) -> Result<Frontier> {
        Self::launch(config, seen, None, None)
    }

    /// Starts a fresh frontier, recording a configuration hash for later
    /// checkpoint verification
    pub fn start_with_hash(
        config: FrontierConfig,
        seen: Box<dyn SeenFilter>,
        config_hash: String,
    ) -> Result<Frontier> {
        Self::launch(config, seen, Some(config_hash), None)
    }

    /// Restores a frontier from a checkpoint snapshot
    ///
    /// Phase one builds the empty manager from configuration; phase two
    /// repopulates queues, counters, and the ordinal sequence from the
    /// snapshot and reopens the snapshot's journal in append mode. Apply
    /// [`FrontierSnapshot::translate_paths`] first if the checkpoint was
    /// relocated. The restored frontier starts paused; queue wake-times are
    /// not restored, so every queue is immediately eligible on unpause.
    pub fn restore(
        config: FrontierConfig,
        seen: Box<dyn SeenFilter>,
        snapshot: FrontierSnapshot,
    ) -> Result<Frontier> {
        let hash = snapshot.config_hash.clone();
        Self::launch(config, seen, hash, Some(snapshot))
    }

    fn launch(
        config: FrontierConfig,
        seen: Box<dyn SeenFilter>,
        config_hash: Option<String>,
        snapshot: Option<FrontierSnapshot>,
    ) -> Result<Frontier> {
        crate::config::validate(&config)?;

        // Phase one: empty manager state from configuration
        let journal_path = match &snapshot {
            Some(snapshot) => snapshot.journal_path.clone(),
            None => config.journal.path.clone(),
        };
        let journal = if config.journal.enabled {
            Some(Journal::open(Path::new(&journal_path))?)
        } else {
            None
        };

        let registry = AttributeRegistry::from_config(&config.attributes);
        let assignment = match &config.queues.force_class_key {
            Some(key) => QueueAssignmentPolicy::forced(key.clone()),
            None => QueueAssignmentPolicy::new(),
        };
        let precedence = BasePrecedencePolicy::from_config(&config.queues);

        let outbound_capacity = config.channels.outbound_capacity;
        let (inbound_tx, inbound_rx) = mpsc::channel(config.channels.inbound_capacity());
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity);
        let outbound_rx = Arc::new(Mutex::new(outbound_rx));
        let (state_tx, state_rx) = watch::channel(FrontierState::Pause);
        let gate = DispatchGate::new();

        // Phase two: repopulate from the snapshot
        let mut topology: Box<dyn QueueTopology> = Box::new(ReadySnoozedTopology::new());
        let mut counters = FrontierCounters::default();
        let mut next_ordinal = 1;
        if let Some(snapshot) = snapshot {
            counters = FrontierCounters::from_snapshot(snapshot.counters);
            next_ordinal = snapshot.next_ordinal;
            for queue in snapshot.queues {
                for item in queue.items {
                    let curi = item.into_curi(&queue.key)?;
                    topology.enqueue(curi, queue.precedence);
                }
            }
            tracing::info!(
                uris = topology.pending_count(),
                next_ordinal,
                "frontier restored from checkpoint"
            );
        }
        let counters = Arc::new(counters);

        let manager = Manager {
            config,
            config_hash,
            registry,
            assignment,
            precedence,
            topology,
            seen,
            journal,
            inbound_rx,
            outbound_tx,
            outbound_rx: outbound_rx.clone(),
            outbound_capacity,
            gate: gate.clone(),
            gate_guard: None,
            state_tx,
            target: FrontierState::Pause,
            counters: counters.clone(),
            next_ordinal,
        };
        tokio::spawn(manager.run());

        Ok(Frontier {
            inbound_tx,
            outbound_rx,
            gate,
            state_rx,
            counters,
        })
    }

    /// Submits a CrawlURI for scheduling; the already-seen filter decides
    /// admission unless `force_fetch` is set
    pub async fn schedule(&self, curi: CrawlURI) -> Result<()> {
        self.send(Command::Schedule(Box::new(curi))).await
    }

    /// Takes the next CrawlURI to fetch, waiting while none is available or
    /// while dispatch is disabled; `None` once the frontier has finished
    pub async fn next(&self) -> Option<CrawlURI> {
        let mut state_rx = self.state_rx.clone();
        loop {
            if *state_rx.borrow() == FrontierState::Finish {
                return None;
            }
            tokio::select! {
                _guard = self.gate.enter() => {
                    let mut rx = self.outbound_rx.lock().await;
                    match tokio::time::timeout(RECEIVE_POLL, rx.recv()).await {
                        Ok(Some(curi)) => return Some(curi),
                        Ok(None) => return None,
                        // Release the gate so a pending disable gets in
                        Err(_) => {}
                    }
                }
                _ = state_rx.changed() => {}
            }
        }
    }

    /// Reports the outcome of a previously emitted CrawlURI. Must be called
    /// exactly once per [`next`](Frontier::next) result, with the fetch
    /// status set.
    pub async fn finished(&self, curi: CrawlURI) -> Result<()> {
        self.send(Command::Finished(Box::new(curi))).await
    }

    /// Requests a state transition; applied asynchronously by the manager
    pub async fn request_state(&self, state: FrontierState) -> Result<()> {
        self.send(Command::RequestState(state)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request_state(FrontierState::Pause).await
    }

    pub async fn unpause(&self) -> Result<()> {
        self.request_state(FrontierState::Run).await
    }

    /// Requests `FINISH`: cooperative, terminal. In-process work is drained
    /// before the manager exits.
    pub async fn terminate(&self) -> Result<()> {
        self.request_state(FrontierState::Finish).await
    }

    /// Blocks until the manager announces `state`
    pub async fn wait_for_state(&self, state: FrontierState) -> Result<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|reached| *reached == state)
            .await
            .map_err(|_| ShioriError::ChannelClosed)?;
        Ok(())
    }

    /// The most recently announced state
    pub fn state(&self) -> FrontierState {
        *self.state_rx.borrow()
    }

    /// Writes a checkpoint snapshot into `dir`; the frontier must be paused
    /// and quiescent
    pub async fn checkpoint(&self, dir: &Path) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Checkpoint {
            dir: dir.to_path_buf(),
            reply,
        })
        .await?;
        response.await.map_err(|_| ShioriError::ChannelClosed)?
    }

    /// Human-readable multi-line status summary
    pub async fn report(&self) -> Result<String> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Report(reply)).await?;
        response.await.map_err(|_| ShioriError::ChannelClosed)
    }

    pub fn queued_uri_count(&self) -> u64 {
        self.counters.queued()
    }

    pub fn succeeded_fetch_count(&self) -> u64 {
        self.counters.succeeded()
    }

    pub fn failed_fetch_count(&self) -> u64 {
        self.counters.failed()
    }

    pub fn disregarded_uri_count(&self) -> u64 {
        self.counters.disregarded()
    }

    pub fn finished_uri_count(&self) -> u64 {
        self.counters.finished()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.queued() == 0
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.inbound_tx
            .send(command)
            .await
            .map_err(|_| ShioriError::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seen::MemorySeenFilter;

    fn test_config() -> FrontierConfig {
        let mut config = FrontierConfig::default();
        config.journal.enabled = false;
        config
    }

    fn start_frontier(config: FrontierConfig) -> Frontier {
        Frontier::start(config, Box::new(MemorySeenFilter::new())).unwrap()
    }

    #[tokio::test]
    async fn test_starts_paused() {
        let frontier = start_frontier(test_config());
        frontier.wait_for_state(FrontierState::Pause).await.unwrap();
        assert!(frontier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_and_fetch_one() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        let mut curi = frontier.next().await.unwrap();
        assert_eq!(curi.uri().as_str(), "https://example.com/");
        assert_eq!(curi.ordinal(), 1);
        assert_eq!(frontier.queued_uri_count(), 1);

        curi.fetch_status = FetchStatus::Success(200);
        frontier.finished(curi).await.unwrap();

        // Nothing left queued: the manager pauses itself
        frontier.wait_for_state(FrontierState::Pause).await.unwrap();
        assert_eq!(frontier.succeeded_fetch_count(), 1);
        assert_eq!(frontier.finished_uri_count(), 1);
        assert!(frontier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_uri_admitted_once() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/page").unwrap())
            .await
            .unwrap();
        frontier
            .schedule(CrawlURI::parse("https://example.com/page").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        assert_eq!(frontier.queued_uri_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_fetch_bypasses_seen_filter() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/page").unwrap())
            .await
            .unwrap();
        let mut again = CrawlURI::parse("https://example.com/page").unwrap();
        again.force_fetch = true;
        frontier.schedule(again).await.unwrap();
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        assert_eq!(frontier.queued_uri_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordinals_strictly_increase() {
        let frontier = start_frontier(test_config());
        for path in ["a", "b", "c"] {
            frontier
                .schedule(CrawlURI::parse(&format!("https://{path}.example.org/")).unwrap())
                .await
                .unwrap();
        }
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        let mut ordinals = Vec::new();
        for _ in 0..3 {
            ordinals.push(frontier.next().await.unwrap().ordinal());
        }
        ordinals.sort_unstable();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_counts_one_failure() {
        let mut config = test_config();
        config.retry.max_retries = 3;
        config.retry.retry_delay_seconds = 1;
        let frontier = start_frontier(config);

        frontier
            .schedule(CrawlURI::parse("https://flaky.example.com/").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();

        for _ in 0..3 {
            let mut curi = frontier.next().await.unwrap();
            curi.fetch_status = FetchStatus::ConnectFailed;
            frontier.finished(curi).await.unwrap();
        }

        frontier.wait_for_state(FrontierState::Pause).await.unwrap();
        assert_eq!(frontier.failed_fetch_count(), 1);
        assert_eq!(frontier.succeeded_fetch_count(), 0);
        assert!(frontier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disregard_counts_separately() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/deep").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();

        let mut curi = frontier.next().await.unwrap();
        curi.fetch_status = FetchStatus::TooManyLinkHops;
        frontier.finished(curi).await.unwrap();

        frontier.wait_for_state(FrontierState::Pause).await.unwrap();
        assert_eq!(frontier.disregarded_uri_count(), 1);
        assert_eq!(frontier.failed_fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_dispatch() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://a.example.org/").unwrap())
            .await
            .unwrap();
        frontier
            .schedule(CrawlURI::parse("https://b.example.org/").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        let mut curi = frontier.next().await.unwrap();
        frontier.pause().await.unwrap();
        curi.fetch_status = FetchStatus::Success(200);
        frontier.finished(curi).await.unwrap();
        frontier.wait_for_state(FrontierState::Pause).await.unwrap();

        // Dispatch is gated even though a URI may be staged outbound
        let blocked = tokio::time::timeout(Duration::from_secs(2), frontier.next()).await;
        assert!(blocked.is_err());
        assert_eq!(frontier.queued_uri_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_reaches_finish() {
        let frontier = start_frontier(test_config());
        frontier.terminate().await.unwrap();
        frontier.wait_for_state(FrontierState::Finish).await.unwrap();
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_contains_counters() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/").unwrap())
            .await
            .unwrap();
        let report = frontier.report().await.unwrap();
        assert!(report.contains("Queued URIs:       1"));
        assert!(report.contains("Target state:      PAUSE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_requires_quiescence() {
        let frontier = start_frontier(test_config());
        frontier
            .schedule(CrawlURI::parse("https://example.com/").unwrap())
            .await
            .unwrap();
        frontier.unpause().await.unwrap();
        frontier.wait_for_state(FrontierState::Run).await.unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let result = frontier.checkpoint(dir.path()).await;
        assert!(matches!(result, Err(ShioriError::NotPaused)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_and_restore_round_trip() {
        let frontier = start_frontier(test_config());
        for path in ["one", "two"] {
            frontier
                .schedule(CrawlURI::parse(&format!("https://example.com/{path}")).unwrap())
                .await
                .unwrap();
        }
        frontier.wait_for_state(FrontierState::Pause).await.unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        frontier.checkpoint(dir.path()).await.unwrap();
        frontier.terminate().await.unwrap();
        frontier.wait_for_state(FrontierState::Finish).await.unwrap();

        let snapshot = FrontierSnapshot::load(dir.path()).unwrap();
        assert_eq!(snapshot.uri_count(), 2);

        let restored =
            Frontier::restore(test_config(), Box::new(MemorySeenFilter::new()), snapshot).unwrap();
        assert_eq!(restored.queued_uri_count(), 2);
        restored.unpause().await.unwrap();

        let mut curi = restored.next().await.unwrap();
        curi.fetch_status = FetchStatus::Success(200);
        restored.finished(curi).await.unwrap();
        let mut curi = restored.next().await.unwrap();
        curi.fetch_status = FetchStatus::Success(200);
        restored.finished(curi).await.unwrap();

        restored.wait_for_state(FrontierState::Pause).await.unwrap();
        assert_eq!(restored.succeeded_fetch_count(), 2);
        assert!(restored.is_empty());
    }
}
