//! Search coordination: worker dispatch, event fan-in and the control API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::SearchSettings;
use crate::crypto::{address, RandomWalletGenerator, WalletGenerator};
use crate::matcher::{min_search_iterations, sanitize_terms, SearchTerm};
use crate::stats::{StatsAggregator, StatsSnapshot, WINDOW_DEPTH};
use crate::store::MatchStore;
use crate::worker::{Command, Event, Match, SessionId, WorkerPool};

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("A search is already running")]
    AlreadyRunning,
    #[error("No search is running")]
    NotRunning,
    #[error("No searchable terms left after sanitizing")]
    NoSearchTerms,
    #[error("Concurrency can only be changed while idle")]
    ConcurrencyLocked,
    #[error("Concurrency factor must be in (0, 1], got {0}")]
    InvalidFactor(f64),
    #[error("No stored match for address {0}")]
    UnknownAddress(String),
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Number of workers dispatched for a concurrency factor.
pub fn active_worker_count(factor: f64, parallelism: usize) -> usize {
    ((factor * parallelism as f64).floor() as usize).max(1)
}

/// Everything a front end needs to render the current state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub running: bool,
    pub session: SessionId,
    pub concurrency_factor: f64,
    pub active_workers: usize,
    pub stats: StatsSnapshot,
    /// Best first
    pub matches: Vec<Match>,
}

/// A wallet prepared for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedWallet {
    pub seed: String,
    pub address: String,
}

impl ExportedWallet {
    pub fn to_json(&self) -> Result<String, CoordinatorError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Suggested file name for the download.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Address,
    Seed,
    Text,
}

/// Payload handed to a QR-code renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPayload {
    pub kind: DisplayKind,
    pub value: String,
}

/// Owns the worker pool and all shared search state.
///
/// Every mutation goes through `&mut self`, so the match store and the
/// statistics are only ever touched from one place.
pub struct Coordinator {
    pool: WorkerPool,
    settings: SearchSettings,
    parallelism: usize,
    concurrency_factor: f64,
    active_workers: usize,
    running: bool,
    session: SessionId,
    stats: StatsAggregator,
    matches: MatchStore,
    last_report: Vec<Option<Instant>>,
    last_tick: Instant,
}

impl Coordinator {
    /// Creates a coordinator with one random-wallet worker per logical core.
    pub fn new(settings: SearchSettings) -> Self {
        let prefix = settings.prefix;
        Self::with_generator(num_cpus::get(), settings, move |_| {
            RandomWalletGenerator::new(prefix)
        })
    }

    /// Creates a coordinator with `parallelism` workers built by `generator`.
    ///
    /// A parallelism of zero is treated as one.
    pub fn with_generator<G, F>(parallelism: usize, settings: SearchSettings, generator: F) -> Self
    where
        G: WalletGenerator + 'static,
        F: FnMut(usize) -> G,
    {
        let parallelism = parallelism.max(1);
        let pool = WorkerPool::new(
            parallelism,
            settings.batch_size,
            settings.stat_interval,
            generator,
        );
        log::debug!("spawned {} search workers", parallelism);
        let stats = StatsAggregator::with_interval(settings.stat_interval);

        Self {
            pool,
            settings,
            parallelism,
            concurrency_factor: 1.0,
            active_workers: parallelism,
            running: false,
            session: 0,
            stats,
            matches: MatchStore::new(),
            last_report: vec![None; parallelism],
            last_tick: Instant::now(),
        }
    }

    /// Starts a search over `terms`. Returns the new session id.
    pub fn start<S: AsRef<str>>(&mut self, terms: &[S]) -> Result<SessionId, CoordinatorError> {
        if self.running {
            return Err(CoordinatorError::AlreadyRunning);
        }

        let terms = sanitize_terms(terms);
        if terms.is_empty() {
            return Err(CoordinatorError::NoSearchTerms);
        }

        self.stats.reset();
        self.stats.set_min_iterations(min_search_iterations(&terms));
        self.session += 1;

        let now = Instant::now();
        for (id, report) in self.last_report.iter_mut().enumerate() {
            *report = (id < self.active_workers).then_some(now);
        }
        self.last_tick = now;

        let terms: Arc<[SearchTerm]> = terms.into();
        log::info!(
            "session {}: searching for {:?} on {} worker(s), ~{:.0} attempts expected",
            self.session,
            terms.iter().map(SearchTerm::as_str).collect::<Vec<_>>(),
            self.active_workers,
            self.stats.min_iterations()
        );

        let start = Command::Start {
            session: self.session,
            terms,
            min_score: self.settings.min_score,
        };
        self.pool.broadcast(self.active_workers, &start);
        self.running = true;

        Ok(self.session)
    }

    /// Stops the running search and clears the session totals.
    ///
    /// Returns immediately; workers finish their current batch on their own.
    pub fn stop(&mut self) -> Result<(), CoordinatorError> {
        if !self.running {
            return Err(CoordinatorError::NotRunning);
        }

        self.pool.broadcast(self.active_workers, &Command::Stop);
        self.running = false;

        log::info!(
            "session {} stopped after {} addresses ({} ignored matches)",
            self.session,
            self.stats.addresses_generated(),
            self.stats.ignored_matches()
        );
        self.stats.reset();
        self.last_report.iter_mut().for_each(|report| *report = None);

        Ok(())
    }

    /// Changes the fraction of workers used by the next search.
    pub fn set_concurrency(&mut self, factor: f64) -> Result<usize, CoordinatorError> {
        if self.running {
            return Err(CoordinatorError::ConcurrencyLocked);
        }
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CoordinatorError::InvalidFactor(factor));
        }

        self.concurrency_factor = factor;
        self.active_workers = active_worker_count(factor, self.parallelism);
        Ok(self.active_workers)
    }

    /// Routes every pending worker event. Never blocks.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.pool.try_recv() {
            self.route(event);
            handled += 1;
        }
        handled
    }

    fn route(&mut self, event: Event) {
        if event.session() != self.session {
            log::debug!(
                "dropping event from worker {} for stale session {}",
                event.worker(),
                event.session()
            );
            return;
        }

        match event {
            Event::Match { worker, found, .. } => {
                let address = found.wallet.address.clone();
                let value = found.score.value;
                if self.matches.insert(found) {
                    log::info!("worker {} found {} (score {})", worker, address, value);
                }
            }
            Event::Stat {
                worker,
                addresses_generated,
                ignored_matches,
                at,
                ..
            } => {
                // totals were cleared by stop(); late reports must not revive them
                if !self.running {
                    return;
                }
                if let Some(report) = self.last_report.get_mut(worker) {
                    *report = Some(Instant::now());
                }
                // a report lands in the sample it was taken in, however late it is read
                self.advance_window(at);
                self.stats.record(addresses_generated, ignored_matches);
            }
        }
    }

    /// Closes every whole sample between the last tick and `now`.
    ///
    /// Sample boundaries stay on a fixed grid from the start of the session.
    fn advance_window(&mut self, now: Instant) -> usize {
        let interval = self.stats.interval();
        let elapsed = now.saturating_duration_since(self.last_tick);
        let due = elapsed.as_nanos() / interval.as_nanos();
        if due == 0 {
            return 0;
        }

        // past a full window every further tick would only push zeroes
        let ticks = due.min(WINDOW_DEPTH as u128 + 1) as usize;
        for _ in 0..ticks {
            self.stats.tick();
        }
        self.last_tick += Duration::from_nanos((interval.as_nanos() * due) as u64);
        ticks
    }

    /// Drains events and closes the current throughput sample right away.
    pub fn tick(&mut self) -> f64 {
        self.pump();
        self.last_tick = Instant::now();
        self.stats.tick()
    }

    /// Drains events, turns the rate window for every elapsed sample, and
    /// returns the state.
    pub fn snapshot(&mut self) -> Snapshot {
        self.pump();
        if self.running {
            self.advance_window(Instant::now());
        }

        Snapshot {
            running: self.running,
            session: self.session,
            concurrency_factor: self.concurrency_factor,
            active_workers: self.active_workers,
            stats: self.stats.snapshot(),
            matches: self.matches.as_slice().to_vec(),
        }
    }

    /// Active workers that have not reported for longer than `max_silence`,
    /// or whose thread has ended. They are not restarted.
    pub fn silent_workers(&self, max_silence: Duration) -> Vec<usize> {
        if !self.running {
            return Vec::new();
        }

        (0..self.active_workers)
            .filter(|&id| {
                let quiet = self.last_report[id]
                    .map_or(true, |at| at.elapsed() > max_silence);
                quiet || !self.pool.is_alive(id)
            })
            .collect()
    }

    /// Seed and address of a stored match, ready to be saved.
    pub fn export_wallet(&self, address: &str) -> Result<ExportedWallet, CoordinatorError> {
        let found = self
            .matches
            .get(address)
            .ok_or_else(|| CoordinatorError::UnknownAddress(address.to_string()))?;

        Ok(ExportedWallet {
            seed: found.wallet.seed_hex(),
            address: found.wallet.address.clone(),
        })
    }

    /// Wraps a value for an external QR renderer.
    pub fn request_display(&self, value: &str) -> DisplayPayload {
        let kind = if address::is_valid(value) || self.matches.get(value).is_some() {
            DisplayKind::Address
        } else if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            DisplayKind::Seed
        } else {
            DisplayKind::Text
        };

        DisplayPayload {
            kind,
            value: value.to_string(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers
    }

    pub fn concurrency_factor(&self) -> f64 {
        self.concurrency_factor
    }

    pub fn matches(&self) -> &MatchStore {
        &self.matches
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }
}
