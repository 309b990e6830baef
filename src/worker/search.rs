//! Per-worker search loop.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::crypto::WalletGenerator;
use crate::matcher::{Scorer, Verdict};

use super::protocol::{Command, Event, Match, SessionId};

enum State {
    Idle,
    Running { session: SessionId, scorer: Scorer },
}

/// Generates and scores wallets for one worker.
///
/// Counters are plain fields owned by the loop and only leave it inside
/// `Event::Stat`.
pub struct SearchLoop<G> {
    /// Worker ID
    id: usize,
    generator: G,
    event_tx: Sender<Event>,
    batch_size: usize,
    state: State,
    addresses_generated: u64,
    ignored_matches: u64,
}

impl<G: WalletGenerator> SearchLoop<G> {
    pub fn new(id: usize, generator: G, event_tx: Sender<Event>, batch_size: usize) -> Self {
        Self {
            id,
            generator,
            event_tx,
            batch_size: batch_size.max(1),
            state: State::Idle,
            addresses_generated: 0,
            ignored_matches: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Current counters since the last Stat event.
    pub fn counters(&self) -> (u64, u64) {
        (self.addresses_generated, self.ignored_matches)
    }

    /// Applies a command. Start while running is ignored.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Start {
                session,
                terms,
                min_score,
            } => {
                if self.is_running() {
                    log::debug!("worker {} ignoring start while running", self.id);
                    return;
                }
                self.reset_counters();
                self.state = State::Running {
                    session,
                    scorer: Scorer::new(terms.to_vec(), min_score),
                };
            }
            Command::Stop => {
                self.reset_counters();
                self.state = State::Idle;
            }
        }
    }

    /// Generates and scores a single wallet.
    ///
    /// Returns false once the coordinator has hung up.
    pub fn attempt(&mut self) -> bool {
        let State::Running { session, scorer } = &self.state else {
            return true;
        };

        let wallet = self.generator.generate();
        let score = scorer.score(&wallet.address);
        self.addresses_generated += 1;

        match scorer.verdict(score.value) {
            Verdict::Miss => true,
            Verdict::Ignored => {
                self.ignored_matches += 1;
                true
            }
            Verdict::Reported => self
                .event_tx
                .send(Event::Match {
                    worker: self.id,
                    session: *session,
                    found: Match { wallet, score },
                })
                .is_ok(),
        }
    }

    /// Runs one batch of attempts.
    pub fn run_batch(&mut self) -> bool {
        (0..self.batch_size).all(|_| self.attempt())
    }

    /// Emits the accumulated counters and resets them. No-op while idle.
    pub fn flush_stats(&mut self) -> bool {
        let State::Running { session, .. } = &self.state else {
            return true;
        };

        let event = Event::Stat {
            worker: self.id,
            session: *session,
            addresses_generated: self.addresses_generated,
            ignored_matches: self.ignored_matches,
            at: Instant::now(),
        };
        self.reset_counters();
        self.event_tx.send(event).is_ok()
    }

    fn reset_counters(&mut self) {
        self.addresses_generated = 0;
        self.ignored_matches = 0;
    }

    /// Runs the worker until its command channel closes.
    ///
    /// Pending commands are only looked at between batches, so a Stop takes
    /// effect at most one batch after it was sent.
    pub fn run(mut self, command_rx: Receiver<Command>, stat_interval: Duration) {
        let mut last_stat = Instant::now();

        loop {
            if !self.is_running() {
                match command_rx.recv() {
                    Ok(command) => {
                        self.handle(command);
                        last_stat = Instant::now();
                        continue;
                    }
                    Err(_) => break,
                }
            }

            if !self.run_batch() {
                break;
            }

            loop {
                match command_rx.try_recv() {
                    Ok(command) => self.handle(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::debug!("worker {} lost its coordinator", self.id);
                        return;
                    }
                }
            }

            if self.is_running() && last_stat.elapsed() >= stat_interval {
                if !self.flush_stats() {
                    break;
                }
                last_stat = Instant::now();
            }

            thread::yield_now();
        }

        log::debug!("worker {} exiting", self.id);
    }
}
