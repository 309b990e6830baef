//! Worker thread management.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::crypto::WalletGenerator;

use super::protocol::{Command, Event};
use super::search::SearchLoop;

/// A fixed set of idle search threads, each with its own command channel and
/// a shared event channel back to the owner.
pub struct WorkerPool {
    /// Per-worker command senders, indexed by worker ID
    command_txs: Vec<Sender<Command>>,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<()>>>,
    /// Events from all workers
    event_rx: Receiver<Event>,
}

impl WorkerPool {
    /// Spawns `num_workers` threads. `generator` is called once per worker.
    pub fn new<G, F>(
        num_workers: usize,
        batch_size: usize,
        stat_interval: Duration,
        mut generator: F,
    ) -> Self
    where
        G: WalletGenerator + 'static,
        F: FnMut(usize) -> G,
    {
        let (event_tx, event_rx) = unbounded();
        let mut command_txs = Vec::with_capacity(num_workers);
        let mut handles = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let (command_tx, command_rx) = unbounded();
            let search = SearchLoop::new(id, generator(id), event_tx.clone(), batch_size);

            let handle = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || search.run(command_rx, stat_interval))
                .expect("Failed to spawn worker thread");

            command_txs.push(command_tx);
            handles.push(handle);
        }

        Self {
            command_txs,
            handles: Some(handles),
            event_rx,
        }
    }

    /// Returns the number of workers.
    pub fn len(&self) -> usize {
        self.command_txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.command_txs.is_empty()
    }

    /// Sends a command to the first `count` workers. Returns how many accepted it.
    pub fn broadcast(&self, count: usize, command: &Command) -> usize {
        self.command_txs
            .iter()
            .take(count)
            .enumerate()
            .filter(|(id, tx)| match tx.send(command.clone()) {
                Ok(()) => true,
                Err(_) => {
                    log::warn!("worker {} is gone, command dropped", id);
                    false
                }
            })
            .count()
    }

    /// Takes the next pending event without blocking.
    pub fn try_recv(&self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Returns false if the worker's thread has ended.
    pub fn is_alive(&self, worker: usize) -> bool {
        self.handles
            .as_ref()
            .and_then(|handles| handles.get(worker))
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Closes every command channel and waits for the threads to exit.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.command_txs.clear();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
