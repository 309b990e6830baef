//! End-to-end tests driving the coordinator with real worker threads.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};

use nano_vanity::crypto::address::{self, ALPHABET};
use nano_vanity::{
    AddressPrefix, Coordinator, RandomWalletGenerator, SearchSettings, Snapshot, Wallet,
    WalletGenerator,
};

/// Every `every`-th wallet carries "abc" plus a per-worker tag, so each
/// worker keeps rediscovering the same address.
struct Scripted {
    worker: usize,
    calls: u64,
    every: u64,
    panic_after: Option<u64>,
}

impl Scripted {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            calls: 0,
            every: 3,
            panic_after: None,
        }
    }
}

impl WalletGenerator for Scripted {
    fn generate(&mut self) -> Wallet {
        self.calls += 1;
        if self.panic_after.is_some_and(|limit| self.calls > limit) {
            panic!("scripted generator {} gave up", self.worker);
        }

        let address = if self.calls % self.every == 0 {
            let tag = ALPHABET[self.worker % ALPHABET.len()] as char;
            format!("xrb_abc{}{}", tag, "1".repeat(56))
        } else {
            format!("xrb_{}", "1".repeat(60))
        };

        Wallet {
            seed: [self.worker as u8; 32],
            index: 0,
            address,
        }
    }
}

/// Matches "abc" on its 3rd call, then parks until the gate closes.
struct Gated {
    calls: u64,
    gate: Receiver<()>,
}

impl WalletGenerator for Gated {
    fn generate(&mut self) -> Wallet {
        self.calls += 1;
        if self.calls > 3 {
            let _ = self.gate.recv();
        }

        let head = if self.calls == 3 { "abc" } else { "111" };
        Wallet {
            seed: [self.calls as u8; 32],
            index: 0,
            address: format!("xrb_{}{}", head, "1".repeat(57)),
        }
    }
}

fn fast_settings() -> SearchSettings {
    SearchSettings {
        stat_interval: Duration::from_millis(20),
        ..SearchSettings::default()
    }
}

fn wait_for(
    coordinator: &mut Coordinator,
    done: impl Fn(&Snapshot) -> bool,
) -> Snapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let snapshot = coordinator.snapshot();
        if done(&snapshot) || Instant::now() > deadline {
            return snapshot;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_search_collects_ranked_unique_matches() {
    let mut coordinator = Coordinator::with_generator(4, fast_settings(), Scripted::new);
    coordinator.set_concurrency(0.5).unwrap();
    coordinator.start(&["ABC"]).unwrap();

    let snapshot = wait_for(&mut coordinator, |s| {
        s.matches.len() == 2 && s.stats.addresses_generated >= 3
    });
    coordinator.stop().unwrap();

    // only the two active workers ran, and each address is stored once
    assert_eq!(snapshot.active_workers, 2);
    assert_eq!(snapshot.matches.len(), 2);
    assert!(snapshot.stats.addresses_generated >= 3);
    for found in &snapshot.matches {
        assert!(found.wallet.address.starts_with("xrb_abc"));
        assert_eq!(found.score.locations[0].start, 4);
    }
    assert!(snapshot
        .matches
        .windows(2)
        .all(|pair| pair[0].score.value >= pair[1].score.value));

    let after = coordinator.snapshot();
    assert!(!after.running);
    assert_eq!(after.stats.addresses_generated, 0);
    assert_eq!(after.matches.len(), 2);
}

#[test]
fn test_match_on_third_generation_reaches_store() {
    let (gate_tx, gate_rx) = unbounded::<()>();
    let settings = SearchSettings {
        batch_size: 3,
        stat_interval: Duration::ZERO,
        ..SearchSettings::default()
    };
    let mut coordinator = Coordinator::with_generator(1, settings, move |_| Gated {
        calls: 0,
        gate: gate_rx.clone(),
    });
    coordinator.start(&["abc"]).unwrap();

    let snapshot = wait_for(&mut coordinator, |s| {
        !s.matches.is_empty() && s.stats.addresses_generated >= 3
    });

    assert_eq!(snapshot.matches.len(), 1);
    assert_eq!(snapshot.stats.addresses_generated, 3);
    assert_eq!(snapshot.stats.ignored_matches, 0);
    assert!(snapshot.matches[0].wallet.address.starts_with("xrb_abc"));
    assert_eq!(snapshot.matches[0].score.locations[0].start, 4);

    // the worker is parked inside its 4th call until the gate closes
    drop(gate_tx);
    coordinator.stop().unwrap();
}

#[test]
fn test_restart_starts_from_zero() {
    let mut coordinator = Coordinator::with_generator(2, fast_settings(), Scripted::new);
    assert_eq!(coordinator.start(&["abc"]).unwrap(), 1);
    wait_for(&mut coordinator, |s| s.stats.addresses_generated > 0);

    coordinator.stop().unwrap();
    assert_eq!(coordinator.start(&["zzz"]).unwrap(), 2);

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.session, 2);
    assert!(snapshot.running);

    let snapshot = wait_for(&mut coordinator, |s| s.stats.addresses_generated > 0);
    assert!(snapshot.stats.addresses_generated > 0);
    // "zzz" never appears, so nothing from session 2 may be ignored or reported
    assert_eq!(snapshot.stats.ignored_matches, 0);
    coordinator.stop().unwrap();
}

#[test]
fn test_dead_worker_shows_as_silent() {
    let mut coordinator = Coordinator::with_generator(2, fast_settings(), |id| {
        let mut generator = Scripted::new(id);
        if id == 1 {
            generator.panic_after = Some(10);
        }
        generator
    });
    coordinator.start(&["abc"]).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut silent = Vec::new();
    while Instant::now() < deadline {
        coordinator.pump();
        silent = coordinator.silent_workers(Duration::from_secs(2));
        if silent.contains(&1) {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(silent, vec![1]);
    coordinator.stop().unwrap();
}

#[test]
fn test_real_wallets_export_and_rederive() {
    let settings = SearchSettings {
        // one matched character is enough here
        min_score: 1000,
        prefix: AddressPrefix::Nano,
        ..fast_settings()
    };
    let mut coordinator = Coordinator::with_generator(2, settings, |_| {
        RandomWalletGenerator::new(AddressPrefix::Nano)
    });
    coordinator.start(&["1", "3"]).unwrap();

    let snapshot = wait_for(&mut coordinator, |s| !s.matches.is_empty());
    coordinator.stop().unwrap();

    let best = &snapshot.matches[0];
    assert!(address::is_valid(&best.wallet.address));
    assert!(best.wallet.address.starts_with("nano_"));

    let exported = coordinator.export_wallet(&best.wallet.address).unwrap();
    let seed: [u8; 32] = hex::decode(&exported.seed).unwrap().try_into().unwrap();
    assert_eq!(
        Wallet::from_seed(seed, 0, AddressPrefix::Nano).address,
        exported.address
    );
}
