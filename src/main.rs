//! Nano Vanity Address Generator CLI
//!
//! Usage:
//!   nano_vanity nano                # Find an address containing "nano"
//!   nano_vanity -n 5 cafe bee       # Find 5 addresses containing "cafe" or "bee"
//!   nano_vanity -c 0.5 -o out/ moon # Use half the cores, save wallets to out/

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use nano_vanity::matcher::forbidden_chars;
use nano_vanity::stats::{format_duration, format_number};
use nano_vanity::{Config, Coordinator, Match, Snapshot};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let terms = config.search_terms();
    let dropped = forbidden_chars(&terms.join(" "));
    if !dropped.is_empty() {
        log::warn!(
            "Nano addresses never contain {:?}; those characters are ignored",
            dropped
        );
    }

    let mut coordinator = Coordinator::new(config.search_settings());
    if let Err(e) = coordinator.set_concurrency(config.concurrency) {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    // Print startup info
    println!("Nano Vanity Address Generator");
    println!("=============================");
    println!("Terms:      {}", terms.join(" "));
    println!("Prefix:     {}", config.prefix);
    println!(
        "Workers:    {} of {}",
        coordinator.active_workers(),
        coordinator.parallelism()
    );
    println!("Target:     {} address(es)", config.count);
    println!();

    let stop_flag = Arc::new(AtomicBool::new(false));
    ctrlc_handler(stop_flag.clone());

    if let Err(e) = coordinator.start(terms.as_slice()) {
        eprintln!("Failed to start: {}", e);
        process::exit(1);
    }

    println!("Searching... (Press Ctrl+C to stop)\n");

    let started = Instant::now();
    let report_interval = Duration::from_secs(config.report_interval);
    let mut last_report = Instant::now();
    let mut printed: HashSet<String> = HashSet::new();

    let last_snapshot = loop {
        thread::sleep(POLL_INTERVAL);
        let snapshot = coordinator.snapshot();

        for found in &snapshot.matches {
            if printed.insert(found.wallet.address.clone()) {
                print_match(found, printed.len());
            }
        }

        if last_report.elapsed() >= report_interval {
            print_progress(&snapshot, started.elapsed());
            for id in coordinator.silent_workers(report_interval) {
                log::warn!("worker {} has stopped reporting", id);
            }
            last_report = Instant::now();
        }

        if config.count > 0 && printed.len() >= config.count {
            println!("\nTarget reached! Found {} address(es).", printed.len());
            break snapshot;
        }

        // Check if we should stop (ctrl-c was pressed)
        if stop_flag.load(Ordering::Relaxed) {
            println!("\nStopped by user.");
            break snapshot;
        }
    };

    if let Err(e) = coordinator.stop() {
        log::warn!("{}", e);
    }

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!(
        "Total addresses generated: {}",
        format_number(last_snapshot.stats.addresses_generated)
    );
    println!(
        "Ignored weak matches:      {}",
        last_snapshot.stats.ignored_matches
    );
    println!("Matches found:             {}", last_snapshot.matches.len());
    println!(
        "Time elapsed:              {:.2}s",
        started.elapsed().as_secs_f64()
    );

    if !last_snapshot.matches.is_empty() {
        println!("\n--- Ranked Matches ---");
        for (rank, found) in last_snapshot.matches.iter().enumerate() {
            println!("{:>3}. {}  (score {})", rank + 1, found.wallet.address, found.score.value);
        }
    }

    if let Some(ref dir) = config.export_dir {
        export_matches(&coordinator, &last_snapshot, dir);
    }
}

fn print_match(found: &Match, index: usize) {
    println!("=== Match #{} ===", index);
    println!("Address: {}", found.wallet.address);
    println!("Seed:    {}", found.wallet.seed_hex());
    println!("Score:   {}", found.score.value);
    println!();
}

fn print_progress(snapshot: &Snapshot, elapsed: Duration) {
    let stats = &snapshot.stats;
    let eta = stats
        .estimated_seconds_remaining
        .map(|secs| format_duration(Duration::from_secs_f64(secs.min(u32::MAX as f64))))
        .unwrap_or_else(|| "unknown".into());

    println!(
        "[{:>4}s] Generated {} addresses ({}/s), {} ignored, expected match in {}",
        elapsed.as_secs(),
        format_number(stats.addresses_generated),
        format_number(stats.addresses_per_second as u64),
        stats.ignored_matches,
        eta
    );
}

fn export_matches(coordinator: &Coordinator, snapshot: &Snapshot, dir: &Path) {
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("Cannot create {}: {}", dir.display(), e);
        return;
    }

    for found in &snapshot.matches {
        match export_one(coordinator, &found.wallet.address, dir) {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => eprintln!("Export failed for {}: {}", found.wallet.address, e),
        }
    }
}

fn export_one(
    coordinator: &Coordinator,
    address: &str,
    dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let wallet = coordinator.export_wallet(address)?;
    let path = dir.join(wallet.file_name());
    fs::write(&path, wallet.to_json()?)?;
    Ok(path)
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");
}
