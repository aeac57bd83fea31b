//! civicfix-runner: headless runner for the complaint tracker.
//!
//! Usage:
//!   civicfix-runner --db tracker.db --staff staff.json --complaints day1.json --once
//!   civicfix-runner --db tracker.db --interval-secs 600

use anyhow::Result;
use civicfix_core::{
    config::TrackerConfig,
    engine::{NewComplaint, TrackerEngine},
    staff::StaffRecord,
    store::Store,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config = match flag_value(&args, "--config") {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::builtin(),
    };
    let once = args.iter().any(|a| a == "--once");
    let interval_secs: Option<u64> = flag_value(&args, "--interval-secs")
        .map(str::parse)
        .transpose()?;

    let store = Store::open(db)?;
    store.migrate()?;

    let mut config = config;
    if let Some(secs) = interval_secs {
        config.scheduler.interval_secs = secs;
    }
    let engine = TrackerEngine::new(store, config);

    if let Some(path) = flag_value(&args, "--staff") {
        let raw = std::fs::read_to_string(path)?;
        let staff: Vec<StaffRecord> = serde_json::from_str(&raw)?;
        let count = staff.len();
        for record in &staff {
            engine.store().insert_staff(record)?;
        }
        log::info!("seeded {count} directory records from {path}");
    }

    if let Some(path) = flag_value(&args, "--complaints") {
        let raw = std::fs::read_to_string(path)?;
        let complaints: Vec<NewComplaint> = serde_json::from_str(&raw)?;
        for new in complaints {
            let record = engine.file_complaint(new)?;
            println!(
                "filed {} [{}] {} -> {}",
                record.complaint_id,
                record.city,
                record.category,
                record.assigned_to.as_deref().unwrap_or("(unassigned)"),
            );
        }
    }

    if once {
        match engine.run_batch_once()? {
            Some(outcome) => println!(
                "batch pass: updated={} escalated={} failed={}",
                outcome.updated, outcome.escalated, outcome.failed
            ),
            None => println!("batch pass skipped (already in flight)"),
        }
        print_summary(&engine)?;
        return Ok(());
    }

    if interval_secs.is_some() {
        if db == ":memory:" {
            anyhow::bail!("--interval-secs requires a file database (--db)");
        }
        let _scheduler = engine.start_scheduler()?;
        log::info!("scheduler running; press Ctrl-C to exit");
        // Block forever; the scheduler thread does the work.
        loop {
            std::thread::sleep(std::time::Duration::from_secs(60));
        }
    }

    print_summary(&engine)?;
    Ok(())
}

fn print_summary(engine: &TrackerEngine) -> Result<()> {
    let store = engine.store();
    println!("── summary ──────────────────────────────");
    println!("complaints: {}", store.complaint_count()?);
    println!("breached:   {}", store.breached_count()?);
    println!("escalated:  {}", store.escalated_count()?);
    println!("events:     {}", store.event_count()?);
    println!("top fixers:");
    for s in store.top_staff_by_points(5)? {
        println!(
            "  {:<12} {:>5} pts  streak {:<3} {}",
            s.staff_id, s.points, s.resolution_streak, s.badge
        );
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
