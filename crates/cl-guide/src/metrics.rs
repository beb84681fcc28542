//! Stage timings and device allocation counters, enabled with `--features metrics`.

use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

/* ───────────── Roh‑Latenzen ─────────────────────────── */

static TIMES: Lazy<Mutex<Vec<(&'static str, u128)>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Im Pipeline‑Code aufrufen: `record("build", t)` mit `t = Instant::now()` vor dem Schritt.
pub fn record(stage: &'static str, start: Instant) {
    let dur = start.elapsed().as_micros();
    if let Ok(mut times) = TIMES.lock() {
        times.push((stage, dur));
    }
}

/* ───────────── Buffer‑Allokationen ───────────────────── */

pub static ALLOCS:      AtomicUsize = AtomicUsize::new(0);
pub static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn count_alloc(bytes: usize) {
    ALLOCS.fetch_add(1, Ordering::Relaxed);
    ALLOC_BYTES.fetch_add(bytes, Ordering::Relaxed);
}

/// Mean and p95 in µs per stage, in stage-name order. Drains the recorded samples.
pub fn take_stats() -> Vec<(&'static str, u128, u128)> {
    let mut map: BTreeMap<&'static str, Vec<u128>> = BTreeMap::new();
    if let Ok(mut times) = TIMES.lock() {
        for (stage, us) in times.drain(..) {
            map.entry(stage).or_default().push(us);
        }
    }

    map.into_iter()
        .map(|(stage, mut v)| {
            v.sort_unstable();
            let mean = v.iter().sum::<u128>() / v.len() as u128;
            let p95 = v[((v.len() * 95) / 100).saturating_sub(1)];
            (stage, mean, p95)
        })
        .collect()
}

/* ───────────── Zusammenfassung ausgeben ─────────────── */

/// Am Programmende aufrufen, z. B. in `main()`
pub fn summary() {
    println!("── metrics summary ──");
    for (stage, mean, p95) in take_stats() {
        println!("{:<18} mean={:>6} µs   p95={:>6} µs", stage, mean, p95);
    }

    let allocs = ALLOCS.load(Ordering::Relaxed);
    let bytes  = ALLOC_BYTES.load(Ordering::Relaxed);
    println!("device allocations: {}   ({} KiB)", allocs, bytes / 1024);
}
