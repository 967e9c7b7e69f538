//! Passive measurements around a store operation: wall time, the store's
//! own footprint estimate, and process resident memory where available.

use crate::{store::TableStore, types::StoreKind};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpMetrics {
    pub operation:       String,
    pub store:           StoreKind,
    pub elapsed_micros:  u64,
    pub footprint_bytes: usize,
    /// Resident set size before and after, when the OS reports it.
    pub rss_before:      Option<u64>,
    pub rss_after:       Option<u64>,
    /// Rows returned, for queries.
    pub result_len:      Option<usize>,
}

impl OpMetrics {
    pub fn with_result_len(mut self, len: usize) -> Self {
        self.result_len = Some(len);
        self
    }

    /// Two-line operator report.
    pub fn report(&self) -> String {
        format!(
            "Time used by {}: {} microseconds\nMemory used: {} bytes",
            self.store, self.elapsed_micros, self.footprint_bytes
        )
    }
}

/// A started measurement.
pub struct Probe {
    started:    Instant,
    rss_before: Option<u64>,
}

impl Probe {
    pub fn start() -> Self {
        let rss_before = process_rss_bytes();
        Self { started: Instant::now(), rss_before }
    }

    pub fn finish(self, operation: &str, store: &dyn TableStore) -> OpMetrics {
        let elapsed = self.started.elapsed();
        OpMetrics {
            operation:       operation.to_string(),
            store:           store.kind(),
            elapsed_micros:  u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            footprint_bytes: store.footprint_bytes(),
            rss_before:      self.rss_before,
            rss_after:       process_rss_bytes(),
            result_len:      None,
        }
    }
}

/// Run `op` against `store` and measure it.
pub fn measure<T>(
    store: &mut dyn TableStore,
    operation: &str,
    op: impl FnOnce(&mut dyn TableStore) -> T,
) -> (T, OpMetrics) {
    let probe = Probe::start();
    let out = op(&mut *store);
    let metrics = probe.finish(operation, &*store);
    log::debug!("{operation}: {}us on {}", metrics.elapsed_micros, metrics.store);
    (out, metrics)
}

/// Resident memory of this process in bytes, read from `/proc/self/status`.
/// `None` on platforms without procfs.
pub fn process_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line
        .trim_start_matches("VmRSS:")
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    Some(kb * 1024)
}
