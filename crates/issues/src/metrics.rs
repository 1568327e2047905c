use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::model::LogFormat;
use crate::normalize::DropReason;

/// Counters for a single read call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    pub format: LogFormat,
    /// Diagnostic elements or events looked at
    pub elements_inspected: u64,
    pub issues_emitted: u64,
    pub dropped: BTreeMap<DropReason, u64>,
}

impl ReadStats {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            elements_inspected: 0,
            issues_emitted: 0,
            dropped: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn record_inspected(&mut self) {
        self.elements_inspected += 1;
    }

    #[inline]
    pub fn record_emitted(&mut self) {
        self.issues_emitted += 1;
    }

    #[inline]
    pub fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }
}

/// Cumulative read metrics, shared across threads and reads.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not transactional
/// across fields.
#[derive(Debug, Default)]
pub struct ReaderMetrics {
    xml_logs: AtomicU64,
    binary_logs: AtomicU64,
    failed_reads: AtomicU64,
    elements_inspected: AtomicU64,
    issues_emitted: AtomicU64,
    dropped: [AtomicU64; DropReason::ALL.len()],
}

impl ReaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished read into the totals
    pub fn record(&self, stats: &ReadStats) {
        match stats.format {
            LogFormat::Xml => self.xml_logs.fetch_add(1, Ordering::Relaxed),
            LogFormat::Binary => self.binary_logs.fetch_add(1, Ordering::Relaxed),
        };
        self.elements_inspected
            .fetch_add(stats.elements_inspected, Ordering::Relaxed);
        self.issues_emitted
            .fetch_add(stats.issues_emitted, Ordering::Relaxed);
        for (reason, count) in &stats.dropped {
            self.dropped[Self::slot(*reason)].fetch_add(*count, Ordering::Relaxed);
        }
    }

    /// Record a read that failed with an error
    #[inline]
    pub fn record_failure(&self) {
        self.failed_reads.fetch_add(1, Ordering::Relaxed);
    }

    fn slot(reason: DropReason) -> usize {
        DropReason::ALL
            .iter()
            .position(|r| *r == reason)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let dropped: BTreeMap<DropReason, u64> = DropReason::ALL
            .iter()
            .zip(self.dropped.iter())
            .map(|(reason, count)| (*reason, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        MetricsSnapshot {
            xml_logs: self.xml_logs.load(Ordering::Relaxed),
            binary_logs: self.binary_logs.load(Ordering::Relaxed),
            failed_reads: self.failed_reads.load(Ordering::Relaxed),
            elements_inspected: self.elements_inspected.load(Ordering::Relaxed),
            issues_emitted: self.issues_emitted.load(Ordering::Relaxed),
            total_dropped: dropped.values().sum(),
            dropped,
        }
    }
}

/// A read-only snapshot of reader metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub xml_logs: u64,
    pub binary_logs: u64,
    pub failed_reads: u64,
    pub elements_inspected: u64,
    pub issues_emitted: u64,
    pub total_dropped: u64,
    /// Only reasons seen at least once
    pub dropped: BTreeMap<DropReason, u64>,
}
