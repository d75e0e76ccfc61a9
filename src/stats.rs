use crate::models::RecordKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during a pipeline run, shared by the scanner and the workers
#[derive(Default)]
pub struct ExtractionStats {
    pub lines_read: AtomicU64,
    pub records_detected: [AtomicU64; RecordKind::COUNT],
    pub papers_committed: AtomicU64,
    pub duplicate_papers: AtomicU64,
    pub authorships: AtomicU64,
    pub parse_failures: AtomicU64,
    pub relation_mismatches: AtomicU64,
    pub unterminated_records: AtomicU64,
    pub task_panics: AtomicU64,
}

/// Plain copy of [`ExtractionStats`] taken once the run is quiescent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lines_read: u64,
    pub records_detected: [u64; RecordKind::COUNT],
    pub papers_committed: u64,
    pub duplicate_papers: u64,
    pub authorships: u64,
    pub parse_failures: u64,
    pub relation_mismatches: u64,
    pub unterminated_records: u64,
    pub task_panics: u64,
}

impl StatsSnapshot {
    pub fn records(&self) -> u64 {
        self.records_detected.iter().sum()
    }

    pub fn records_of(&self, kind: RecordKind) -> u64 {
        self.records_detected[kind.index()]
    }

    /// Records that were detected but not committed.
    pub fn skipped(&self) -> u64 {
        self.parse_failures + self.relation_mismatches + self.task_panics
    }
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lines_read(&self, lines: u64) {
        self.lines_read.store(lines, Ordering::Relaxed);
    }

    pub fn inc_detected(&self, kind: RecordKind) {
        self.records_detected[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_committed(&self) {
        self.papers_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicates(&self) {
        self.duplicate_papers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_authorships(&self, count: u64) {
        self.authorships.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_parse_failures(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_mismatches(&self) {
        self.relation_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unterminated(&self) {
        self.unterminated_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_task_panics(&self, count: u64) {
        self.task_panics.fetch_add(count, Ordering::Relaxed);
    }

    pub fn records(&self) -> u64 {
        self.records_detected
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    pub fn committed(&self) -> u64 {
        self.papers_committed.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.parse_failures.load(Ordering::Relaxed)
            + self.relation_mismatches.load(Ordering::Relaxed)
            + self.task_panics.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            records_detected: std::array::from_fn(|i| {
                self.records_detected[i].load(Ordering::Relaxed)
            }),
            papers_committed: self.committed(),
            duplicate_papers: self.duplicate_papers.load(Ordering::Relaxed),
            authorships: self.authorships.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            relation_mismatches: self.relation_mismatches.load(Ordering::Relaxed),
            unterminated_records: self.unterminated_records.load(Ordering::Relaxed),
            task_panics: self.task_panics.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = ExtractionStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.records(), 0);
        assert_eq!(stats.skipped(), 0);
    }

    #[test]
    fn detected_records_are_counted_per_kind() {
        let stats = ExtractionStats::new();
        stats.inc_detected(RecordKind::Article);
        stats.inc_detected(RecordKind::Article);
        stats.inc_detected(RecordKind::Book);

        let snap = stats.snapshot();
        assert_eq!(snap.records(), 3);
        assert_eq!(snap.records_of(RecordKind::Article), 2);
        assert_eq!(snap.records_of(RecordKind::Book), 1);
        assert_eq!(snap.records_of(RecordKind::Inproceedings), 0);
    }

    #[test]
    fn skipped_sums_failures_mismatches_and_panics() {
        let stats = ExtractionStats::new();
        stats.inc_parse_failures();
        stats.inc_parse_failures();
        stats.inc_mismatches();
        stats.add_task_panics(1);
        stats.inc_committed();

        assert_eq!(stats.skipped(), 4);
        assert_eq!(stats.snapshot().skipped(), 4);
        assert_eq!(stats.committed(), 1);
    }

    #[test]
    fn snapshot_captures_state() {
        let stats = ExtractionStats::new();
        stats.set_lines_read(120);
        stats.inc_committed();
        stats.inc_duplicates();
        stats.add_authorships(5);
        stats.inc_unterminated();

        let snap = stats.snapshot();
        assert_eq!(snap.lines_read, 120);
        assert_eq!(snap.papers_committed, 1);
        assert_eq!(snap.duplicate_papers, 1);
        assert_eq!(snap.authorships, 5);
        assert_eq!(snap.unterminated_records, 1);
    }
}
