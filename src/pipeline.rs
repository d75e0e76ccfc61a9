//! The extraction run: sequential boundary detection feeding a worker pool.

use crate::boundary::Records;
use crate::catalog::Catalog;
use crate::config::{default_threads, PROGRESS_INTERVAL};
use crate::error::{IndexError, LookupError};
use crate::models::{Author, EntityId, Paper, Relation, RecordKind};
use crate::parser::RecordParser;
use crate::pool::WorkerPool;
use crate::processor::RecordProcessor;
use crate::stats::StatsSnapshot;
use anyhow::{anyhow, Result};
use indicatif::ProgressBar;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Pipeline<P> {
    parser: P,
    threads: usize,
    limit: Option<u64>,
    progress: ProgressBar,
}

impl<P> Pipeline<P>
where
    P: RecordParser + 'static,
{
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            threads: default_threads(),
            limit: None,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Stop detecting records after `limit` of them.
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Spinner ticked while records are detected.
    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the whole extraction over `lines`.
    ///
    /// Returns only after every detected record has been processed. A read
    /// error aborts the run: the pool is shut down and no result is produced.
    pub fn run<I>(self, lines: I) -> Result<PipelineResult>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let Pipeline {
            parser,
            threads,
            limit,
            progress,
        } = self;

        let processor = Arc::new(RecordProcessor::new(parser));
        let pool = WorkerPool::new(threads)?;
        info!(threads = pool.threads(), "Scanning dump");

        let mut records = Records::new(lines.into_iter());
        let mut detected: u64 = 0;
        while limit.is_none_or(|max| detected < max) {
            let Some(record) = records.next() else {
                break;
            };
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    progress.finish_and_clear();
                    return Err(e);
                }
            };
            detected += 1;
            processor.stats().inc_detected(record.kind);
            if detected % PROGRESS_INTERVAL == 0 {
                progress.set_message(format!("{detected} records"));
                progress.tick();
            }

            let task = Arc::clone(&processor);
            pool.enqueue(move || {
                task.process(record);
            })?;
        }

        let stats = processor.stats();
        stats.set_lines_read(records.lines_read());
        if records.ended_unterminated() {
            warn!("Dump ended inside an unterminated record");
            stats.inc_unterminated();
        }
        if limit.is_some_and(|max| detected >= max) {
            info!(limit = detected, "Record limit reached");
        }

        info!(records = detected, "Scan complete, waiting for workers");
        pool.wait_for_all();
        let report = pool.shutdown();
        stats.add_task_panics(report.panicked);
        progress.finish_and_clear();

        let (catalog, stats) = Arc::into_inner(processor)
            .ok_or_else(|| anyhow!("Record processor still shared after worker shutdown"))?
            .into_parts();
        let stats = stats.snapshot();
        debug!(?stats, "Run statistics");

        Ok(PipelineResult { catalog, stats })
    }
}

/// Read-only view of a finished run.
pub struct PipelineResult {
    catalog: Catalog,
    stats: StatsSnapshot,
}

impl PipelineResult {
    pub fn stats(&self) -> &StatsSnapshot {
        &self.stats
    }

    pub fn max_paper_id(&self) -> EntityId {
        self.catalog.paper_ids.max_id()
    }

    pub fn max_author_id(&self) -> EntityId {
        self.catalog.author_ids.max_id()
    }

    pub fn paper_id(&self, dblp_id: &str) -> Option<EntityId> {
        self.catalog.paper_ids.try_get(dblp_id)
    }

    pub fn author_id(&self, dblp_id: &str) -> Option<EntityId> {
        self.catalog.author_ids.try_get(dblp_id)
    }

    pub fn paper(&self, id: EntityId) -> Result<Paper, LookupError> {
        self.catalog.papers.get(id)
    }

    pub fn author(&self, id: EntityId) -> Result<Author, LookupError> {
        self.catalog.authors.get(id)
    }

    pub fn with_paper<R>(&self, id: EntityId, f: impl FnOnce(&Paper) -> R) -> Result<R, LookupError> {
        self.catalog.papers.with(id, f)
    }

    pub fn with_author<R>(&self, id: EntityId, f: impl FnOnce(&Author) -> R) -> Result<R, LookupError> {
        self.catalog.authors.with(id, f)
    }

    pub fn authorship_count(&self) -> usize {
        self.catalog.authorships.len()
    }

    pub fn authorship(&self, index: usize) -> Result<Relation, IndexError> {
        self.catalog.authorships.get(index)
    }

    /// All (paper, author) pairs in log order.
    pub fn authorships(&self) -> Vec<Relation> {
        self.catalog.authorships.entries().to_vec()
    }

    pub fn records_of(&self, kind: RecordKind) -> u64 {
        self.stats.records_of(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::{ParsedRecord, RecordBuffer};
    use crate::parser::DblpRdfParser;

    fn lines(text: &str) -> Vec<io::Result<String>> {
        text.lines().map(|l| Ok(l.to_string())).collect()
    }

    fn article(key: &str, authors: &[&str]) -> String {
        let mut out = format!("<dblp:Article rdf:about=\"{key}\">\n");
        for a in authors {
            out.push_str(&format!("<dblp:authoredBy rdf:resource=\"{a}\"/>\n"));
        }
        for a in authors {
            out.push_str("<dblp:AuthorSignature>\n");
            out.push_str(&format!("<dblp:signatureCreator rdf:resource=\"{a}\"/>\n"));
            out.push_str(&format!("<dblp:signatureDblpName>{a} name</dblp:signatureDblpName>\n"));
            out.push_str("</dblp:AuthorSignature>\n");
        }
        out.push_str(&format!("<dblp:title>Title of {key}</dblp:title>\n"));
        out.push_str("<dblp:yearOfPublication>2020</dblp:yearOfPublication>\n");
        out.push_str("</dblp:Article>\n");
        out
    }

    #[test]
    fn run_builds_catalog() {
        let dump = format!(
            "<rdf:RDF>\n{}{}{}</rdf:RDF>\n",
            article("P1", &["A1", "A2"]),
            article("P2", &["A2"]),
            article("P3", &[]),
        );
        let result = Pipeline::new(DblpRdfParser).threads(4).run(lines(&dump)).unwrap();

        assert_eq!(result.max_paper_id(), 3);
        assert_eq!(result.max_author_id(), 2);
        assert_eq!(result.authorship_count(), 3);
        assert_eq!(result.stats().papers_committed, 3);
        assert_eq!(result.stats().skipped(), 0);
        assert_eq!(result.records_of(RecordKind::Article), 3);

        for id in 1..=result.max_paper_id() {
            assert!(result.paper(id).is_ok());
        }
        for (paper, author) in result.authorships() {
            assert!(result.paper(paper).is_ok());
            assert!(result.author(author).is_ok());
        }
        let a2 = result.author_id("A2").unwrap();
        assert_eq!(
            result.authorships().iter().filter(|(_, a)| *a == a2).count(),
            2
        );
    }

    #[test]
    fn read_error_aborts_run() {
        let mut input = lines(&article("P1", &["A1"]));
        input.push(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")));
        input.extend(lines(&article("P2", &["A1"])));

        let err = Pipeline::new(DblpRdfParser).threads(2).run(input).err().unwrap();
        assert!(format!("{err:#}").contains("truncated"));
    }

    #[test]
    fn read_error_clears_progress() {
        let mut input = lines(&article("P1", &[]));
        input.push(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")));

        let progress = ProgressBar::hidden();
        let result = Pipeline::new(DblpRdfParser)
            .progress(progress.clone())
            .run(input);
        assert!(result.is_err());
        assert!(progress.is_finished());
    }

    #[test]
    fn limit_stops_detection() {
        let dump = format!("{}{}{}", article("P1", &[]), article("P2", &[]), article("P3", &[]));
        let result = Pipeline::new(DblpRdfParser)
            .limit(Some(2))
            .run(lines(&dump))
            .unwrap();
        assert_eq!(result.stats().records(), 2);
        assert_eq!(result.max_paper_id(), 2);
    }

    #[test]
    fn unterminated_tail_is_counted_not_committed() {
        let dump = format!(
            "{}<dblp:Article rdf:about=\"P2\">\n<dblp:title>Cut</dblp:title>\n",
            article("P1", &[])
        );
        let result = Pipeline::new(DblpRdfParser).run(lines(&dump)).unwrap();
        assert_eq!(result.max_paper_id(), 1);
        assert_eq!(result.stats().unterminated_records, 1);
        assert_eq!(result.paper_id("P2"), None);
    }

    #[test]
    fn skipped_records_are_reported() {
        let dump = format!(
            "{}<dblp:Book rdf:about=\"B1\">\n</dblp:Book>\n",
            article("P1", &["A1"])
        );
        let result = Pipeline::new(DblpRdfParser).run(lines(&dump)).unwrap();
        assert_eq!(result.stats().parse_failures, 1);
        assert_eq!(result.stats().skipped(), 1);
        assert_eq!(result.max_paper_id(), 1);
    }

    #[test]
    fn panicking_parser_is_contained() {
        let parser = |record: &RecordBuffer| -> Result<ParsedRecord, ParseError> {
            if record.lines[0].contains("boom") {
                panic!("parser bug");
            }
            DblpRdfParser.parse(record)
        };
        let dump = format!("{}{}", article("boom", &[]), article("P2", &[]));
        let result = Pipeline::new(parser).threads(1).run(lines(&dump)).unwrap();
        assert_eq!(result.stats().task_panics, 1);
        assert_eq!(result.max_paper_id(), 1);
        assert_eq!(result.paper(1).unwrap().dblp_id, "P2");
    }
}
