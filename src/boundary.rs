//! Sequential segmentation of a line stream into record buffers.
//!
//! The detector is a shallow state machine: it looks for the start marker of
//! any known [`RecordKind`] while searching, and only for the end marker of the
//! current kind while inside a record. Everything between the two markers is
//! copied verbatim; interpreting it is the parser's job. Records never nest in
//! the dumps this reads, so a start marker seen inside a record is just content.

use crate::models::{RecordBuffer, RecordKind};
use anyhow::{Context, Result};
use memchr::memmem::Finder;
use once_cell::sync::Lazy;
use std::io;
use tracing::{debug, trace};

static START_FINDERS: Lazy<[Finder<'static>; RecordKind::COUNT]> =
    Lazy::new(|| RecordKind::ALL.map(|kind| Finder::new(kind.start_marker())));

static END_FINDERS: Lazy<[Finder<'static>; RecordKind::COUNT]> =
    Lazy::new(|| RecordKind::ALL.map(|kind| Finder::new(kind.end_marker())));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Searching,
    Inside(RecordKind),
}

/// Classifies a line by the first start marker it contains.
pub fn classify_start(line: &str) -> Option<RecordKind> {
    RecordKind::ALL
        .into_iter()
        .find(|kind| START_FINDERS[kind.index()].find(line.as_bytes()).is_some())
}

fn closes(kind: RecordKind, line: &str) -> bool {
    END_FINDERS[kind.index()].find(line.as_bytes()).is_some()
}

pub struct RecordBoundaryDetector {
    state: DetectorState,
    buffer: Vec<String>,
}

impl Default for RecordBoundaryDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBoundaryDetector {
    pub fn new() -> Self {
        Self {
            state: DetectorState::Searching,
            buffer: Vec::new(),
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Consumes one line, returning a record when this line closes one.
    pub fn feed(&mut self, line: String) -> Option<RecordBuffer> {
        match self.state {
            DetectorState::Searching => {
                if let Some(kind) = classify_start(&line) {
                    trace!(%kind, "Record start");
                    self.state = DetectorState::Inside(kind);
                    self.buffer = vec![line];
                }
                None
            }
            DetectorState::Inside(kind) => {
                let is_end = closes(kind, &line);
                self.buffer.push(line);
                if !is_end {
                    return None;
                }
                trace!(%kind, lines = self.buffer.len(), "Record end");
                self.state = DetectorState::Searching;
                Some(RecordBuffer {
                    kind,
                    lines: std::mem::take(&mut self.buffer),
                })
            }
        }
    }

    /// Ends the stream. Returns the number of buffered lines dropped if a
    /// record was still open.
    pub fn finish(self) -> Option<usize> {
        match self.state {
            DetectorState::Searching => None,
            DetectorState::Inside(kind) => {
                debug!(%kind, lines = self.buffer.len(), "Discarding unterminated record");
                Some(self.buffer.len())
            }
        }
    }
}

/// Drives a [`RecordBoundaryDetector`] over a fallible line source.
///
/// Read errors are reported with the 1-based line number they occurred at and
/// end iteration.
pub struct Records<I> {
    lines: I,
    detector: Option<RecordBoundaryDetector>,
    lines_read: u64,
    unterminated: bool,
}

impl<I> Records<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            detector: Some(RecordBoundaryDetector::new()),
            lines_read: 0,
            unterminated: false,
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Whether the stream ended inside a record. Only meaningful once exhausted.
    pub fn ended_unterminated(&self) -> bool {
        self.unterminated
    }
}

impl<I> Iterator for Records<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<RecordBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        let detector = self.detector.as_mut()?;
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.lines_read += 1;
                    if let Some(record) = detector.feed(line) {
                        return Some(Ok(record));
                    }
                }
                Some(Err(e)) => {
                    let line_no = self.lines_read + 1;
                    self.detector = None;
                    return Some(
                        Err(e).with_context(|| format!("Failed to read input at line {line_no}")),
                    );
                }
                None => {
                    if let Some(detector) = self.detector.take() {
                        self.unterminated = detector.finish().is_some();
                    }
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Vec<RecordBuffer> {
        let mut detector = RecordBoundaryDetector::new();
        lines
            .iter()
            .filter_map(|l| detector.feed(l.to_string()))
            .collect()
    }

    #[test]
    fn single_record_is_captured_with_markers() {
        let records = run(&[
            "<rdf:RDF>",
            r#"<dblp:Article rdf:about="https://dblp.org/rec/journals/x/A1">"#,
            "<dblp:title>Foo</dblp:title>",
            "</dblp:Article>",
            "</rdf:RDF>",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Article);
        assert_eq!(records[0].lines.len(), 3);
        assert!(records[0].lines[0].contains("rdf:about"));
        assert_eq!(records[0].lines[2], "</dblp:Article>");
    }

    #[test]
    fn lines_between_records_are_discarded() {
        let records = run(&[
            "<dblp:Inproceedings rdf:about=\"a\">",
            "</dblp:Inproceedings>",
            "<dblp:Person rdf:about=\"p\">",
            "noise",
            "<dblp:Book rdf:about=\"b\">",
            "</dblp:Book>",
        ]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Inproceedings);
        assert_eq!(records[1].kind, RecordKind::Book);
        assert_eq!(records[1].lines.len(), 2);
    }

    #[test]
    fn other_kind_start_inside_record_is_content() {
        let records = run(&[
            "<dblp:Article rdf:about=\"a\">",
            "<dblp:Inproceedings rdf:about=\"nested\">",
            "</dblp:Inproceedings>",
            "still article",
            "</dblp:Article>",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Article);
        assert_eq!(records[0].lines.len(), 5);
    }

    #[test]
    fn only_matching_end_marker_closes() {
        let mut detector = RecordBoundaryDetector::new();
        assert!(detector.feed("<dblp:Book rdf:about=\"b\">".into()).is_none());
        assert!(detector.feed("</dblp:Article>".into()).is_none());
        assert_eq!(detector.state(), DetectorState::Inside(RecordKind::Book));
        assert!(detector.feed("</dblp:Book>".into()).is_some());
        assert_eq!(detector.state(), DetectorState::Searching);
    }

    #[test]
    fn start_and_end_on_one_line_waits_for_next_end() {
        let records = run(&[
            "<dblp:Article rdf:about=\"a\"></dblp:Article>",
            "<dblp:title>swallowed</dblp:title>",
            "</dblp:Article>",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lines.len(), 3);
    }

    #[test]
    fn unterminated_record_yields_nothing() {
        let mut detector = RecordBoundaryDetector::new();
        assert!(detector.feed("<dblp:Article rdf:about=\"a\">".into()).is_none());
        assert!(detector.feed("<dblp:title>Half</dblp:title>".into()).is_none());
        assert_eq!(detector.finish(), Some(2));
    }

    #[test]
    fn finish_while_searching_drops_nothing() {
        let detector = RecordBoundaryDetector::new();
        assert_eq!(detector.finish(), None);
    }

    #[test]
    fn classify_start_recognizes_each_kind() {
        for kind in RecordKind::ALL {
            let line = format!("  {} rdf:about=\"x\">", kind.start_marker());
            assert_eq!(classify_start(&line), Some(kind));
        }
        assert_eq!(classify_start("<dblp:Person rdf:about=\"x\">"), None);
        assert_eq!(classify_start("</dblp:Article>"), None);
    }

    #[test]
    fn records_iterator_counts_lines_and_flags_unterminated() {
        let input = vec![
            Ok("<dblp:Article rdf:about=\"a\">".to_string()),
            Ok("</dblp:Article>".to_string()),
            Ok("<dblp:Book rdf:about=\"b\">".to_string()),
        ];
        let mut records = Records::new(input.into_iter());
        let first = records.next().unwrap().unwrap();
        assert_eq!(first.kind, RecordKind::Article);
        assert!(records.next().is_none());
        assert_eq!(records.lines_read(), 3);
        assert!(records.ended_unterminated());
    }

    #[test]
    fn records_iterator_reports_read_error_with_line_number() {
        let input = vec![
            Ok("<dblp:Article rdf:about=\"a\">".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad gzip")),
            Ok("</dblp:Article>".to_string()),
        ];
        let mut records = Records::new(input.into_iter());
        let err = records.next().unwrap().unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(records.next().is_none());
    }
}
