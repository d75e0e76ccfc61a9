use crate::catalog::Catalog;
use crate::error::ParseError;
use crate::models::{EntityId, Relation, RecordBuffer};
use crate::parser::RecordParser;
use crate::stats::ExtractionStats;
use tracing::{debug, warn};

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed {
        paper: EntityId,
        authors: usize,
        new_paper: bool,
    },
    ParseFailed(ParseError),
    /// Declared author count disagreed with resolved signatures; nothing was written.
    Mismatched { declared: usize, resolved: usize },
}

/// Per-run context handed to every worker task: the parser, the shared
/// catalog and the run counters.
pub struct RecordProcessor<P> {
    parser: P,
    catalog: Catalog,
    stats: ExtractionStats,
}

impl<P: RecordParser> RecordProcessor<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            catalog: Catalog::new(),
            stats: ExtractionStats::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    pub fn into_parts(self) -> (Catalog, ExtractionStats) {
        (self.catalog, self.stats)
    }

    /// Parses one record and commits it to the catalog.
    ///
    /// Parsing and validation finish before the first shared write, so a
    /// rejected record leaves no trace in the catalog.
    pub fn process(&self, record: RecordBuffer) -> Outcome {
        let parsed = match self.parser.parse(&record) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(kind = %record.kind, error = %e, "Skipping unparsable record");
                self.stats.inc_parse_failures();
                return Outcome::ParseFailed(e);
            }
        };
        drop(record);

        let declared = parsed.declared_authors.len();
        let resolved = parsed.authors.len();
        if declared != resolved {
            warn!(
                paper = %parsed.paper.dblp_id,
                declared,
                resolved,
                "Author count mismatch, dropping record"
            );
            self.stats.inc_mismatches();
            return Outcome::Mismatched { declared, resolved };
        }

        let catalog = &self.catalog;
        let (paper_id, new_paper) = catalog.paper_ids.get_or_create(parsed.paper.dblp_id.as_str());
        if !new_paper {
            debug!(paper = %parsed.paper.dblp_id, id = paper_id, "Paper seen again, overwriting");
            self.stats.inc_duplicates();
        }

        let mut relations: Vec<Relation> = Vec::with_capacity(resolved);
        for author in parsed.authors {
            let (author_id, _) = catalog.author_ids.get_or_create(author.dblp_id.as_str());
            catalog.authors.store(author_id, author);
            relations.push((paper_id, author_id));
        }
        catalog.authorships.extend(relations);
        catalog.papers.store(paper_id, parsed.paper);

        self.stats.inc_committed();
        self.stats.add_authorships(resolved as u64);

        Outcome::Committed {
            paper: paper_id,
            authors: resolved,
            new_paper,
        }
    }
}
