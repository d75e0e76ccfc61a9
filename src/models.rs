use std::fmt;

/// Dense, 1-based identifier issued by an [`IdentityRegistry`](crate::registry::IdentityRegistry).
pub type EntityId = u32;

/// A (paper, author) pair as stored in the relation log.
pub type Relation = (EntityId, EntityId);

/// The closed set of record kinds the boundary detector recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Inproceedings,
    Article,
    Book,
    Incollection,
}

impl RecordKind {
    pub const COUNT: usize = 4;

    pub const ALL: [RecordKind; Self::COUNT] = [
        RecordKind::Inproceedings,
        RecordKind::Article,
        RecordKind::Book,
        RecordKind::Incollection,
    ];

    /// `(start marker, end marker)` for this kind.
    pub const fn markers(self) -> (&'static str, &'static str) {
        match self {
            RecordKind::Inproceedings => ("<dblp:Inproceedings", "</dblp:Inproceedings"),
            RecordKind::Article => ("<dblp:Article", "</dblp:Article"),
            RecordKind::Book => ("<dblp:Book", "</dblp:Book"),
            RecordKind::Incollection => ("<dblp:Incollection", "</dblp:Incollection"),
        }
    }

    pub const fn start_marker(self) -> &'static str {
        self.markers().0
    }

    pub const fn end_marker(self) -> &'static str {
        self.markers().1
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Inproceedings => "Inproceedings",
            RecordKind::Article => "Article",
            RecordKind::Book => "Book",
            RecordKind::Incollection => "Incollection",
        }
    }

    /// Position in [`RecordKind::ALL`], for per-kind counters.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw lines of one record, from its start marker line through its end marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBuffer {
    pub kind: RecordKind,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub dblp_id: String,
    pub title: String,
    pub kind: RecordKind,
    pub year: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub dblp_id: String,
    pub orcid: Option<String>,
    pub name: String,
}

/// Output of a [`RecordParser`](crate::parser::RecordParser).
///
/// `declared_authors` are the author references the record lists;
/// `authors` are the signatures that could actually be resolved to a payload.
/// The two must agree in length for the record to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub paper: Paper,
    pub declared_authors: Vec<String>,
    pub authors: Vec<Author>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, kind) in RecordKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn markers_are_distinct_prefixes() {
        for a in RecordKind::ALL {
            for b in RecordKind::ALL {
                if a != b {
                    assert!(!a.start_marker().starts_with(b.start_marker()));
                    assert!(!a.end_marker().starts_with(b.end_marker()));
                }
            }
        }
    }

    #[test]
    fn end_marker_closes_start_marker() {
        for kind in RecordKind::ALL {
            let (start, end) = kind.markers();
            assert_eq!(&end[2..], &start[1..]);
        }
    }
}
