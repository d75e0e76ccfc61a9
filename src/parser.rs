use crate::error::ParseError;
use crate::models::{Author, Paper, ParsedRecord, RecordBuffer};
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::Regex;
use std::borrow::Cow;

/// Turns a record buffer into structured fields. Must be pure: it runs on
/// worker threads and its output is the only thing the processor commits.
pub trait RecordParser: Send + Sync {
    fn parse(&self, record: &RecordBuffer) -> Result<ParsedRecord, ParseError>;
}

impl<F> RecordParser for F
where
    F: Fn(&RecordBuffer) -> Result<ParsedRecord, ParseError> + Send + Sync,
{
    fn parse(&self, record: &RecordBuffer) -> Result<ParsedRecord, ParseError> {
        self(record)
    }
}

static ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"rdf:about="([^"]+)""#).unwrap());

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<dblp:title>([^<]+)</dblp:title>").unwrap());

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<dblp:yearOfPublication[^>]*>([^<]*)</dblp:yearOfPublication>").unwrap()
});

static AUTHORED_BY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<dblp:authoredBy rdf:resource="([^"]+)""#).unwrap());

static CREATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<dblp:signatureCreator rdf:resource="([^"]+)""#).unwrap());

static ORCID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<dblp:signatureOrcid rdf:resource="([^"]+)""#).unwrap());

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<dblp:signatureDblpName>([^<]+)</dblp:signatureDblpName>").unwrap()
});

const SIGNATURE_OPEN: &str = "<dblp:AuthorSignature";
const SIGNATURE_CLOSE: &str = "</dblp:AuthorSignature";

/// Field grammar for the dblp.org RDF/XML dump.
#[derive(Debug, Clone, Copy, Default)]
pub struct DblpRdfParser;

impl RecordParser for DblpRdfParser {
    fn parse(&self, record: &RecordBuffer) -> Result<ParsedRecord, ParseError> {
        let dblp_id = record
            .lines
            .first()
            .and_then(|line| capture(&ID_REGEX, line))
            .ok_or(ParseError::MissingIdentifier)?
            .to_string();

        let mut title = None;
        let mut year = None;
        let mut declared_authors = Vec::new();
        let mut authors = Vec::new();
        let mut signature: Option<SignatureFields> = None;

        for line in record.lines.iter().skip(1) {
            if signature.is_none() && line.contains(SIGNATURE_OPEN) {
                signature = Some(SignatureFields::default());
            }
            if let Some(fields) = signature.as_mut() {
                // Fields and the close marker may share a line with the open marker.
                fields.absorb(line);
                if line.contains(SIGNATURE_CLOSE) {
                    if let Some(author) = signature.take().and_then(SignatureFields::into_author) {
                        authors.push(author);
                    }
                }
                continue;
            }
            if let Some(value) = capture(&AUTHORED_BY_REGEX, line) {
                declared_authors.push(value.to_string());
                continue;
            }
            if title.is_none() {
                if let Some(value) = capture(&TITLE_REGEX, line) {
                    title = Some(decode(value));
                    continue;
                }
            }
            if year.is_none() {
                if let Some(value) = capture(&YEAR_REGEX, line) {
                    year = Some(value.trim().to_string());
                }
            }
        }

        let title = title.ok_or_else(|| ParseError::MissingTitle {
            id: dblp_id.clone(),
        })?;
        let raw_year = year.ok_or_else(|| ParseError::MissingYear {
            id: dblp_id.clone(),
        })?;
        let year = raw_year
            .parse::<u16>()
            .map_err(|_| ParseError::InvalidYear {
                id: dblp_id.clone(),
                value: raw_year.clone(),
            })?;

        Ok(ParsedRecord {
            paper: Paper {
                dblp_id,
                title,
                kind: record.kind,
                year,
            },
            declared_authors,
            authors,
        })
    }
}

#[derive(Default)]
struct SignatureFields {
    creator: Option<String>,
    orcid: Option<String>,
    name: Option<String>,
}

impl SignatureFields {
    fn absorb(&mut self, line: &str) {
        if let Some(value) = capture(&CREATOR_REGEX, line) {
            self.creator = Some(value.to_string());
        }
        if let Some(value) = capture(&ORCID_REGEX, line) {
            self.orcid = Some(value.to_string());
        }
        if let Some(value) = capture(&NAME_REGEX, line) {
            self.name = Some(decode(value));
        }
    }

    /// A signature without a creator can't be keyed and does not count as resolved.
    fn into_author(self) -> Option<Author> {
        let dblp_id = self.creator?;
        Some(Author {
            dblp_id,
            orcid: self.orcid,
            name: self.name.unwrap_or_default(),
        })
    }
}

fn capture<'a>(regex: &Regex, line: &'a str) -> Option<&'a str> {
    regex
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolves XML entities, keeping the raw text if it is not well formed.
fn decode(raw: &str) -> String {
    match unescape(raw) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => raw.to_string(),
    }
}
