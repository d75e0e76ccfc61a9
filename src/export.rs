use crate::config::{AUTHORSHIPS_FILE, AUTHORS_FILE, PAPERS_FILE, WRITE_BUFFER_SIZE};
use crate::models::EntityId;
use crate::pipeline::PipelineResult;
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct PaperRow<'a> {
    id: EntityId,
    dblp_id: &'a str,
    title: &'a str,
    year: u16,
    kind: &'a str,
}

#[derive(Serialize)]
struct AuthorRow<'a> {
    id: EntityId,
    dblp_id: &'a str,
    name: &'a str,
    orcid: Option<&'a str>,
}

#[derive(Serialize)]
struct AuthorshipRow {
    paper: EntityId,
    author: EntityId,
}

/// Rows written per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub papers: u64,
    pub authors: u64,
    pub authorships: u64,
}

/// Header is written up front so empty tables still carry one.
fn tsv_writer(path: &Path, header: &[&str]) -> Result<Writer<BufWriter<File>>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file));
    writer.write_record(header)?;
    Ok(writer)
}

/// Writes the papers, authors and authorship tables into `output_dir`.
///
/// Every id from 1 to the registry's maximum must have a stored payload; a
/// gap means the run's invariants were broken and the export fails.
pub fn write_tables(result: &PipelineResult, output_dir: &Path) -> Result<ExportSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let mut summary = ExportSummary::default();

    let path = output_dir.join(PAPERS_FILE);
    let mut writer = tsv_writer(&path, &["NumericID", "DBLP", "Title", "Year", "Type"])?;
    for id in 1..=result.max_paper_id() {
        result
            .with_paper(id, |paper| {
                writer.serialize(PaperRow {
                    id,
                    dblp_id: &paper.dblp_id,
                    title: &paper.title,
                    year: paper.year,
                    kind: paper.kind.as_str(),
                })
            })
            .context("Paper table has a gap")??;
        summary.papers += 1;
    }
    writer.flush()?;

    let path = output_dir.join(AUTHORS_FILE);
    let mut writer = tsv_writer(&path, &["NumericID", "DBLP", "Name", "ORCID"])?;
    for id in 1..=result.max_author_id() {
        result
            .with_author(id, |author| {
                writer.serialize(AuthorRow {
                    id,
                    dblp_id: &author.dblp_id,
                    name: &author.name,
                    orcid: author.orcid.as_deref(),
                })
            })
            .context("Author table has a gap")??;
        summary.authors += 1;
    }
    writer.flush()?;

    let path = output_dir.join(AUTHORSHIPS_FILE);
    let mut writer = tsv_writer(&path, &["PaperID", "AuthorID"])?;
    for (paper, author) in result.authorships() {
        writer.serialize(AuthorshipRow { paper, author })?;
        summary.authorships += 1;
    }
    writer.flush()?;

    info!(
        papers = summary.papers,
        authors = summary.authors,
        authorships = summary.authorships,
        dir = %output_dir.display(),
        "Tables written"
    );

    Ok(summary)
}
