use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::Error;
use crate::fonts::FontAsset;
use crate::layout::TemplateLayout;
use crate::model::{FieldRecord, RenderedArtifact};
use crate::pdf::Template;
use crate::render::render_record;

#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` uses rayon's global pool.
    pub jobs: Option<usize>,
}

/// A record left out of the batch because it has no display value.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    /// Source line of the record, when it came from a file.
    pub line: Option<u64>,
    pub reason: String,
}

/// A record whose render failed; other rows are unaffected.
#[derive(Debug)]
pub struct RowError {
    pub row: usize,
    pub line: Option<u64>,
    pub name: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// In input order of the records that were rendered.
    pub artifacts: Vec<RenderedArtifact>,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<RowError>,
}

/// Where a record came from, for messages: its source line when known.
fn locate(row: usize, line: Option<u64>) -> String {
    match line {
        Some(line) => format!("Line {line}"),
        None => format!("Row {}", row + 1),
    }
}

/// Fail fast on problems shared by every row, before any work fans out.
fn preflight(template: &Template, layout: &TemplateLayout, font: &FontAsset) -> Result<(), Error> {
    let mut probe = template.load()?;
    let chars: BTreeSet<char> = layout.mark_glyph.chars().collect();
    let missing = font.unsupported_chars(&chars)?;
    if !missing.is_empty() {
        return Err(Error::Layout(format!(
            "mark glyph {:?} cannot be drawn with {}",
            layout.mark_glyph,
            font.name()
        )));
    }
    font.embed(probe.document_mut(), &chars)?;
    Ok(())
}

/// Render every record against the template.
///
/// Rows without a display value are excluded up front. The rest render
/// concurrently, each from its own parse of the template bytes; results are
/// gathered by input position, not completion order. Template and font
/// failures abort the batch, anything else is reported per row.
pub fn process_batch(
    template: &Template,
    layout: &TemplateLayout,
    font: &FontAsset,
    records: &[FieldRecord],
    options: &BatchOptions,
) -> Result<BatchReport, Error> {
    let t0 = Instant::now();
    preflight(template, layout, font)?;

    let mut report = BatchReport::default();
    let mut pending: Vec<(usize, &str, &FieldRecord)> = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        match record.display_value(&layout.display_field) {
            Some(name) => pending.push((row, name, record)),
            None => {
                log::warn!(
                    "{}: no value for {}, skipped",
                    locate(row, record.line()),
                    layout.display_field
                );
                report.skipped.push(SkippedRow {
                    row,
                    line: record.line(),
                    reason: format!("missing {}", layout.display_field),
                });
            }
        }
    }

    let render_all = || -> Vec<(usize, String, Result<Vec<u8>, Error>)> {
        pending
            .par_iter()
            .map(|&(row, name, record)| {
                let t = Instant::now();
                let result = render_record(template, layout, font, record);
                log::debug!(
                    "{}: {name} rendered in {:.1}ms",
                    locate(row, record.line()),
                    t.elapsed().as_secs_f64() * 1000.0
                );
                (row, name.to_string(), result)
            })
            .collect()
    };

    let results = match options.jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!("cannot start {n} workers: {e}")))
            })?
            .install(render_all),
        None => render_all(),
    };

    for (row, name, result) in results {
        match result {
            Ok(bytes) => report.artifacts.push(RenderedArtifact { row, name, bytes }),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                let line = records[row].line();
                log::warn!("{}: {name} failed: {error}", locate(row, line));
                report.errors.push(RowError {
                    row,
                    line,
                    name,
                    error,
                });
            }
        }
    }

    log::info!(
        "Batch: {} rendered, {} skipped, {} failed in {:.1}ms",
        report.artifacts.len(),
        report.skipped.len(),
        report.errors.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(report)
}
