mod archive;
mod batch;
mod classify;
mod error;
mod fonts;
mod ingest;
mod layout;
mod model;
mod pdf;
mod render;
mod source;

pub use archive::{ArtifactSink, DEFAULT_ARCHIVE_NAME, DirectorySink, ZipSink, entry_names};
pub use batch::{BatchOptions, BatchReport, RowError, SkippedRow, process_batch};
pub use classify::{FieldKind, classify};
pub use error::Error;
pub use fonts::{FontAsset, to_winansi_bytes};
pub use ingest::{CsvInput, parse_csv, read_csv_file};
pub use layout::{DEFAULT_REVISION, TemplateLayout};
pub use model::{CoordinateSpec, FieldRecord, Page, Placement, Point, RenderedArtifact};
pub use pdf::Template;
pub use render::{plan_page, render_record};

use std::path::PathBuf;
use std::time::Instant;

/// Where a run writes its artifacts.
#[derive(Clone, Debug)]
pub enum Output {
    Archive(PathBuf),
    Directory(PathBuf),
}

/// One end-to-end run: CSV + template in, archive or directory out.
#[derive(Clone, Debug)]
pub struct Job {
    pub csv: PathBuf,
    pub template: PathBuf,
    pub output: Output,
    pub layout: TemplateLayout,
    pub font: Option<PathBuf>,
    pub delimiter: u8,
    pub options: BatchOptions,
}

#[derive(Debug)]
pub struct RunSummary {
    /// Display name and output entry name of every artifact, in input order.
    pub written: Vec<(String, String)>,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<RowError>,
}

/// Check that the CSV can drive this layout at all.
pub fn validate_input(input: &CsvInput, layout: &TemplateLayout) -> Result<(), Error> {
    if !input.has_column(&layout.display_field) {
        return Err(Error::InputValidation(format!(
            "required column {:?} not found (columns: {})",
            layout.display_field,
            input.headers.join(", ")
        )));
    }
    Ok(())
}

pub fn generate(job: &Job) -> Result<RunSummary, Error> {
    let t0 = Instant::now();

    let input = read_csv_file(&job.csv, job.delimiter)?;
    validate_input(&input, &job.layout)?;
    let t_parse = t0.elapsed();

    let template = Template::open(&job.template)?;
    let font = match &job.font {
        Some(path) => FontAsset::open(path)?,
        None => FontAsset::Helvetica,
    };
    let t_load = t0.elapsed();

    let report = process_batch(&template, &job.layout, &font, &input.records, &job.options)?;
    let t_render = t0.elapsed();

    let names = match &job.output {
        Output::Archive(path) => {
            let file = std::fs::File::create(path).map_err(|e| {
                Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
            })?;
            let mut sink = ZipSink::new(std::io::BufWriter::new(file));
            sink.deliver(&report.artifacts)?
        }
        Output::Directory(dir) => DirectorySink::new(dir).deliver(&report.artifacts)?,
    };
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, load={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({} documents)",
        t_parse.as_secs_f64() * 1000.0,
        (t_load - t_parse).as_secs_f64() * 1000.0,
        (t_render - t_load).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.artifacts.len(),
    );

    let written = report
        .artifacts
        .into_iter()
        .zip(names)
        .map(|(artifact, entry)| (artifact.name, entry))
        .collect();

    Ok(RunSummary {
        written,
        skipped: report.skipped,
        errors: report.errors,
    })
}
