use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use constancia_fill::{BatchOptions, DEFAULT_ARCHIVE_NAME, DEFAULT_REVISION, Job, Output, TemplateLayout};

/// Fill the certificate template once per CSV row and bundle the results.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// CSV file; the first line holds the column names
    #[arg(required_unless_present = "print_layout")]
    csv: Option<PathBuf>,

    /// PDF template (one or two pages)
    #[arg(short, long, required_unless_present = "print_layout")]
    template: Option<PathBuf>,

    /// ZIP archive to write
    #[arg(short, long, default_value = DEFAULT_ARCHIVE_NAME, conflicts_with = "out_dir")]
    output: PathBuf,

    /// Write loose PDF files into this directory instead of an archive
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Template layout descriptor (JSON); overrides --revision
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Built-in layout revision
    #[arg(long, default_value = DEFAULT_REVISION)]
    revision: String,

    /// TrueType/OpenType font to embed instead of Helvetica
    #[arg(long)]
    font: Option<PathBuf>,

    /// Number of rows rendered in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Print the selected layout as JSON and exit
    #[arg(long)]
    print_layout: bool,
}

fn load_layout(cli: &Cli) -> Result<TemplateLayout, constancia_fill::Error> {
    match &cli.layout {
        Some(path) => TemplateLayout::from_file(path),
        None => TemplateLayout::builtin(&cli.revision).ok_or_else(|| {
            constancia_fill::Error::Layout(format!(
                "unknown revision {:?} (available: {})",
                cli.revision,
                TemplateLayout::builtin_revisions().join(", ")
            ))
        }),
    }
}

fn locate(row: usize, line: Option<u64>) -> String {
    match line {
        Some(line) => format!("line {line}"),
        None => format!("row {}", row + 1),
    }
}

fn run(cli: Cli) -> Result<(), constancia_fill::Error> {
    let layout = load_layout(&cli)?;
    if cli.print_layout {
        println!("{}", layout.to_json()?);
        return Ok(());
    }

    let delimiter = u8::try_from(cli.delimiter).map_err(|_| {
        constancia_fill::Error::InputValidation(format!(
            "delimiter {:?} must be a single-byte character",
            cli.delimiter
        ))
    })?;
    let (Some(csv), Some(template)) = (cli.csv, cli.template) else {
        return Err(constancia_fill::Error::InputValidation(
            "a CSV file and a template are required".into(),
        ));
    };

    let output = match cli.out_dir {
        Some(dir) => Output::Directory(dir),
        None => Output::Archive(cli.output),
    };
    let job = Job {
        csv,
        template,
        output: output.clone(),
        layout,
        font: cli.font,
        delimiter,
        options: BatchOptions { jobs: cli.jobs },
    };

    let summary = constancia_fill::generate(&job)?;

    for (name, entry) in &summary.written {
        println!("{name} -> {entry}");
    }
    for skipped in &summary.skipped {
        eprintln!("{}: skipped ({})", locate(skipped.row, skipped.line), skipped.reason);
    }
    for failed in &summary.errors {
        eprintln!("{}: {} failed: {}", locate(failed.row, failed.line), failed.name, failed.error);
    }
    let target = match &output {
        Output::Archive(path) | Output::Directory(path) => path.display().to_string(),
    };
    println!(
        "{} documents written to {target} ({} skipped, {} failed)",
        summary.written.len(),
        summary.skipped.len(),
        summary.errors.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
