//! PDF Watermarker CLI tool
//!
//! A command-line tool for stamping diagonal text watermarks onto PDFs.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pdf_watermarker::archive::DEFAULT_ARCHIVE_NAME;
use pdf_watermarker::batch::write_batch_archive;
use pdf_watermarker::intake::{collect_inputs, InputFile};
use pdf_watermarker::pdf::{
    add_watermark, extract_metadata, WatermarkOptions, DEFAULT_FONT_SIZE, MAX_FONT_SIZE,
    MIN_FONT_SIZE,
};
use pdf_watermarker::preview::{render_preview, Debouncer, PREVIEW_DEBOUNCE};
use pdf_watermarker::session::Command;
use pdf_watermarker::state::{Action, SessionState};
use pdf_watermarker::layout::DEFAULT_ROTATION_DEGREES;
use pdf_watermarker::StandardFont;

/// PDF Watermarker - Stamp a diagonal text watermark onto PDFs
#[derive(Parser)]
#[command(name = "pdf-watermarker")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Watermark one file
    pdf-watermarker stamp report.pdf -o report-draft.pdf --text DRAFT

    # Watermark every PDF in a folder into pdfwatermarked.zip
    pdf-watermarker batch handouts/ --text \"Do not distribute\" --font Times-Bold

    # Preview the first page of the first file
    pdf-watermarker preview \"*.pdf\" -o preview.pdf --text CONFIDENTIAL --size 72 --open

    # Interactive session with a live preview
    pdf-watermarker session *.pdf --preview preview.pdf")]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Watermark settings shared by all subcommands
#[derive(Args, Clone)]
struct WatermarkArgs {
    /// Watermark text (empty leaves the pages unchanged)
    #[arg(short, long, default_value = "")]
    text: String,

    /// Standard font (run `pdf-watermarker fonts` for the list)
    #[arg(long, default_value = "Helvetica", value_parser = parse_font)]
    font: StandardFont,

    /// Font size in points
    #[arg(
        long,
        default_value_t = DEFAULT_FONT_SIZE,
        value_parser = clap::value_parser!(u16).range(MIN_FONT_SIZE as i64..=MAX_FONT_SIZE as i64)
    )]
    size: u16,

    /// Rotation in degrees (negative is clockwise)
    #[arg(long, default_value_t = DEFAULT_ROTATION_DEGREES, allow_negative_numbers = true)]
    angle: f64,

    /// Leave the Producer and ModDate entries untouched
    #[arg(long)]
    keep_metadata: bool,
}

impl WatermarkArgs {
    fn options(&self) -> WatermarkOptions {
        WatermarkOptions {
            text: self.text.clone(),
            font: self.font,
            font_size: self.size,
            rotation_degrees: self.angle,
            update_metadata: !self.keep_metadata,
            ..Default::default()
        }
    }
}

fn parse_font(name: &str) -> Result<StandardFont, String> {
    name.parse().map_err(|e: pdf_watermarker::Error| e.to_string())
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark a single PDF file
    Stamp {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Watermark many PDFs into one zip archive
    Batch {
        /// Input PDF files or directories. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output archive path
        #[arg(short, long, default_value = DEFAULT_ARCHIVE_NAME)]
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Render the watermarked first page of the first input
    Preview {
        /// Input PDF files or directories. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Interactive session: edit settings on stdin with a live preview
    Session {
        /// Initial input PDF files or directories
        inputs: Vec<String>,

        /// Preview file kept up to date while editing
        #[arg(long, default_value = "preview.pdf")]
        preview: PathBuf,

        /// Archive written by the `generate` command
        #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
        archive: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// List the standard fonts available for watermarks
    Fonts,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Stamp { input, output, watermark, open } => {
            cmd_stamp(input, output, watermark, open)
        }
        Commands::Batch { inputs, output, watermark, open } => {
            cmd_batch(inputs, output, watermark, open)
        }
        Commands::Preview { inputs, output, watermark, open } => {
            cmd_preview(inputs, output, watermark, open)
        }
        Commands::Session { inputs, preview, archive, watermark } => {
            cmd_session(inputs, preview, archive, watermark)
        }
        Commands::Info { input } => cmd_info(input),
        Commands::Fonts => cmd_fonts(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Log to stderr; RUST_LOG overrides the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Watermark a single PDF
fn cmd_stamp(input: PathBuf, output: PathBuf, watermark: WatermarkArgs, open: bool) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    add_watermark(&input, &output, &watermark.options())
        .with_context(|| format!("Failed to watermark {}", input.display()))?;

    info!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Watermark many PDFs into one archive
fn cmd_batch(inputs: Vec<String>, output: PathBuf, watermark: WatermarkArgs, open: bool) -> Result<()> {
    let files = collect_inputs(&inputs)?;

    if files.is_empty() {
        warn!("No PDF files among the inputs, nothing to do");
        return Ok(());
    }

    info!("Watermarking {} PDF files...", files.len());
    write_batch_archive(&files, &watermark.options(), &output)?;

    info!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Render a one-page preview of the first input
fn cmd_preview(inputs: Vec<String>, output: PathBuf, watermark: WatermarkArgs, open: bool) -> Result<()> {
    let files = collect_inputs(&inputs)?;
    let Some(first) = files.first() else {
        bail!("No PDF files among the inputs");
    };

    let bytes = first.read()?;
    let preview = render_preview(&bytes, &watermark.options())
        .with_context(|| format!("Failed to render preview of {}", first.name))?;
    std::fs::write(&output, preview)?;

    info!("Preview of {}: {}", first.name, output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Run the interactive session on a single-threaded runtime
fn cmd_session(
    inputs: Vec<String>,
    preview: PathBuf,
    archive: PathBuf,
    watermark: WatermarkArgs,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_session(inputs, preview, archive, watermark))
}

async fn run_session(
    inputs: Vec<String>,
    preview_path: PathBuf,
    archive_path: PathBuf,
    watermark: WatermarkArgs,
) -> Result<()> {
    let mut state = SessionState {
        text: watermark.text.clone(),
        font: watermark.font,
        font_size: watermark.size,
        ..Default::default()
    };
    if !inputs.is_empty() {
        state = state.update(Action::FilesDropped(collect_inputs(&inputs)?));
    }

    let (previews, worker) = Debouncer::spawn(
        PREVIEW_DEBOUNCE,
        move |(file, options): (InputFile, WatermarkOptions)| {
            let target = preview_path.clone();
            async move {
                let path = target.clone();
                let rendered = tokio::task::spawn_blocking(move || -> pdf_watermarker::Result<()> {
                    let bytes = file.read()?;
                    std::fs::write(&path, render_preview(&bytes, &options)?)?;
                    Ok(())
                })
                .await;

                match rendered {
                    Ok(Ok(())) => info!("Preview updated: {}", target.display()),
                    Ok(Err(e)) => warn!("Preview failed: {}", e),
                    Err(e) => warn!("Preview task failed: {}", e),
                }
            }
        },
    );

    if let Some(request) = state.preview_request() {
        previews.submit(request);
    }

    eprintln!("Commands: drop <paths>, text [<text>], font <name>, size <n>, reset, generate, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let previous = state.clone();

        match command {
            Command::Quit => break,
            Command::Drop(paths) => match collect_inputs(&paths) {
                Ok(files) => state = state.update(Action::FilesDropped(files)),
                Err(e) => warn!("{}", e),
            },
            Command::Text(text) => state = state.update(Action::TextChanged(text)),
            Command::Font(font) => state = state.update(Action::FontChanged(font)),
            Command::Size(size) => state = state.update(Action::FontSizeChanged(size)),
            Command::Reset => state = state.update(Action::Reset),
            Command::Generate => {
                state = state.update(Action::GenerationStarted);
                generate_archive(&state, &archive_path).await;
                state = state.update(Action::GenerationFinished);
            }
        }

        if state.preview_changed(&previous) {
            if let Some(request) = state.preview_request() {
                previews.submit(request);
            }
        }
    }

    // Let a pending preview finish before leaving
    drop(previews);
    worker.await?;

    Ok(())
}

/// Write the archive for the current session state, logging the outcome
async fn generate_archive(state: &SessionState, archive_path: &Path) {
    if state.files.is_empty() {
        warn!("No files to watermark");
        return;
    }

    let files = state.files.clone();
    let options = state.watermark_options();
    let output = archive_path.to_path_buf();

    let written = tokio::task::spawn_blocking(move || write_batch_archive(&files, &options, &output)).await;

    match written {
        Ok(Ok(count)) => info!("Archive with {} files: {}", count, archive_path.display()),
        Ok(Err(e)) => warn!("Generation failed: {}", e),
        Err(e) => warn!("Generation task failed: {}", e),
    }
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    for (i, size) in metadata.page_sizes.iter().enumerate() {
        println!("  Page {}: {:.1} x {:.1} pt", i + 1, size.width, size.height);
    }

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}

/// List the supported fonts
fn cmd_fonts() -> Result<()> {
    for font in StandardFont::ALL {
        println!("{}", font);
    }
    Ok(())
}
