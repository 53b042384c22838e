//! docrecon CLI - document reconstruction tool

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docrecon::reconstruct::{DEFAULT_DPI, DEFAULT_LANGUAGE, DEFAULT_MARGIN, DEFAULT_THRESHOLD};
use docrecon::{
    detect_input_kind, Document, Error, ErrorClass, InputKind, Mode, PageSelection, PageSource,
    PdfSource, ReconstructOptions, Reconstructor, RenderOptions, Tool, ToolLocator,
    WriterRegistry,
};

#[derive(Parser)]
#[command(name = "docrecon")]
#[command(version)]
#[command(about = "Reconstruct PDFs and scans into LaTeX, Markdown, JSON, or text", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,

    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show input and tool information
    Info {
        /// Input PDF or image file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input PDF or image file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file; the extension selects the format (.tex, .md, .json, .txt, .docx)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Reconstruction mode: structured, ocr, or formula
    #[arg(short, long, env = "DOCRECON_MODE", default_value = "structured")]
    mode: Mode,

    /// Confidence below which an OCR block is treated as a formula (0-100)
    #[arg(short, long, env = "DOCRECON_THRESHOLD", default_value_t = DEFAULT_THRESHOLD,
          value_parser = clap::value_parser!(u32).range(0..=100))]
    threshold: u32,

    /// Pixels added around a formula block before cropping
    #[arg(long, env = "DOCRECON_MARGIN", default_value_t = DEFAULT_MARGIN)]
    margin: u32,

    /// OCR language code
    #[arg(short, long, env = "DOCRECON_LANG", default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Rasterization resolution
    #[arg(long, env = "DOCRECON_DPI", default_value_t = DEFAULT_DPI)]
    dpi: u32,

    /// Font size for text without a declared size
    #[arg(long, env = "DOCRECON_FONT_SIZE")]
    font_size: Option<f32>,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(short, long)]
    pages: Option<PageSelection>,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Include YAML frontmatter (Markdown output)
    #[arg(long)]
    frontmatter: bool,
}

#[derive(Args, Clone)]
struct ToolArgs {
    /// Path to the tesseract binary
    #[arg(long, env = "DOCRECON_TESSERACT", value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Tesseract language data directory
    #[arg(long, env = "DOCRECON_TESSDATA", value_name = "DIR")]
    tessdata: Option<PathBuf>,

    /// Path to the pdftoppm binary
    #[arg(long, env = "DOCRECON_PDFTOPPM", value_name = "PATH")]
    pdftoppm: Option<PathBuf>,

    /// Formula recognizer command (default: pix2tex)
    #[arg(long, env = "DOCRECON_FORMULA_CMD", value_name = "PATH")]
    formula_cmd: Option<PathBuf>,

    /// Extra argument for the formula recognizer (repeatable)
    #[arg(long, value_name = "ARG", allow_hyphen_values = true)]
    formula_arg: Vec<String>,
}

impl ToolArgs {
    fn locator(&self) -> ToolLocator {
        let mut locator = ToolLocator::new();
        if let Some(path) = &self.tesseract {
            locator = locator.with_override(Tool::Tesseract, path);
        }
        if let Some(path) = &self.pdftoppm {
            locator = locator.with_override(Tool::Pdftoppm, path);
        }
        if let Some(path) = &self.formula_cmd {
            locator = locator.with_override(Tool::FormulaRecognizer, path);
        }
        locator
    }
}

/// Exit code for configuration and input errors.
const EXIT_FATAL: u8 = 1;
/// Exit code when the document was reconstructed but could not be written.
const EXIT_OUTPUT: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Info { input, tools }) => cmd_info(&input, &tools),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match (&cli.convert.input, &cli.convert.output) {
            (Some(input), Some(output)) => cmd_convert(input, output, &cli.convert, &cli.tools),
            _ => {
                println!("{}", "Usage: docrecon <INPUT> <OUTPUT> [OPTIONS]".yellow());
                println!("       docrecon --help for more information");
                Ok(())
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if e.class() == ErrorClass::OutputFailure {
                ExitCode::from(EXIT_OUTPUT)
            } else {
                ExitCode::from(EXIT_FATAL)
            }
        }
    }
}

fn reconstruct_options(args: &ConvertArgs) -> ReconstructOptions {
    let mut options = ReconstructOptions::new()
        .with_mode(args.mode)
        .with_threshold(args.threshold)
        .with_margin(args.margin)
        .with_language(args.lang.clone())
        .with_dpi(args.dpi)
        .with_parallel(!args.sequential);

    if let Some(size) = args.font_size {
        options = options.with_default_font_size(size);
    }
    if let Some(pages) = &args.pages {
        options = options.with_pages(pages.clone());
    }
    options
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    args: &ConvertArgs,
    tools: &ToolArgs,
) -> Result<(), Error> {
    let render_options = RenderOptions::new().with_frontmatter(args.frontmatter);
    let registry = WriterRegistry::with_options(render_options);
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !registry.supports(ext) {
        return Err(Error::InvalidConfig(format!(
            "cannot infer output format from {} (supported: {})",
            output.display(),
            registry.supported_extensions().join(", ")
        )));
    }

    let mut reconstructor = Reconstructor::new()
        .with_options(reconstruct_options(args))
        .with_locator(tools.locator());
    if let Some(dir) = &tools.tessdata {
        reconstructor = reconstructor.with_tessdata(dir);
    }
    for arg in &tools.formula_arg {
        reconstructor = reconstructor.with_formula_arg(arg);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    pb.set_message(format!("Preparing {} mode...", args.mode));
    let pipeline = reconstructor.pipeline();
    let doc = pipeline.and_then(|pipeline| {
        pb.set_message(format!("Reconstructing {}...", input.display()));
        let source = reconstructor.open(input)?;
        pipeline.run(source.as_ref())
    });
    let doc = match doc {
        Ok(doc) => doc,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message(format!("Writing {}...", output.display()));
    let written = registry.write(&doc, output);
    pb.finish_and_clear();
    written?;

    print_summary(&doc, output);
    Ok(())
}

fn print_summary(doc: &Document, output: &Path) {
    let stats = &doc.stats;
    println!("{} {}", "Saved to".green(), output.display());
    println!(
        "  {} {} pages reconstructed",
        "├─".dimmed(),
        stats.pages_succeeded
    );
    if stats.pages_failed > 0 {
        println!(
            "  {} {}",
            "├─".dimmed(),
            format!("{} pages skipped", stats.pages_failed).yellow()
        );
    }
    println!(
        "  {} {} paragraphs, {} images, {} formulas",
        "├─".dimmed(),
        stats.paragraphs,
        stats.images,
        stats.formulas
    );
    println!(
        "  {} {} formula fallbacks, {} images skipped",
        "└─".dimmed(),
        stats.formula_fallbacks,
        stats.images_skipped
    );
}

fn cmd_info(input: &Path, tools: &ToolArgs) -> Result<(), Error> {
    println!("{}", "Input Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());

    match detect_input_kind(input)? {
        InputKind::Pdf(format) => {
            println!("{}: PDF {}", "Format".bold(), format.version);
            let source = PdfSource::open(input)?;
            println!("{}: {}", "Pages".bold(), source.page_count());
        }
        InputKind::Image { mime_type } => {
            println!("{}: {}", "Format".bold(), mime_type);
            println!("{}: 1", "Pages".bold());
        }
    }

    println!();
    println!("{}", "External Tools".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let locator = tools.locator();
    for tool in [Tool::Pdftoppm, Tool::Tesseract, Tool::FormulaRecognizer] {
        match locator.resolve(tool) {
            Ok(path) => println!("{}: {}", tool.to_string().bold(), path.display()),
            Err(_) => println!("{}: {}", tool.to_string().bold(), "not found".yellow()),
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docrecon".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document reconstruction tool");
    println!();
    println!("Modes: structured, ocr, formula");
    println!("Outputs: .tex, .md, .json, .txt, .docx");
    println!("License: MIT");
}
