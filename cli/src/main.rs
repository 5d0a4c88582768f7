mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gritbook::{Document, TranslationError, XmlError};

use crate::config::{Config, Overrides};

#[derive(Parser)]
#[command(name = "gritbook", version, about = "Grit book XML translator")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Treat unknown tags as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Directory image paths are resolved against (default: the input file's directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Configuration file (default: gritbook.toml next to the input file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a book and report problems
    Check(CheckArgs),

    /// Print the translated tree
    Dump(DumpArgs),

    /// Run .test.xml golden files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Book XML file
    file: PathBuf,
}

#[derive(clap::Args)]
struct DumpArgs {
    /// Book XML file
    file: PathBuf,

    /// Print the Rust debug form instead of the outline
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.xml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gritbook=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match &cli.command {
        Command::Check(args) => {
            load(&cli, &args.file, color_choice);
            eprintln!("ok: {} translated successfully", args.file.display());
        }
        Command::Dump(args) => {
            let document = load(&cli, &args.file, color_choice);
            if args.debug {
                println!("{:#?}", document);
            } else {
                print!("{}", document);
            }
        }
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&args.path, cli.no_color, &args.category);
            process::exit(exit_code);
        }
    }
}

/// Read, parse and translate `file`, printing diagnostics on the way.
/// Exits the process on any fatal problem.
fn load(cli: &Cli, file: &Path, color_choice: ColorChoice) -> Document {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file.display(), e);
            process::exit(1);
        }
    };

    let input_dir = file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = match Config::load(cli.config.as_deref(), &input_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let options = config.options(
        &input_dir,
        &Overrides {
            strict: cli.strict,
            base_dir: cli.base_dir.clone(),
        },
    );

    let name = file.display().to_string();
    let mut files = SimpleFiles::new();
    let file_id = files.add(name.clone(), source.clone());

    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    let emit = |diagnostic: Diagnostic<usize>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
    };

    let root = match gritbook::xml::parse_str(&source, &name) {
        Ok(root) => root,
        Err(error) => {
            emit(xml_diagnostic(&error, file_id, &files));
            process::exit(1);
        }
    };

    match gritbook::translate(&root, &options) {
        Ok((document, warnings)) => {
            emit_warnings(&warnings, file_id, &files, &emit);
            document
        }
        Err(error) => {
            emit(error.to_diagnostic(Severity::Error, file_id, &files));
            process::exit(1);
        }
    }
}

fn emit_warnings(
    warnings: &[TranslationError],
    file_id: usize,
    files: &SimpleFiles<String, String>,
    emit: impl Fn(Diagnostic<usize>),
) {
    for warning in warnings {
        emit(warning.to_diagnostic(Severity::Warning, file_id, files));
    }
}

fn xml_diagnostic(
    error: &XmlError,
    file_id: usize,
    files: &SimpleFiles<String, String>,
) -> Diagnostic<usize> {
    let labels = error
        .line()
        .and_then(|line| files.line_range(file_id, line.saturating_sub(1)).ok())
        .map(|range| vec![Label::primary(file_id, range)])
        .unwrap_or_default();
    Diagnostic::error()
        .with_message(error.to_string())
        .with_labels(labels)
}
