//! sourcepack CLI - pack a source tree into a single document.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use owo_colors::OwoColorize;
use sourcepack::builder::Pack;
use sourcepack::errors::{exit_code, PackError};
use sourcepack::output::{write_output, OutputFormat, OutputTarget};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "sourcepack")]
#[command(about = "Pack a source tree into a single document: file tree, outlines and contents")]
#[command(version)]
struct Cli {
    /// Root directory to pack
    #[arg(default_value = ".", env = "SOURCEPACK_DIR")]
    dir: PathBuf,

    /// Output file [default: sourcepack.txt or sourcepack.json]
    #[arg(short, long, env = "SOURCEPACK_OUTPUT", conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Write the document to stdout instead of a file
    #[arg(long, env = "SOURCEPACK_STDOUT")]
    stdout: bool,

    /// Filter patterns, gitignore syntax; the last matching pattern wins
    #[arg(
        short = 'f',
        long = "filter",
        value_delimiter = ',',
        default_value = "*,!.*",
        env = "SOURCEPACK_FILTER"
    )]
    filters: Vec<String>,

    /// Ignore file whose patterns exclude paths (repeatable)
    #[arg(long = "ignore-file", value_delimiter = ',', env = "SOURCEPACK_IGNORE_FILE")]
    ignore_files: Vec<PathBuf>,

    /// Use DIR/.gitignore as an ignore file when present
    #[arg(long, env = "SOURCEPACK_GITIGNORE")]
    gitignore: bool,

    /// Leave out the file tree
    #[arg(long, env = "SOURCEPACK_NO_TREE")]
    no_tree: bool,

    /// Leave out file contents
    #[arg(long, env = "SOURCEPACK_NO_DUMP")]
    no_dump: bool,

    /// Include language outlines (Go)
    #[arg(long, env = "SOURCEPACK_OUTLINE")]
    outline: bool,

    /// Show file sizes in the tree
    #[arg(long, env = "SOURCEPACK_SIZES")]
    sizes: bool,

    /// Dump binary files instead of a placeholder
    #[arg(long, env = "SOURCEPACK_INCLUDE_BINARY")]
    include_binary: bool,

    /// Document format
    #[arg(long, value_enum, default_value_t = FormatArg::Text, env = "SOURCEPACK_FORMAT")]
    format: FormatArg,

    /// Maximum directory depth
    #[arg(long, env = "SOURCEPACK_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Disable coloured messages
    #[arg(long, env = "SOURCEPACK_NO_COLOR")]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let no_color = cli.no_color;

    match run(cli) {
        Ok(Some(path)) => {
            let message = format!("Successfully generated output to: {}", path.display());
            if !no_color && io::stdout().is_terminal() {
                println!("{}", message.green());
            } else {
                println!("{message}");
            }
        }
        Ok(None) => {}
        Err(e) => {
            if !no_color && io::stderr().is_terminal() {
                eprintln!("{} {e}", "error:".red().bold());
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(exit_code(&e));
        }
    }
}

fn init_tracing(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Build and write the document. Returns the file written, if any.
fn run(cli: Cli) -> Result<Option<PathBuf>, PackError> {
    let format = OutputFormat::from(cli.format);

    let mut pack = Pack::new(&cli.dir)
        .filters(cli.filters)
        .gitignore(cli.gitignore)
        .tree(!cli.no_tree)
        .dump(!cli.no_dump)
        .outline(cli.outline)
        .sizes(cli.sizes)
        .include_binary(cli.include_binary)
        .format(format);
    for path in cli.ignore_files {
        pack = pack.ignore_file(path);
    }
    if let Some(depth) = cli.max_depth {
        pack = pack.max_depth(depth);
    }
    debug!(?pack, "configured");

    let document = pack.build()?;

    let target = if cli.stdout {
        OutputTarget::Stdout
    } else {
        let path = cli
            .output
            .unwrap_or_else(|| PathBuf::from(format!("sourcepack.{}", format.extension())));
        OutputTarget::File(path)
    };
    write_output(&target, &document)?;

    match target {
        OutputTarget::File(path) => Ok(Some(path)),
        OutputTarget::Stdout => Ok(None),
    }
}
