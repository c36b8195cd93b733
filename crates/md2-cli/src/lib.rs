use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use md2_core::{compose, mirror_tree, CmarkRenderer, MirrorOptions, PageFrame};

const EXAMPLE: &str = include_str!("example.md");

#[derive(Parser)]
#[command(
    name = "md2",
    version,
    about = "Convert Markdown to HTML, one file or a whole directory tree"
)]
pub struct Cli {
    /// Header fragment prepended verbatim to every converted document
    #[arg(long = "head", value_name = "PATH")]
    head: Option<PathBuf>,

    /// Footer fragment appended verbatim to every converted document
    #[arg(long = "foot", value_name = "PATH")]
    foot: Option<PathBuf>,

    /// Output file, or output directory in recursive mode
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Mirror a directory recursively, converting Markdown files and
    /// copying everything else as-is
    #[arg(short = 'r', long = "recursive")]
    recursive: bool,

    /// Suppress the recursive-mode summary line
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Print a Markdown tour of the supported syntax and exit
    #[arg(long = "example")]
    example: bool,

    /// Markdown file or directory to convert (stdin when omitted)
    #[arg(value_name = "FILE|DIRECTORY")]
    input: Option<PathBuf>,
}

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.example {
        print!("{EXAMPLE}");
        return Ok(0);
    }

    let renderer = CmarkRenderer::new();

    let Some(input) = cli.input else {
        let frame = PageFrame::load(cli.head.as_deref(), cli.foot.as_deref())?;
        let output = compose(&frame, io::stdin().lock(), &renderer)
            .map_err(|err| err.at("<stdin>"))?;
        return emit(&output, cli.output.as_deref());
    };

    let meta = fs::metadata(&input)
        .with_context(|| format!("cannot read input {}", input.display()))?;

    if meta.is_dir() {
        if !cli.recursive {
            bail!("--recursive must be given when the input is a directory");
        }
        let Some(dest) = cli.output else {
            bail!("--output must be given when the input is a directory");
        };

        let options = MirrorOptions {
            source: input,
            dest,
            header: cli.head,
            footer: cli.foot,
        };
        let outcome = mirror_tree(&options, &renderer)?;
        if !cli.quiet {
            println!(
                "converted {}, copied {} -> {}",
                outcome.converted,
                outcome.copied,
                options.dest.display()
            );
        }
        return Ok(0);
    }

    let frame = PageFrame::load(cli.head.as_deref(), cli.foot.as_deref())?;
    let body = File::open(&input).with_context(|| format!("cannot open {}", input.display()))?;
    let output = compose(&frame, body, &renderer).map_err(|err| err.at(&input))?;
    emit(&output, cli.output.as_deref())
}

/// Write the composed document to the output file (synced before close,
/// like tree-mode destinations) or to stdout. A closed stdout pipe is not
/// an error; downstream consumers like `head` hang up early.
fn emit(output: &[u8], dest: Option<&Path>) -> Result<i32> {
    match dest {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            file.write_all(output)
                .with_context(|| format!("cannot write {}", path.display()))?;
            file.sync_all()
                .with_context(|| format!("cannot sync {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            match handle.write_all(output) {
                Ok(()) => {}
                Err(err) if should_ignore_pipe_error(&err) => return Ok(0),
                Err(err) => return Err(err).context("failed to write to stdout"),
            }
            match handle.flush() {
                Ok(()) => {}
                Err(err) if should_ignore_pipe_error(&err) => return Ok(0),
                Err(err) => return Err(err).context("failed to flush stdout"),
            }
        }
    }
    Ok(0)
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
