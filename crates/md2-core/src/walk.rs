use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::compose::{compose, PageFrame};
use crate::error::{ConvertError, ConvertResult};
use crate::pathmap::{is_markdown, map_dest_path};
use crate::render::Renderer;

/// Everything one mirroring operation needs, fixed for its duration. Passed
/// explicitly instead of living in process-wide state so synthetic
/// configurations are trivial to test.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub header: Option<PathBuf>,
    pub footer: Option<PathBuf>,
}

/// Per-operation tally, consumed by the CLI summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorOutcome {
    pub directories: usize,
    pub converted: usize,
    pub copied: usize,
}

/// Mirror `source` into `dest`, depth-first in lexical order. Markdown
/// files are converted and framed; every other file is copied verbatim into
/// the recreated directory structure. Each entry is fully processed (read,
/// transform, write, sync) before the next is visited. The first error
/// aborts the whole traversal with the offending path attached, leaving any
/// partially populated destination tree in place.
pub fn mirror_tree(options: &MirrorOptions, renderer: &dyn Renderer) -> ConvertResult<MirrorOutcome> {
    let meta = fs::metadata(&options.source).map_err(|source| ConvertError::Io {
        path: options.source.clone(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ConvertError::Config(format!(
            "source {} is not a directory",
            options.source.display()
        )));
    }

    let frame = PageFrame::load(options.header.as_deref(), options.footer.as_deref())?;
    let mut outcome = MirrorOutcome::default();

    // Symlinks are not followed; entries are classified by whatever the
    // walk reports them as.
    for entry in WalkDir::new(&options.source).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(&options.source, err))?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            let dest = map_dest_path(&options.source, &options.dest, path, false)?;
            fs::create_dir_all(&dest).map_err(|source| ConvertError::Io {
                path: dest.clone(),
                source,
            })?;
            outcome.directories += 1;
        } else if is_template_source(path, options) {
            // Fragments are folded into every page; mirroring them as
            // standalone files would duplicate their content in the output.
        } else if is_markdown(path) {
            let dest = map_dest_path(&options.source, &options.dest, path, true)?;
            convert_into(path, &dest, &frame, renderer)?;
            outcome.converted += 1;
        } else {
            let dest = map_dest_path(&options.source, &options.dest, path, false)?;
            copy_into(path, &dest)?;
            outcome.copied += 1;
        }
    }

    Ok(outcome)
}

/// The configured path is compared as given, without canonicalization: a
/// header reached through a different spelling (relative vs. absolute,
/// symlink) is mirrored like any other file. This matches the documented
/// contract of the skip.
fn is_template_source(path: &Path, options: &MirrorOptions) -> bool {
    options.header.as_deref() == Some(path) || options.footer.as_deref() == Some(path)
}

/// Convert one Markdown source into its framed destination document. The
/// source is read and composed before the destination file is created, so a
/// render failure leaves nothing behind at the destination path.
fn convert_into(
    source: &Path,
    dest: &Path,
    frame: &PageFrame,
    renderer: &dyn Renderer,
) -> ConvertResult<()> {
    let body = File::open(source).map_err(|err| ConvertError::Io {
        path: source.to_path_buf(),
        source: err,
    })?;
    let output = compose(frame, body, renderer).map_err(|err| err.at(source))?;

    let mut file = File::create(dest).map_err(|source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    file.write_all(&output).map_err(|source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    sync(&file, dest)
}

fn copy_into(source: &Path, dest: &Path) -> ConvertResult<()> {
    let mut src = File::open(source).map_err(|err| ConvertError::Io {
        path: source.to_path_buf(),
        source: err,
    })?;
    let mut dst = File::create(dest).map_err(|source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    io::copy(&mut src, &mut dst).map_err(|source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    sync(&dst, dest)
}

// A destination reported as written must survive a crash, so every file is
// synced to durable storage before it is closed.
fn sync(file: &File, dest: &Path) -> ConvertResult<()> {
    file.sync_all().map_err(|source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    })
}

fn walk_error(root: &Path, err: walkdir::Error) -> ConvertError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(source) => ConvertError::Io { path, source },
        None => ConvertError::Io {
            path,
            source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
        },
    }
}
