use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{ConvertError, ConvertResult};
use crate::render::{RenderError, Renderer};

/// Composition failure before a document path is known. [`ComposeError::at`]
/// lifts it into the path-tagged [`ConvertError`] once the caller can say
/// which file was being produced.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ComposeError {
    pub fn at(self, path: impl Into<PathBuf>) -> ConvertError {
        match self {
            ComposeError::Io(source) => ConvertError::Io {
                path: path.into(),
                source,
            },
            ComposeError::Render(source) => ConvertError::Render {
                path: path.into(),
                source,
            },
        }
    }
}

/// Header and footer fragments loaded once per operation and reused,
/// read-only, for every document composed during it.
#[derive(Debug, Default, Clone)]
pub struct PageFrame {
    header: Option<Vec<u8>>,
    footer: Option<Vec<u8>>,
}

impl PageFrame {
    /// Read the configured fragments fully into memory. A missing or
    /// unreadable fragment fails the whole operation up front, before any
    /// destination write happens.
    pub fn load(header: Option<&Path>, footer: Option<&Path>) -> ConvertResult<Self> {
        Ok(Self {
            header: read_fragment(header)?,
            footer: read_fragment(footer)?,
        })
    }

    pub fn header(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    pub fn footer(&self) -> Option<&[u8]> {
        self.footer.as_deref()
    }
}

fn read_fragment(path: Option<&Path>) -> ConvertResult<Option<Vec<u8>>> {
    match path {
        Some(path) => fs::read(path).map(Some).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(None),
    }
}

/// Produce one output document: header bytes verbatim, then the rendered
/// body, then footer bytes verbatim. Byte-exact concatenation, no added
/// separators. The body is read fully into memory; Markdown sources are
/// bounded in size. A render failure aborts the document and no partial
/// output escapes. Writing the result anywhere is the caller's job, so the
/// same composer serves the single-file and tree-mirroring paths.
pub fn compose<R: Read>(
    frame: &PageFrame,
    mut body: R,
    renderer: &dyn Renderer,
) -> Result<Vec<u8>, ComposeError> {
    let mut source = Vec::new();
    body.read_to_end(&mut source)?;

    let rendered = renderer.render(&source)?;

    let mut output = Vec::new();
    if let Some(header) = frame.header() {
        output.extend_from_slice(header);
    }
    output.extend_from_slice(&rendered);
    if let Some(footer) = frame.footer() {
        output.extend_from_slice(footer);
    }
    Ok(output)
}
