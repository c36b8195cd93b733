use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{} is not under source root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to render {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        source: RenderError,
    },
}

pub type ConvertResult<T> = Result<T, ConvertError>;
