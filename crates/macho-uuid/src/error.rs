//! Error types for locating and resolving symbol files.

use std::path::PathBuf;

use macho_uuid_formats::ParseError;
use thiserror::Error;

/// Error type for locating and resolving symbol files.
#[derive(Error, Debug)]
pub enum Error {
    /// No path was supplied.
    #[error("Missing path to Mach-O file or Universal binary")]
    MissingPath,

    /// The path does not exist.
    #[error("File does not exist at {}", .0.display())]
    NotFound(PathBuf),

    /// The path's extension is not a recognized bundle or binary extension.
    #[error("Invalid file extension at {}", .0.display())]
    InvalidExtension(PathBuf),

    /// Recursive directory enumeration failed.
    #[error("could not enumerate {}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A candidate file could not be decoded.
    #[error("could not read {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// I/O error.
    #[error("I/O error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new `Parse` error.
    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `Io` error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
