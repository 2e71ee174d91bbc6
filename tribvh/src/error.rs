use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("couldn't access {}", .path.display())]
    Io {
        path: PathBuf,

        #[source]
        source: io::Error,
    },

    #[error("couldn't load mesh from {}", .path.display())]
    Mesh {
        path: PathBuf,

        #[source]
        source: tobj::LoadError,
    },

    #[error("tree at {} doesn't match its mesh: {reason}", .path.display())]
    Mismatch { path: PathBuf, reason: String },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(
        "line {line}: triangle {index} is out of range \
         (mesh has {triangle_count} triangles)"
    )]
    IndexOutOfRange {
        line: usize,
        index: u32,
        triangle_count: usize,
    },
}

impl Error {
    /// Wraps an I/O error that happened while accessing `path`.
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_owned();

        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io() {
        let err = Error::io(
            "foo.bvh",
            io::Error::new(io::ErrorKind::NotFound, "nope"),
        );

        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!("file not found: foo.bvh", err.to_string());

        let err = Error::io(
            "foo.bvh",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!("couldn't access foo.bvh", err.to_string());
    }

    #[test]
    fn display() {
        assert_eq!(
            "line 3: unknown node 7",
            Error::parse(3, "unknown node 7").to_string()
        );

        assert_eq!(
            "line 2: triangle 10 is out of range (mesh has 3 triangles)",
            Error::IndexOutOfRange {
                line: 2,
                index: 10,
                triangle_count: 3,
            }
            .to_string()
        );
    }
}
