use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Misuse of the start/stop recording state machine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("a recording session is already active")]
    AlreadyRecording,
    #[error("no recording session is active")]
    NotRecording,
}

/// Rejected edits to a modification list.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModificationError {
    /// At least one modification must remain for export to stay possible.
    #[error("cannot remove the last remaining modification")]
    LastModification,
    #[error("no modification at index {index} (list has {len})")]
    OutOfRange { index: usize, len: usize },
}

/// A stylesheet attached to a document that could not be enumerated.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("stylesheet '{0}' is cross-origin")]
    CrossOrigin(String),
    #[error("cannot read stylesheet '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stylesheet href '{0}' is not a valid URL")]
    BadHref(String),
    #[error("stylesheet is unavailable")]
    Unavailable,
}

/// Failures of the archive codec.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("entry '{0}' not found")]
    MissingEntry(String),
    #[error("entry '{0}' is not valid UTF-8")]
    NotUtf8(String),
}

/// The step of a package build that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    CreateScratch,
    CopyTemplate,
    OpenArchive,
    ReadEntry,
    ReplaceEntry,
    CloseArchive,
    MoveToDestination,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            BuildStep::CreateScratch => "create scratch directory",
            BuildStep::CopyTemplate => "copy template archive",
            BuildStep::OpenArchive => "open working archive",
            BuildStep::ReadEntry => "read entry",
            BuildStep::ReplaceEntry => "replace entry",
            BuildStep::CloseArchive => "write working archive",
            BuildStep::MoveToDestination => "move package to destination",
        };
        f.write_str(step)
    }
}

/// All errors produced while building a package. None of them are retried.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("template archive '{}' is missing or unreadable: {source}", .path.display())]
    TemplateMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A placeholder token did not occur exactly once in its template entry.
    #[error("template entry '{entry}' contains placeholder {placeholder:?} {found} time(s), expected exactly once")]
    Placeholder {
        entry: String,
        placeholder: String,
        found: usize,
    },

    #[error("failed to {step} '{}': {source}", .path.display())]
    Io {
        step: BuildStep,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to {step}{}: {source}", .entry.as_deref().map(|e| format!(" '{e}'")).unwrap_or_default())]
    Archive {
        step: BuildStep,
        entry: Option<String>,
        #[source]
        source: ArchiveError,
    },

    #[error("page URL '{url}' is invalid: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Domain scope was requested for a page whose origin is opaque, such as a `file:` URL.
    #[error("page URL '{url}' has no origin to scope the package to, use page scope instead")]
    OpaqueOrigin { url: String },

    #[error("there are no modifications to export")]
    EmptyModificationSet,
}

impl PackageError {
    /// True for errors caused by a broken template rather than by the environment.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            PackageError::TemplateMissing { .. }
                | PackageError::Placeholder { .. }
                | PackageError::Archive {
                    source: ArchiveError::MissingEntry(_) | ArchiveError::NotUtf8(_),
                    ..
                }
        )
    }
}
