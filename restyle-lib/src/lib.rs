//! Record the CSS a user adds to a live page and package it as an installable add-on.
//!
//! A [`RecordingSession`] snapshots every style rule of a [`StyledDocument`] when it starts
//! and again when it stops; the rules that appeared in between, minus any `url(` references,
//! become a [`Modification`]. A [`PackageBuilder`] then rewrites a copy of a template archive
//! with the collected [`ModificationSet`] and the user's [`ProjectMetadata`].

pub mod document;
pub mod dom;
pub mod error;
pub mod modification;
pub mod package;
pub mod parser;
pub mod style;

pub use document::{HtmlPage, InlineDocument, SiteInfo, StyledDocument};
pub use error::{
    ArchiveError, BuildStep, ModificationError, PackageError, SessionError, SheetError,
};
pub use modification::{Modification, ModificationSet};
pub use package::{BuildOutcome, PackageBuilder, ProjectMetadata, SavePrompt, TemplateLayout};
pub use style::{RecordingSession, StyleRecorder, StyleSnapshot};
