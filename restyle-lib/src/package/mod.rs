//! Turning recorded modifications into an installable package.

pub mod archive;
pub mod builder;
pub mod metadata;
pub mod template;

pub use archive::{ArchiveCodec, ZipCodec};
pub use builder::{BuildOutcome, PackageBuilder, SavePrompt};
pub use metadata::ProjectMetadata;
pub use template::TemplateLayout;
