use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::TempDir;

use crate::error::{ArchiveError, BuildStep, PackageError};
use crate::modification::ModificationSet;
use crate::package::archive::{ArchiveCodec, ZipCodec};
use crate::package::metadata::ProjectMetadata;
use crate::package::template::TemplateLayout;

/// Asks the user where the finished package should go. `None` means they cancelled.
pub trait SavePrompt {
    fn prompt_save_location(&mut self, suggested_file_name: &str) -> Option<PathBuf>;
}

impl<F> SavePrompt for F
where
    F: FnMut(&str) -> Option<PathBuf>,
{
    fn prompt_save_location(&mut self, suggested_file_name: &str) -> Option<PathBuf> {
        self(suggested_file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Saved(PathBuf),
    /// The user dismissed the save prompt. Nothing was written.
    UserCancelled,
}

/// Produces a package by rewriting a private copy of a template archive.
#[derive(Debug, Clone)]
pub struct PackageBuilder<C = ZipCodec> {
    template: PathBuf,
    layout: TemplateLayout,
    codec: C,
    scratch_dir: Option<PathBuf>,
}

impl PackageBuilder<ZipCodec> {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        PackageBuilder {
            template: template.into(),
            layout: TemplateLayout::default(),
            codec: ZipCodec,
            scratch_dir: None,
        }
    }
}

impl<C: ArchiveCodec> PackageBuilder<C> {
    pub fn with_layout(mut self, layout: TemplateLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_codec<D: ArchiveCodec>(self, codec: D) -> PackageBuilder<D> {
        PackageBuilder {
            template: self.template,
            layout: self.layout,
            codec,
            scratch_dir: self.scratch_dir,
        }
    }

    /// Directory the working copy is created in. Defaults to the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    /// Builds the package and moves it wherever `prompt` says.
    ///
    /// The template itself is never written to. The working copy is removed on every
    /// path out of this function, including cancellation and errors.
    pub fn build(
        &self,
        metadata: &ProjectMetadata,
        mods: &ModificationSet,
        prompt: &mut dyn SavePrompt,
    ) -> Result<BuildOutcome, PackageError> {
        if !mods.can_export() {
            return Err(PackageError::EmptyModificationSet);
        }
        let scope = metadata.target_scope()?;
        let stylesheet = mods.aggregated_css();

        self.check_template()?;

        let scratch = self.scratch()?;
        let working = scratch.path().join(
            self.template
                .file_name()
                .unwrap_or_else(|| OsStr::new("package.xpi")),
        );
        fs::copy(&self.template, &working).map_err(|source| PackageError::Io {
            step: BuildStep::CopyTemplate,
            path: working.clone(),
            source,
        })?;
        debug!("working copy of {} at {}", self.template.display(), working.display());

        self.rewrite(&working, metadata, &scope, &stylesheet)?;

        let suggested = format!("{}.xpi", metadata.name);
        let Some(destination) = prompt.prompt_save_location(&suggested) else {
            info!("export of '{}' cancelled", metadata.name);
            return Ok(BuildOutcome::UserCancelled);
        };

        move_file(&working, &destination).map_err(|source| PackageError::Io {
            step: BuildStep::MoveToDestination,
            path: destination.clone(),
            source,
        })?;
        info!(
            "exported '{}' ({} modification(s), scope {scope}) to {}",
            metadata.name,
            mods.len(),
            destination.display()
        );
        Ok(BuildOutcome::Saved(destination))
    }

    // The template must be a regular file this process can open.
    fn check_template(&self) -> Result<(), PackageError> {
        let missing = |source: io::Error| PackageError::TemplateMissing {
            path: self.template.clone(),
            source,
        };
        if !fs::metadata(&self.template).map_err(missing)?.is_file() {
            return Err(missing(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        File::open(&self.template).map_err(missing)?;
        Ok(())
    }

    fn scratch(&self) -> Result<TempDir, PackageError> {
        let created = match &self.scratch_dir {
            Some(dir) => TempDir::new_in(dir),
            None => TempDir::new(),
        };
        created.map_err(|source| PackageError::Io {
            step: BuildStep::CreateScratch,
            path: self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir),
            source,
        })
    }

    fn rewrite(
        &self,
        working: &Path,
        metadata: &ProjectMetadata,
        scope: &str,
        stylesheet: &str,
    ) -> Result<(), PackageError> {
        let layout = &self.layout;
        let mut handle = self
            .codec
            .open(working)
            .map_err(archive_error(BuildStep::OpenArchive, None))?;

        let manifest = self
            .codec
            .read_entry(&mut handle, &layout.manifest_entry)
            .map_err(archive_error(BuildStep::ReadEntry, Some(layout.manifest_entry.as_str())))?;
        let script = self
            .codec
            .read_entry(&mut handle, &layout.script_entry)
            .map_err(archive_error(BuildStep::ReadEntry, Some(layout.script_entry.as_str())))?;

        let manifest = layout.rewrite_manifest(
            &manifest,
            &metadata.name,
            &metadata.description,
            &metadata.author,
        )?;
        let script = layout.rewrite_script(&script, scope)?;

        for (entry, contents) in [
            (layout.manifest_entry.as_str(), manifest.as_str()),
            (layout.script_entry.as_str(), script.as_str()),
            (layout.stylesheet_entry.as_str(), stylesheet),
        ] {
            self.codec
                .replace_entry(&mut handle, entry, contents.as_bytes())
                .map_err(archive_error(BuildStep::ReplaceEntry, Some(entry)))?;
        }

        self.codec
            .close(handle)
            .map_err(archive_error(BuildStep::CloseArchive, None))
    }
}

fn archive_error(
    step: BuildStep,
    entry: Option<&str>,
) -> impl FnOnce(ArchiveError) -> PackageError {
    let entry = entry.map(str::to_string);
    move |source| PackageError::Archive {
        step,
        entry,
        source,
    }
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Different filesystem: copy, the scratch directory cleans up the original.
    fs::copy(from, to).map(|_| ())
}
