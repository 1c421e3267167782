use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ArchiveError;

/// Open, read, replace and commit entries of a container by path.
///
/// Replacements are only written by [`ArchiveCodec::close`]; dropping a handle without
/// closing it discards them.
pub trait ArchiveCodec {
    type Handle;

    fn open(&self, path: &Path) -> Result<Self::Handle, ArchiveError>;

    fn read_entry(&self, handle: &mut Self::Handle, entry: &str) -> Result<String, ArchiveError>;

    fn replace_entry(
        &self,
        handle: &mut Self::Handle,
        entry: &str,
        contents: &[u8],
    ) -> Result<(), ArchiveError>;

    fn close(&self, handle: Self::Handle) -> Result<(), ArchiveError>;
}

/// Zip implementation of [`ArchiveCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec;

pub struct ZipHandle {
    path: PathBuf,
    archive: ZipArchive<File>,
    replacements: Vec<(String, Vec<u8>)>,
}

impl ArchiveCodec for ZipCodec {
    type Handle = ZipHandle;

    fn open(&self, path: &Path) -> Result<ZipHandle, ArchiveError> {
        let archive = ZipArchive::new(File::open(path)?)?;
        Ok(ZipHandle {
            path: path.to_path_buf(),
            archive,
            replacements: Vec::new(),
        })
    }

    fn read_entry(&self, handle: &mut ZipHandle, entry: &str) -> Result<String, ArchiveError> {
        if let Some((_, contents)) = handle.replacements.iter().find(|(name, _)| name == entry) {
            return String::from_utf8(contents.clone())
                .map_err(|_| ArchiveError::NotUtf8(entry.to_string()));
        }

        let mut file = handle.archive.by_name(entry).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::MissingEntry(entry.to_string()),
            other => ArchiveError::Zip(other),
        })?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| ArchiveError::NotUtf8(entry.to_string()))
    }

    fn replace_entry(
        &self,
        handle: &mut ZipHandle,
        entry: &str,
        contents: &[u8],
    ) -> Result<(), ArchiveError> {
        handle.replacements.retain(|(name, _)| name != entry);
        handle
            .replacements
            .push((entry.to_string(), contents.to_vec()));
        Ok(())
    }

    /// Rewrites the archive in place: untouched entries are copied raw in their original
    /// order, replaced entries are removed and appended at the end.
    fn close(&self, handle: ZipHandle) -> Result<(), ArchiveError> {
        let ZipHandle {
            path,
            mut archive,
            replacements,
        } = handle;
        if replacements.is_empty() {
            return Ok(());
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut writer = ZipWriter::new(staged.as_file_mut());
            for index in 0..archive.len() {
                let file = archive.by_index_raw(index)?;
                if replacements.iter().any(|(name, _)| name == file.name()) {
                    continue;
                }
                writer.raw_copy_file(file)?;
            }

            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, contents) in &replacements {
                writer.start_file(name.as_str(), options)?;
                writer.write_all(contents)?;
            }
            writer.finish()?;
        }

        drop(archive);
        staged.persist(&path).map_err(|e| ArchiveError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_replace_moves_entry_to_end_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");
        write_zip(&path, &[("one.txt", "1"), ("two.txt", "2"), ("three.txt", "3")]);

        let codec = ZipCodec;
        let mut handle = codec.open(&path).unwrap();
        codec.replace_entry(&mut handle, "one.txt", b"uno").unwrap();
        codec.close(handle).unwrap();

        let mut names = entry_names(&path);
        assert_eq!(names.pop().as_deref(), Some("one.txt"));
        names.sort();
        assert_eq!(names, vec!["three.txt", "two.txt"]);

        let mut handle = codec.open(&path).unwrap();
        assert_eq!(codec.read_entry(&mut handle, "one.txt").unwrap(), "uno");
        assert_eq!(codec.read_entry(&mut handle, "two.txt").unwrap(), "2");
    }

    #[test]
    fn test_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");
        write_zip(&path, &[("one.txt", "1")]);

        let codec = ZipCodec;
        let mut handle = codec.open(&path).unwrap();

        assert!(matches!(
            codec.read_entry(&mut handle, "nope.txt"),
            Err(ArchiveError::MissingEntry(name)) if name == "nope.txt"
        ));
    }

    #[test]
    fn test_dropped_handle_discards_replacements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");
        write_zip(&path, &[("one.txt", "1")]);
        let before = std::fs::read(&path).unwrap();

        let codec = ZipCodec;
        let mut handle = codec.open(&path).unwrap();
        codec.replace_entry(&mut handle, "one.txt", b"x").unwrap();
        assert_eq!(codec.read_entry(&mut handle, "one.txt").unwrap(), "x");
        drop(handle);

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");
        std::fs::write(&path, "plain text").unwrap();

        assert!(matches!(ZipCodec.open(&path), Err(ArchiveError::Zip(_))));
    }
}
