//! Directory capability backed by the local filesystem

use super::tree::{DirEntry, DirectoryHandle, FileHandle};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalDirectory {
    name: String,
    path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LocalFile {
    name: String,
    path: PathBuf,
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl LocalDirectory {
    /// Open `path` as a directory handle; fails if it is not a directory
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(Self {
            name: entry_name(&path),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_entries(&self) -> io::Result<Vec<DirEntry>> {
        let mut read_dir = tokio::fs::read_dir(&self.path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            // Links are not followed; one pointing at an ancestor would never end
            let file_type = entry.file_type().await?;
            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_dir() {
                entries.push(DirEntry::Directory(Box::new(LocalDirectory { name, path })));
            } else if file_type.is_file() {
                entries.push(DirEntry::File(Box::new(LocalFile { name, path })));
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> io::Result<String> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
