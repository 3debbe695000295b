//! In-memory directory capability
//!
//! Lets hosts and tests feed the tree builder without touching a real
//! filesystem. Read and listing failures can be injected per entry.

use super::tree::{DirEntry, DirectoryHandle, FileHandle};
use async_trait::async_trait;
use std::io;

#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    name: String,
    entries: Vec<MemoryEntry>,
    deny_listing: bool,
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Directory(MemoryDirectory),
    File(MemoryFile),
}

#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    /// `None` makes every read fail
    content: Option<String>,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            deny_listing: false,
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.entries.push(MemoryEntry::File(MemoryFile {
            name: name.into(),
            content: Some(content.into()),
        }));
        self
    }

    pub fn with_unreadable_file(mut self, name: impl Into<String>) -> Self {
        self.entries.push(MemoryEntry::File(MemoryFile {
            name: name.into(),
            content: None,
        }));
        self
    }

    pub fn with_dir(mut self, dir: MemoryDirectory) -> Self {
        self.entries.push(MemoryEntry::Directory(dir));
        self
    }

    /// Make listing this directory fail with `PermissionDenied`
    pub fn deny_listing(mut self) -> Self {
        self.deny_listing = true;
        self
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_entries(&self) -> io::Result<Vec<DirEntry>> {
        if self.deny_listing {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("listing '{}' is not permitted", self.name),
            ));
        }

        Ok(self
            .entries
            .iter()
            .map(|entry| match entry {
                MemoryEntry::Directory(dir) => DirEntry::Directory(Box::new(dir.clone())),
                MemoryEntry::File(file) => DirEntry::File(Box::new(file.clone())),
            })
            .collect())
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> io::Result<String> {
        self.content.clone().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("'{}' could not be read", self.name),
            )
        })
    }
}
