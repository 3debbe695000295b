//! Directory ingestion
//!
//! Walks a directory capability depth-first and produces the explorer tree
//! plus the flat name-keyed content map in a single pass.

use super::{compare_nodes, ContentMap, FileSystemNode, FolderSnapshot};
use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use std::io;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A directory the user granted access to.
///
/// Enumeration order is whatever the backing store returns; the builder
/// never relies on it.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// List the immediate entries of this directory
    async fn list_entries(&self) -> io::Result<Vec<DirEntry>>;
}

#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn read_text(&self) -> io::Result<String>;
}

/// One immediate child of a directory, tagged file-or-directory
pub enum DirEntry {
    Directory(Box<dyn DirectoryHandle>),
    File(Box<dyn FileHandle>),
}

impl DirEntry {
    pub fn name(&self) -> &str {
        match self {
            DirEntry::Directory(dir) => dir.name(),
            DirEntry::File(file) => file.name(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, DirEntry::Directory(_))
    }
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to list directory '{path}': {source}")]
    Enumerate {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// A built node plus the file contents found beneath it, in tree order
struct Branch {
    node: FileSystemNode,
    contents: Vec<(String, String)>,
}

/// Build the tree and content map for `root`.
///
/// Unreadable files degrade to empty content. A directory that cannot be
/// listed fails the whole build, so callers never see a partial tree.
pub async fn build_tree(root: &dyn DirectoryHandle) -> Result<FolderSnapshot, TreeError> {
    debug!(root = root.name(), "reading folder");
    let branches = read_level(root, String::new()).await?;

    let mut children = Vec::with_capacity(branches.len());
    let mut file_contents = ContentMap::new();
    for branch in branches {
        // Same-named files in different folders collapse onto one key;
        // the last one in sorted depth-first order wins.
        file_contents.extend(branch.contents);
        children.push(branch.node);
    }

    let snapshot = FolderSnapshot {
        children,
        file_contents,
    };
    info!(
        root = root.name(),
        files = snapshot.file_count(),
        "folder loaded"
    );
    Ok(snapshot)
}

fn read_level<'a>(
    dir: &'a dyn DirectoryHandle,
    dir_path: String,
) -> BoxFuture<'a, Result<Vec<Branch>, TreeError>> {
    async move {
        let entries = dir.list_entries().await.map_err(|source| TreeError::Enumerate {
            path: if dir_path.is_empty() {
                dir.name().to_string()
            } else {
                dir_path.clone()
            },
            source,
        })?;

        // Siblings are read concurrently; the sort below makes the result
        // independent of completion order.
        let mut branches = try_join_all(
            entries
                .into_iter()
                .map(|entry| read_entry(entry, &dir_path)),
        )
        .await?;

        branches.sort_by(|a, b| compare_nodes(&a.node, &b.node));
        Ok(branches)
    }
    .boxed()
}

async fn read_entry(entry: DirEntry, parent_path: &str) -> Result<Branch, TreeError> {
    let entry_path = if parent_path.is_empty() {
        entry.name().to_string()
    } else {
        format!("{}/{}", parent_path, entry.name())
    };

    match entry {
        DirEntry::Directory(dir) => {
            let branches = read_level(dir.as_ref(), entry_path.clone()).await?;
            let mut children = Vec::with_capacity(branches.len());
            let mut contents = Vec::new();
            for branch in branches {
                contents.extend(branch.contents);
                children.push(branch.node);
            }
            Ok(Branch {
                node: FileSystemNode::folder(&entry_path, dir.name(), children),
                contents,
            })
        }
        DirEntry::File(file) => {
            let text = match file.read_text().await {
                Ok(text) => text,
                Err(err) => {
                    warn!(file = %entry_path, error = %err, "unreadable file, using empty content");
                    String::new()
                }
            };
            Ok(Branch {
                node: FileSystemNode::file(&entry_path, file.name()),
                contents: vec![(file.name().to_string(), text)],
            })
        }
    }
}
