//! Workspace session: the opened folder, its tree, and the active file
//!
//! A folder open is an atomic swap. The tree and content map are built off
//! to the side and only installed once the whole traversal succeeded.

mod local;
mod memory;
mod tree;

pub use local::{LocalDirectory, LocalFile};
pub use memory::{MemoryDirectory, MemoryFile};
pub use tree::{build_tree, DirEntry, DirectoryHandle, FileHandle, TreeError};

use crate::util::compare_names;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// File name to full text content, filled by the same traversal as the tree
pub type ContentMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileSystemNode>,
    /// Only meaningful for folders
    #[serde(default, rename = "isOpen")]
    pub expanded: bool,
}

impl FileSystemNode {
    pub fn folder(path: &str, name: &str, children: Vec<FileSystemNode>) -> Self {
        Self {
            id: format!("folder:{}", path),
            name: name.to_string(),
            kind: NodeKind::Folder,
            children,
            expanded: false,
        }
    }

    pub fn file(path: &str, name: &str) -> Self {
        Self {
            id: format!("file:{}", path),
            name: name.to_string(),
            kind: NodeKind::File,
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Path relative to the opened folder, recovered from the id
    pub fn path(&self) -> &str {
        self.id
            .split_once(':')
            .map(|(_, path)| path)
            .unwrap_or(&self.id)
    }

    fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Folder => self.children.iter().map(Self::file_count).sum(),
        }
    }
}

/// Folders before files, then by name
pub(crate) fn compare_nodes(a: &FileSystemNode, b: &FileSystemNode) -> Ordering {
    match (a.kind, b.kind) {
        (NodeKind::Folder, NodeKind::File) => Ordering::Less,
        (NodeKind::File, NodeKind::Folder) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    }
}

fn find_node_mut<'a>(nodes: &'a mut [FileSystemNode], id: &str) -> Option<&'a mut FileSystemNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if node.is_folder() {
            if let Some(found) = find_node_mut(&mut node.children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// The result of one complete traversal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSnapshot {
    pub children: Vec<FileSystemNode>,
    pub file_contents: ContentMap,
}

impl FolderSnapshot {
    /// Number of file nodes in the tree (duplicate names counted separately)
    pub fn file_count(&self) -> usize {
        self.children.iter().map(FileSystemNode::file_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { files: usize },
    /// The picker was dismissed; nothing changed
    Cancelled,
}

#[derive(Debug, Default)]
pub struct Workspace {
    folder_name: Option<String>,
    tree: Vec<FileSystemNode>,
    contents: ContentMap,
    active: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the folder the picker returned.
    ///
    /// `None` means the user dismissed the picker. On a traversal error the
    /// previous folder stays in place.
    pub async fn open_folder(
        &mut self,
        picked: Option<&dyn DirectoryHandle>,
    ) -> Result<OpenOutcome, TreeError> {
        let Some(root) = picked else {
            debug!("folder picker dismissed");
            return Ok(OpenOutcome::Cancelled);
        };

        let snapshot = build_tree(root).await?;
        let files = snapshot.file_count();
        self.install(root.name(), snapshot);
        Ok(OpenOutcome::Opened { files })
    }

    /// Replace the session with an already-built snapshot
    pub fn install(&mut self, folder_name: &str, snapshot: FolderSnapshot) {
        self.folder_name = Some(folder_name.to_string());
        self.tree = snapshot.children;
        self.contents = snapshot.file_contents;
        self.active = None;
        info!(folder = folder_name, "workspace replaced");
    }

    /// Open a single file outside of any folder traversal and make it active
    pub fn open_file(&mut self, name: &str, content: String) -> ActiveFile {
        self.contents.insert(name.to_string(), content.clone());
        self.active = Some(name.to_string());
        ActiveFile {
            name: name.to_string(),
            content,
        }
    }

    pub fn select_file(&mut self, name: &str) -> Option<ActiveFile> {
        let content = self.contents.get(name)?.clone();
        self.active = Some(name.to_string());
        Some(ActiveFile {
            name: name.to_string(),
            content,
        })
    }

    /// Flip a folder open/closed; false if no folder has that id
    pub fn toggle_folder(&mut self, id: &str) -> bool {
        match find_node_mut(&mut self.tree, id) {
            Some(node) if node.is_folder() => {
                node.expanded = !node.expanded;
                true
            }
            _ => false,
        }
    }

    pub fn active_file(&self) -> Option<ActiveFile> {
        let name = self.active.as_ref()?;
        let content = self.contents.get(name)?;
        Some(ActiveFile {
            name: name.clone(),
            content: content.clone(),
        })
    }

    /// Overwrite the active file's content (editor typing or an agent commit)
    pub fn update_active_content(&mut self, content: String) -> bool {
        let Some(name) = self.active.as_ref() else {
            return false;
        };
        self.contents.insert(name.clone(), content);
        true
    }

    pub fn folder_name(&self) -> Option<&str> {
        self.folder_name.as_deref()
    }

    pub fn tree(&self) -> &[FileSystemNode] {
        &self.tree
    }

    pub fn contents(&self) -> &ContentMap {
        &self.contents
    }
}
