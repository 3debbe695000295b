//! vibe-ide library crate
//!
//! Core of a browser code-editor shell: folder ingestion into a sorted file
//! tree, AI explanations of the active file, and the Vibe agent that rewrites
//! it. Hosts drive everything through [`editor::EditorEvents`].

pub mod assistant;
pub mod config;
pub mod editor;
pub mod logging;
pub mod util;
pub mod workspace;
