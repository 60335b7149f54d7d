//! Directory tree crawling
//!
//! Treats a filesystem subtree as the crawl target: walks it with a depth
//! cap, exclusion patterns and an extension allowlist, then derives the
//! summary counts that get persisted on the session.

use crate::config::DirectoryTreeConfig;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// One node of the walked tree
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryTreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryTreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

/// Summary derived from a walked tree
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryTreeAnalysis {
    pub depth: u32,
    pub file_count: usize,
    pub folder_count: usize,
    pub file_types: Vec<String>,
}

/// Walks a directory tree from the given root
pub fn walk_directory_tree(
    root: &Path,
    config: &DirectoryTreeConfig,
) -> std::io::Result<DirectoryTreeNode> {
    walk(root, 0, config)
}

fn walk(dir: &Path, depth: u32, config: &DirectoryTreeConfig) -> std::io::Result<DirectoryTreeNode> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned());

    let mut node = DirectoryTreeNode {
        name,
        kind: NodeKind::Directory,
        children: Vec::new(),
    };

    if depth >= config.max_depth {
        return Ok(node);
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        if is_excluded(&entry_name, &config.exclude_patterns) {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            match walk(&entry.path(), depth + 1, config) {
                Ok(child) => node.children.push(child),
                Err(e) => tracing::warn!("Skipping directory {}: {}", entry.path().display(), e),
            }
        } else if file_type.is_file() && is_allowed_file(&entry_name, &config.allowed_extensions) {
            node.children.push(DirectoryTreeNode {
                name: entry_name,
                kind: NodeKind::File,
                children: Vec::new(),
            });
        }
    }

    Ok(node)
}

fn is_excluded(name: &str, patterns: &[String]) -> bool {
    let lowered = name.to_lowercase();
    patterns
        .iter()
        .any(|pattern| lowered.contains(&pattern.to_lowercase()))
}

fn is_allowed_file(name: &str, extensions: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Derives the summary counts from a walked tree
pub fn analyze_tree(tree: &DirectoryTreeNode) -> DirectoryTreeAnalysis {
    let mut analysis = DirectoryTreeAnalysis {
        depth: 0,
        file_count: 0,
        folder_count: 0,
        file_types: Vec::new(),
    };
    let mut types = BTreeSet::new();
    visit(tree, 0, &mut analysis, &mut types);
    analysis.file_types = types.into_iter().collect();
    analysis
}

fn visit(
    node: &DirectoryTreeNode,
    depth: u32,
    analysis: &mut DirectoryTreeAnalysis,
    types: &mut BTreeSet<String>,
) {
    analysis.depth = analysis.depth.max(depth);
    match node.kind {
        NodeKind::Directory => {
            analysis.folder_count += 1;
            for child in &node.children {
                visit(child, depth + 1, analysis, types);
            }
        }
        NodeKind::File => {
            analysis.file_count += 1;
            if let Some((_, ext)) = node.name.rsplit_once('.') {
                types.insert(ext.to_lowercase());
            }
        }
    }
}
