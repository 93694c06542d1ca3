use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use serde::Serialize;

/// Extensions whose file content is never loaded.
pub const SKIP_CONTENT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "ico", "mp4", "svg", "pdf", "doc", "db", "sqlite", "docx", "xls",
    "xlsx",
];

/// Directory names that are never walked.
pub const ALWAYS_IGNORED_DIRS: &[&str] = &[".git", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            children: Vec::new(),
        }
    }

    fn child_dir_mut(&mut self, name: &str) -> &mut FileNode {
        let index = match self
            .children
            .iter()
            .position(|child| child.name == name && !child.children.is_empty())
        {
            Some(index) => index,
            None => {
                self.children.push(FileNode::directory(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// Compiles caller-supplied ignore patterns once for the whole walk.
pub fn build_ignore_matcher(root: &Path, extra_ignores: &[String]) -> Result<Override> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in extra_ignores {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern.starts_with('#') {
            continue;
        }
        builder
            .add(&format!("!{pattern}"))
            .with_context(|| format!("invalid ignore pattern '{pattern}'"))?;
    }
    builder.build().context("failed to compile ignore patterns")
}

/// Walks `root` honoring `.gitignore` files, the always-ignored directories
/// and `extra_ignores`. Directories that end up empty are dropped, so a
/// codebase with no visible files yields `None`.
pub fn scan_codebase(root: &Path, extra_ignores: &[String]) -> Result<Option<FileNode>> {
    let matcher = build_ignore_matcher(root, extra_ignores)?;
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());
    let mut tree = FileNode::directory(root_name);

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .parents(false)
        .git_ignore(true)
        .git_exclude(false)
        .git_global(false)
        .require_git(false)
        .overrides(matcher)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !ALWAYS_IGNORED_DIRS.contains(&name.as_ref())
        })
        .build();

    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk '{}'", root.display()))?;
        let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
        if !is_file {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let content = read_file_content(entry.path());
        insert_file(&mut tree, &relative, content);
    }

    if tree.children.is_empty() {
        return Ok(None);
    }
    Ok(Some(tree))
}

fn insert_file(tree: &mut FileNode, relative: &Path, content: Option<String>) {
    let parts = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<String>>();
    let Some((file_name, dirs)) = parts.split_last() else {
        return;
    };

    let mut node = tree;
    for dir in dirs {
        node = node.child_dir_mut(dir);
    }
    node.children.push(FileNode {
        name: file_name.clone(),
        content,
        children: Vec::new(),
    });
}

fn read_file_content(path: &Path) -> Option<String> {
    if skips_content(path) {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "file content not loaded");
            None
        }
    }
}

pub fn skips_content(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| SKIP_CONTENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Root-relative paths of every file in the tree, in pre-order.
pub fn extract_file_paths(tree: &FileNode) -> Vec<String> {
    let mut paths = Vec::new();
    for child in &tree.children {
        collect_paths(child, PathBuf::new(), &mut paths);
    }
    paths
}

fn collect_paths(node: &FileNode, parent: PathBuf, out: &mut Vec<String>) {
    let path = parent.join(&node.name);
    if node.children.is_empty() {
        out.push(path.to_string_lossy().replace('\\', "/"));
        return;
    }
    for child in &node.children {
        collect_paths(child, path.clone(), out);
    }
}
