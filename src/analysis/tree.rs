use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analysis::walker::{parent_key, WalkEntry};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    /// Relative path from the project root; empty for the root node.
    pub path: String,
    pub is_dir: bool,
    /// File size, or the summed size of everything below a directory.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
}

impl DirectoryNode {
    fn from_entry(entry: &WalkEntry) -> Self {
        DirectoryNode {
            name: entry.name.clone(),
            path: entry.relative_path.clone(),
            is_dir: entry.is_dir,
            size: entry.size,
            children: Vec::new(),
        }
    }

    pub fn root(name: impl Into<String>) -> Self {
        DirectoryNode {
            name: name.into(),
            path: String::new(),
            is_dir: true,
            size: 0,
            children: Vec::new(),
        }
    }

    /// Relative paths of every node below this one, depth first.
    pub fn flatten(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, paths: &mut Vec<String>) {
        for child in &self.children {
            paths.push(child.path.clone());
            child.collect_paths(paths);
        }
    }

    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    pub fn count(&self) -> usize {
        self.children.iter().map(|c| 1 + c.count()).sum()
    }
}

/// Result of assembling a tree.
#[derive(Debug, Clone)]
pub struct TreeBuild {
    pub root: DirectoryNode,
    /// Nodes whose parent path was not among the entries.
    pub orphans: Vec<DirectoryNode>,
}

/// Builds a [`DirectoryNode`] tree from walk entries in two passes.
///
/// Pass one puts every entry into a map keyed by relative path, next to a
/// synthetic root under `""`. Pass two moves nodes into their parents deepest
/// first, so each node is complete before it is attached. Entry order does
/// not matter.
pub struct DirectoryTreeBuilder {
    root_name: String,
}

impl DirectoryTreeBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        DirectoryTreeBuilder {
            root_name: root_name.into(),
        }
    }

    pub fn build(&self, entries: &[WalkEntry]) -> TreeBuild {
        // pass one
        let mut arena: HashMap<String, DirectoryNode> = HashMap::with_capacity(entries.len() + 1);
        arena.insert(String::new(), DirectoryNode::root(self.root_name.clone()));
        for entry in entries {
            if entry.relative_path.is_empty() {
                continue;
            }
            arena.insert(entry.relative_path.clone(), DirectoryNode::from_entry(entry));
        }

        // pass two
        let mut keys: Vec<String> = arena.keys().filter(|k| !k.is_empty()).cloned().collect();
        keys.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

        let mut orphans = Vec::new();
        for key in keys {
            let Some(mut node) = arena.remove(&key) else {
                continue;
            };
            sort_children(&mut node);
            if node.is_dir {
                node.size = node.children.iter().map(|c| c.size).sum();
            }

            let parent = parent_key(&key);
            match arena.get_mut(parent) {
                Some(parent_node) if parent_node.is_dir => parent_node.children.push(node),
                _ => {
                    log::warn!("Directory tree node {} has no parent directory {:?}", key, parent);
                    orphans.push(node);
                }
            }
        }

        let mut root = arena
            .remove("")
            .unwrap_or_else(|| DirectoryNode::root(self.root_name.clone()));
        sort_children(&mut root);
        root.size = root.children.iter().map(|c| c.size).sum();
        orphans.sort_by(|a, b| a.path.cmp(&b.path));

        TreeBuild { root, orphans }
    }
}

fn depth(key: &str) -> usize {
    key.matches('/').count()
}

/// Directories first, then by name.
fn sort_children(node: &mut DirectoryNode) {
    node.children
        .sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}
