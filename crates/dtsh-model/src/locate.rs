//! Node locator and glob expander.

use dtsh_types::error::{DtshError, Result};

use crate::path::{basename, dirname, is_wildcard, realpath};
use crate::tree::{Devicetree, NodeId};

/// Nodes matched by one positional path argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpansion {
    /// The expression as typed, used to build display paths.
    pub prefix: String,
    /// Matched nodes, in declaration order.
    pub nodes: Vec<NodeId>,
}

impl Devicetree {
    /// Node at an absolute, non-wildcarded path.
    pub fn locate(&self, path: &str) -> Result<NodeId> {
        if !path.starts_with('/') {
            return Err(DtshError::InvalidPath(format!("not an absolute path: '{path}'")));
        }
        if is_wildcard(path) {
            return Err(DtshError::InvalidPath(format!("unexpected wildcard: '{path}'")));
        }
        let canonical = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        self.node_at(canonical)
            .map(|node| node.id())
            .ok_or_else(|| DtshError::NotFound(path.to_string()))
    }

    /// Resolve `raw` against `cwd`, then list matching nodes.
    ///
    /// Without a trailing `*`, lists the children of the node at the resolved
    /// path. With it, lists the children of the directory part whose name
    /// starts with the last segment minus the `*`. A bare `*` lists the
    /// children of `cwd`. Declaration order is preserved.
    pub fn list_matches(&self, raw: &str, cwd: NodeId) -> Result<Vec<NodeId>> {
        let path = realpath(raw, self.node(cwd).path())?;
        if !is_wildcard(&path) {
            let node = self.locate(&path)?;
            return Ok(self.node(node).child_ids().to_vec());
        }

        let dir = self.locate(dirname(&path))?;
        let prefix = basename(&path)?.trim_end_matches('*');
        Ok(self
            .node(dir)
            .children()
            .filter(|child| child.name().starts_with(prefix))
            .map(|child| child.id())
            .collect())
    }

    /// Expand a positional path argument into the nodes it designates.
    ///
    /// A plain path designates one node; a wildcard expression designates its
    /// matches (possibly none).
    pub fn expand_path(&self, raw: &str, cwd: NodeId) -> Result<PathExpansion> {
        let path = realpath(raw, self.node(cwd).path())?;
        let nodes = if is_wildcard(&path) {
            self.list_matches(&path, cwd)?
        } else {
            vec![self.locate(&path)?]
        };
        log::debug!("expand '{raw}': {} node(s)", nodes.len());
        Ok(PathExpansion {
            prefix: raw.to_string(),
            nodes,
        })
    }

    /// Path of `node` as it should be displayed for an expression starting
    /// with `prefix`.
    ///
    /// Absolute expressions give absolute paths. Relative ones give paths
    /// relative to `cwd` (`.` for `cwd` itself) unless the node is not below
    /// `cwd`.
    pub fn pathway(&self, node: NodeId, prefix: &str, cwd: NodeId) -> String {
        let path = self.node(node).path();
        if prefix.starts_with('/') {
            return path.to_string();
        }
        if node == cwd {
            return ".".to_string();
        }
        let cwd_path = self.node(cwd).path();
        let below = if cwd_path == "/" {
            "/".to_string()
        } else {
            format!("{cwd_path}/")
        };
        match path.strip_prefix(below.as_str()) {
            Some(relative) => relative.to_string(),
            None => path.to_string(),
        }
    }
}
