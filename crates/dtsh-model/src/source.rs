//! Devicetree description files.
//!
//! A description is a nested document (TOML or JSON) whose top level holds
//! the root node's attributes, the `aliases` and `chosen` tables, and the
//! root's `children`. Each child carries a `name`, its attributes and its own
//! `children`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use dtsh_types::error::{DtshError, Result};

use crate::node::NodeAttributes;
use crate::tree::{Devicetree, DevicetreeBuilder, NodeId};

#[derive(Debug, Deserialize)]
struct NodeSource {
    name: String,
    #[serde(flatten)]
    attrs: NodeAttributes,
    #[serde(default)]
    children: Vec<NodeSource>,
}

#[derive(Debug, Deserialize)]
struct DevicetreeSource {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    chosen: BTreeMap<String, String>,
    #[serde(flatten)]
    root: NodeAttributes,
    #[serde(default)]
    children: Vec<NodeSource>,
}

impl DevicetreeSource {
    fn build(self) -> Result<Devicetree> {
        let mut builder = Devicetree::builder();
        builder.set_root_attributes(self.root);
        let root = builder.root_id();
        for child in self.children {
            add_branch(&mut builder, root, child)?;
        }
        for (name, path) in &self.aliases {
            builder.add_alias(name, path);
        }
        for (name, path) in &self.chosen {
            builder.add_chosen(name, path);
        }
        builder.build()
    }
}

fn add_branch(builder: &mut DevicetreeBuilder, parent: NodeId, source: NodeSource) -> Result<()> {
    let id = builder.add_node(parent, &source.name, source.attrs)?;
    for child in source.children {
        add_branch(builder, id, child)?;
    }
    Ok(())
}

impl Devicetree {
    /// Build a tree from a TOML description.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let source: DevicetreeSource = toml::from_str(text)?;
        source.build()
    }

    /// Build a tree from a JSON description.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let source: DevicetreeSource = serde_json::from_str(text)?;
        source.build()
    }

    /// Load a description file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading devicetree from {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(DtshError::Source(format!(
                "unsupported description format: {}",
                path.display()
            ))),
        }
    }
}
