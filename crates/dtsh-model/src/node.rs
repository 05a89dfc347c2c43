//! Node attributes and the borrowed node view.

use serde::Deserialize;

use crate::tree::{Devicetree, NodeData, NodeId};

/// A register block: address and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Register {
    pub address: u64,
    #[serde(default)]
    pub size: u64,
}

/// An interrupt generated by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Interrupt {
    pub number: u64,
    #[serde(default)]
    pub priority: Option<u64>,
}

/// The binding that specifies a node's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Binding {
    /// Compatible string the binding was matched with, if any.
    #[serde(default)]
    pub compatible: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Depth of the binding in a child-binding chain (0 for top-level bindings).
    #[serde(default)]
    pub child_depth: u64,
}

impl Binding {
    /// First non-empty line of the description.
    pub fn headline(&self) -> Option<&str> {
        self.description
            .as_deref()?
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// Device vendor, from the vendor prefixes table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vendor {
    pub prefix: String,
    pub name: String,
}

/// Attributes a node carries besides its position in the tree.
///
/// The shell core never inspects these directly: they are consumed through
/// search criteria and sort keys.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeAttributes {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub compatible: Vec<String>,
    /// DTS labels.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Device label (`label` property).
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "reg")]
    pub registers: Vec<Register>,
    #[serde(default)]
    pub interrupts: Vec<Interrupt>,
    /// Bus protocols this node provides to its children.
    #[serde(default)]
    pub buses: Vec<String>,
    /// Bus this node appears on.
    #[serde(default)]
    pub on_bus: Option<String>,
    #[serde(default)]
    pub binding: Option<Binding>,
    #[serde(default)]
    pub vendor: Option<Vendor>,
    /// Dependency ordinal; assigned in pre-order when absent.
    #[serde(default)]
    pub dep_ordinal: Option<u64>,
}

fn default_status() -> String {
    "okay".to_string()
}

impl Default for NodeAttributes {
    fn default() -> Self {
        Self {
            status: default_status(),
            compatible: Vec::new(),
            labels: Vec::new(),
            label: None,
            registers: Vec::new(),
            interrupts: Vec::new(),
            buses: Vec::new(),
            on_bus: None,
            binding: None,
            vendor: None,
            dep_ordinal: None,
        }
    }
}

/// Borrowed view of one node of a [`Devicetree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Devicetree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t Devicetree, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Devicetree {
        self.tree
    }

    /// Node name, `/` for the root.
    pub fn name(&self) -> &'t str {
        &self.data().name
    }

    /// Absolute path.
    pub fn path(&self) -> &'t str {
        &self.data().path
    }

    /// Parent node; the root is its own parent.
    pub fn parent(&self) -> Node<'t> {
        Node::new(self.tree, self.data().parent)
    }

    pub fn is_root(&self) -> bool {
        self.data().parent == self.id
    }

    /// Children in definition order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node::new(tree, id))
    }

    pub fn child_ids(&self) -> &'t [NodeId] {
        &self.data().children
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    /// Child with the given name.
    pub fn child(&self, name: &str) -> Option<Node<'t>> {
        self.children().find(|child| child.name() == name)
    }

    pub fn status(&self) -> &'t str {
        &self.data().attrs.status
    }

    /// Whether the node is enabled (`okay` status).
    pub fn enabled(&self) -> bool {
        matches!(self.status(), "okay" | "ok")
    }

    /// Name without the unit address.
    pub fn unit_name(&self) -> &'t str {
        match self.name().split_once('@') {
            Some((unit_name, _)) => unit_name,
            None => self.name(),
        }
    }

    /// Unit address parsed from the `name@addr` suffix.
    pub fn unit_addr(&self) -> Option<u64> {
        let (_, addr) = self.name().split_once('@')?;
        let addr = addr.strip_prefix("0x").unwrap_or(addr);
        u64::from_str_radix(addr, 16).ok()
    }

    pub fn compatibles(&self) -> &'t [String] {
        &self.data().attrs.compatible
    }

    pub fn labels(&self) -> &'t [String] {
        &self.data().attrs.labels
    }

    /// Device label.
    pub fn label(&self) -> Option<&'t str> {
        self.data().attrs.label.as_deref()
    }

    pub fn registers(&self) -> &'t [Register] {
        &self.data().attrs.registers
    }

    pub fn interrupts(&self) -> &'t [Interrupt] {
        &self.data().attrs.interrupts
    }

    pub fn buses(&self) -> &'t [String] {
        &self.data().attrs.buses
    }

    pub fn on_bus(&self) -> Option<&'t str> {
        self.data().attrs.on_bus.as_deref()
    }

    pub fn binding(&self) -> Option<&'t Binding> {
        self.data().attrs.binding.as_ref()
    }

    pub fn vendor(&self) -> Option<&'t Vendor> {
        self.data().attrs.vendor.as_ref()
    }

    /// Binding description.
    pub fn description(&self) -> Option<&'t str> {
        self.binding()?.description.as_deref()
    }

    pub fn dep_ordinal(&self) -> u64 {
        self.data().dep_ordinal
    }

    /// Alias names that point at this node.
    pub fn aliases(&self) -> &'t [String] {
        &self.data().aliases
    }

    /// Chosen names that point at this node.
    pub fn chosen(&self) -> &'t [String] {
        &self.data().chosen
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: NodeId) -> bool {
        let mut node = Node::new(self.tree, other);
        loop {
            if node.id == self.id {
                return true;
            }
            if node.is_root() {
                return false;
            }
            node = node.parent();
        }
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Node").field(&self.path()).finish()
    }
}
