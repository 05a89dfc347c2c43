//! Node sorter.
//!
//! Sorting is stable. Nodes that have no value for the key are kept apart and
//! appended after the sorted ones, or put first when reversing.

use crate::node::Node;
use crate::tree::{Devicetree, NodeId};

/// Attribute nodes can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Path,
    Name,
    UnitName,
    UnitAddr,
    Compatible,
    Binding,
    Vendor,
    DeviceLabel,
    Labels,
    Aliases,
    Buses,
    OnBus,
    DepOrdinal,
    IrqNumbers,
    IrqPriorities,
    RegAddrs,
    RegSizes,
    BindingDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Weight<'t> {
    Int(u64),
    Text(&'t str),
}

impl SortKey {
    pub const ALL: [Self; 18] = [
        Self::Path,
        Self::Name,
        Self::UnitName,
        Self::UnitAddr,
        Self::Compatible,
        Self::Binding,
        Self::Vendor,
        Self::DeviceLabel,
        Self::Labels,
        Self::Aliases,
        Self::Buses,
        Self::OnBus,
        Self::DepOrdinal,
        Self::IrqNumbers,
        Self::IrqPriorities,
        Self::RegAddrs,
        Self::RegSizes,
        Self::BindingDepth,
    ];

    /// One-letter key used on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Self::Path => "p",
            Self::Name => "N",
            Self::UnitName => "n",
            Self::UnitAddr => "a",
            Self::Compatible => "c",
            Self::Binding => "C",
            Self::Vendor => "v",
            Self::DeviceLabel => "l",
            Self::Labels => "L",
            Self::Aliases => "A",
            Self::Buses => "B",
            Self::OnBus => "b",
            Self::DepOrdinal => "o",
            Self::IrqNumbers => "i",
            Self::IrqPriorities => "I",
            Self::RegAddrs => "r",
            Self::RegSizes => "s",
            Self::BindingDepth => "X",
        }
    }

    pub fn brief(self) -> &'static str {
        match self {
            Self::Path => "node path",
            Self::Name => "node name",
            Self::UnitName => "unit name",
            Self::UnitAddr => "unit address",
            Self::Compatible => "compatible strings",
            Self::Binding => "binding",
            Self::Vendor => "vendor name",
            Self::DeviceLabel => "device label",
            Self::Labels => "node labels",
            Self::Aliases => "aliases",
            Self::Buses => "supported bus protocols",
            Self::OnBus => "bus of appearance",
            Self::DepOrdinal => "dependency ordinal",
            Self::IrqNumbers => "IRQ numbers",
            Self::IrqPriorities => "IRQ priorities",
            Self::RegAddrs => "register addresses",
            Self::RegSizes => "register sizes",
            Self::BindingDepth => "child-binding depth",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    fn values<'t>(self, node: Node<'t>) -> Vec<Weight<'t>> {
        let texts = |items: &'t [String]| -> Vec<Weight<'t>> {
            items.iter().map(|s| Weight::Text(s.as_str())).collect()
        };
        let values = match self {
            Self::Path => vec![Weight::Text(node.path())],
            Self::Name => vec![Weight::Text(node.name())],
            Self::UnitName => vec![Weight::Text(node.unit_name())],
            Self::UnitAddr => node.unit_addr().map(Weight::Int).into_iter().collect(),
            Self::Compatible => texts(node.compatibles()),
            Self::Binding => node
                .binding()
                .and_then(|b| b.compatible.as_deref())
                .map(Weight::Text)
                .into_iter()
                .collect(),
            Self::Vendor => node.vendor().map(|v| Weight::Text(v.name.as_str())).into_iter().collect(),
            Self::DeviceLabel => node.label().map(Weight::Text).into_iter().collect(),
            Self::Labels => texts(node.labels()),
            Self::Aliases => texts(node.aliases()),
            Self::Buses => texts(node.buses()),
            Self::OnBus => node.on_bus().map(Weight::Text).into_iter().collect(),
            Self::DepOrdinal => vec![Weight::Int(node.dep_ordinal())],
            Self::IrqNumbers => node.interrupts().iter().map(|irq| Weight::Int(irq.number)).collect(),
            Self::IrqPriorities => node
                .interrupts()
                .iter()
                .map(|irq| Weight::Int(irq.priority.unwrap_or(u64::MAX)))
                .collect(),
            Self::RegAddrs => node.registers().iter().map(|reg| Weight::Int(reg.address)).collect(),
            Self::RegSizes => node.registers().iter().map(|reg| Weight::Int(reg.size)).collect(),
            Self::BindingDepth => node
                .binding()
                .map(|b| Weight::Int(b.child_depth))
                .into_iter()
                .collect(),
        };
        values
            .into_iter()
            .filter(|w| !matches!(w, Weight::Text("")))
            .collect()
    }

    /// Weight of a node: its value, or for list values the minimum (maximum
    /// when reversing). `None` when the node has no value.
    fn weight<'t>(self, node: Node<'t>, reverse: bool) -> Option<Weight<'t>> {
        let values = self.values(node).into_iter();
        if reverse { values.max() } else { values.min() }
    }

    /// Stable sort of `nodes` by this key.
    pub fn sort(self, tree: &Devicetree, nodes: &[NodeId], reverse: bool) -> Vec<NodeId> {
        let mut sortable = Vec::with_capacity(nodes.len());
        let mut unsortable = Vec::new();
        for &id in nodes {
            match self.weight(tree.node(id), reverse) {
                Some(weight) => sortable.push((weight, id)),
                None => unsortable.push(id),
            }
        }

        if reverse {
            sortable.sort_by(|a, b| b.0.cmp(&a.0));
            unsortable.reverse();
            unsortable.extend(sortable.into_iter().map(|(_, id)| id));
            unsortable
        } else {
            sortable.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted: Vec<NodeId> = sortable.into_iter().map(|(_, id)| id).collect();
            sorted.extend(unsortable);
            sorted
        }
    }
}

/// Order `nodes` by `order_by`, or keep declaration order (reversed if asked)
/// when no key is given.
pub fn arrange(tree: &Devicetree, nodes: &[NodeId], order_by: Option<SortKey>, reverse: bool) -> Vec<NodeId> {
    match order_by {
        Some(key) => key.sort(tree, nodes, reverse),
        None if reverse => nodes.iter().rev().copied().collect(),
        None => nodes.to_vec(),
    }
}
