//! Search criteria and criteria chains.
//!
//! A criterion pairs an attribute extractor (its kind) with a matcher: a
//! compiled pattern for text attributes, an integer expression for numeric
//! ones. Criteria are stateless once built and are combined into a
//! [`CriteriaChain`] with AND/OR and an optional final negation.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use dtsh_types::error::{DtshError, Result};

use crate::node::Node;

/// Text attributes a criterion can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextCriterionKind {
    Path,
    Status,
    Name,
    UnitName,
    Compatible,
    Binding,
    Vendor,
    Description,
    Bus,
    OnBus,
    DeviceLabel,
    Label,
    Alias,
    Chosen,
    AlsoKnownAs,
}

impl TextCriterionKind {
    pub const ALL: [Self; 15] = [
        Self::Path,
        Self::Status,
        Self::Name,
        Self::UnitName,
        Self::Compatible,
        Self::Binding,
        Self::Vendor,
        Self::Description,
        Self::Bus,
        Self::OnBus,
        Self::DeviceLabel,
        Self::Label,
        Self::Alias,
        Self::Chosen,
        Self::AlsoKnownAs,
    ];

    /// Long option that selects this criterion.
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Path => "with-path",
            Self::Status => "with-status",
            Self::Name => "with-name",
            Self::UnitName => "with-unit-name",
            Self::Compatible => "with-compatible",
            Self::Binding => "with-binding",
            Self::Vendor => "with-vendor",
            Self::Description => "with-description",
            Self::Bus => "with-bus",
            Self::OnBus => "on-bus",
            Self::DeviceLabel => "with-device-label",
            Self::Label => "with-label",
            Self::Alias => "with-alias",
            Self::Chosen => "chosen-for",
            Self::AlsoKnownAs => "also-known-as",
        }
    }

    pub fn brief(self) -> &'static str {
        match self {
            Self::Path => "match path name",
            Self::Status => "match status string",
            Self::Name => "match node name",
            Self::UnitName => "match unit name",
            Self::Compatible => "match compatible strings",
            Self::Binding => "match binding's compatible or headline",
            Self::Vendor => "match vendor prefix or name",
            Self::Description => "grep binding's description",
            Self::Bus => "match supported bus protocols",
            Self::OnBus => "match bus of appearance",
            Self::DeviceLabel => "match device label",
            Self::Label => "match node labels",
            Self::Alias => "match aliases",
            Self::Chosen => "match chosen nodes",
            Self::AlsoKnownAs => "match labels or aliases",
        }
    }

    fn haystack<'t>(self, node: Node<'t>) -> Vec<&'t str> {
        match self {
            Self::Path => vec![node.path()],
            Self::Status => vec![node.status()],
            Self::Name => vec![node.name()],
            Self::UnitName => vec![node.unit_name()],
            Self::Compatible => node.compatibles().iter().map(String::as_str).collect(),
            Self::Binding => match node.binding() {
                Some(binding) => binding
                    .compatible
                    .as_deref()
                    .into_iter()
                    .chain(binding.headline())
                    .collect(),
                None => Vec::new(),
            },
            Self::Vendor => match node.vendor() {
                Some(vendor) => vec![vendor.prefix.as_str(), vendor.name.as_str()],
                None => Vec::new(),
            },
            Self::Description => node.description().map(|d| d.lines().collect()).unwrap_or_default(),
            Self::Bus => node.buses().iter().map(String::as_str).collect(),
            Self::OnBus => node.on_bus().into_iter().collect(),
            Self::DeviceLabel => node.label().into_iter().collect(),
            Self::Label => node.labels().iter().map(String::as_str).collect(),
            Self::Alias => node.aliases().iter().map(String::as_str).collect(),
            Self::Chosen => node.chosen().iter().map(String::as_str).collect(),
            Self::AlsoKnownAs => node
                .aliases()
                .iter()
                .chain(node.labels())
                .map(String::as_str)
                .chain(node.label())
                .collect(),
        }
    }
}

/// A text criterion: a kind and a compiled pattern.
#[derive(Debug, Clone)]
pub struct TextCriterion {
    kind: TextCriterionKind,
    pattern: String,
    re: Regex,
    any_binding: bool,
}

impl TextCriterion {
    /// Compile `pattern`.
    ///
    /// With `re_strict`, the pattern is a regular expression matched at the
    /// start of each haystack string. Otherwise it is literal text searched
    /// anywhere, unless it contains `*`, in which case the whole string must
    /// match with `*` standing for anything.
    pub fn new(kind: TextCriterionKind, pattern: &str, re_strict: bool, ignore_case: bool) -> Result<Self> {
        let source = if re_strict {
            format!("^(?:{pattern})")
        } else {
            let escaped = regex::escape(pattern);
            if escaped.contains(r"\*") {
                format!("^(?:{})$", escaped.replace(r"\*", ".*"))
            } else {
                escaped
            }
        };
        let re = RegexBuilder::new(&source)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| DtshError::Criterion(format!("invalid RE '{pattern}': {e}")))?;
        let any_binding = kind == TextCriterionKind::Binding
            && ((re_strict && pattern == ".*") || (!re_strict && pattern == "*"));
        Ok(Self {
            kind,
            pattern: pattern.to_string(),
            re,
            any_binding,
        })
    }

    pub fn kind(&self) -> TextCriterionKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, node: Node<'_>) -> bool {
        if self.any_binding {
            return node.binding().is_some();
        }
        self.kind
            .haystack(node)
            .iter()
            .any(|text| self.re.is_match(text))
    }
}

/// Integer attributes a criterion can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntCriterionKind {
    UnitAddr,
    IrqNumber,
    IrqPriority,
    RegAddr,
    RegSize,
    BindingDepth,
    DtsOrd,
}

impl IntCriterionKind {
    pub const ALL: [Self; 7] = [
        Self::UnitAddr,
        Self::IrqNumber,
        Self::IrqPriority,
        Self::RegAddr,
        Self::RegSize,
        Self::BindingDepth,
        Self::DtsOrd,
    ];

    pub fn option_name(self) -> &'static str {
        match self {
            Self::UnitAddr => "with-unit-addr",
            Self::IrqNumber => "with-irq-number",
            Self::IrqPriority => "with-irq-priority",
            Self::RegAddr => "with-reg-addr",
            Self::RegSize => "with-reg-size",
            Self::BindingDepth => "with-binding-depth",
            Self::DtsOrd => "with-dts-ord",
        }
    }

    pub fn brief(self) -> &'static str {
        match self {
            Self::UnitAddr => "match unit address",
            Self::IrqNumber => "match IRQ numbers",
            Self::IrqPriority => "match IRQ priorities",
            Self::RegAddr => "match register addresses",
            Self::RegSize => "match register sizes",
            Self::BindingDepth => "match child-binding depth",
            Self::DtsOrd => "match dependency ordinal",
        }
    }

    fn haystack(self, node: Node<'_>) -> Vec<u64> {
        match self {
            Self::UnitAddr => node.unit_addr().into_iter().collect(),
            Self::IrqNumber => node.interrupts().iter().map(|irq| irq.number).collect(),
            Self::IrqPriority => node.interrupts().iter().filter_map(|irq| irq.priority).collect(),
            Self::RegAddr => node.registers().iter().map(|reg| reg.address).collect(),
            Self::RegSize => node.registers().iter().map(|reg| reg.size).collect(),
            Self::BindingDepth => node.binding().map(|b| b.child_depth).into_iter().collect(),
            Self::DtsOrd => vec![node.dep_ordinal()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Lt,
    Gt,
    Eq,
    Ge,
    Le,
    Ne,
}

impl IntOp {
    fn parse(op: &str) -> Result<Self> {
        match op {
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "=" => Ok(Self::Eq),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            "!=" => Ok(Self::Ne),
            _ => Err(DtshError::Criterion(format!("invalid operator: '{op}'"))),
        }
    }

    fn apply(self, lhs: u64, rhs: u64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Eq => lhs == rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

static INT_EXPR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<operator>[<>=!]+)?\s*(?P<integer>[\da-fA-FoOxX]+)\s*(?P<unit>[kKbBmM]+)?$").ok()
});

/// `[OP] N [UNIT]`, or `*` for any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntExpr {
    op: IntOp,
    /// `None` matches any value.
    value: Option<u64>,
}

impl IntExpr {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == "*" {
            return Ok(Self {
                op: IntOp::Eq,
                value: None,
            });
        }
        let caps = INT_EXPR
            .as_ref()
            .and_then(|re| re.captures(raw))
            .ok_or_else(|| DtshError::Criterion(format!("invalid integer expression: '{raw}'")))?;

        let op = match caps.name("operator") {
            Some(m) => IntOp::parse(m.as_str())?,
            None => IntOp::Eq,
        };
        let digits = caps.name("integer").map_or("", |m| m.as_str());
        let mut value =
            parse_int(digits).ok_or_else(|| DtshError::Criterion(format!("not a number: '{digits}'")))?;
        if let Some(unit) = caps.name("unit") {
            let factor = match unit.as_str().to_ascii_lowercase().as_str() {
                "k" | "kb" => 1024,
                "m" | "mb" => 1024 * 1024,
                other => return Err(DtshError::Criterion(format!("not an SI unit: '{other}'"))),
            };
            value = value
                .checked_mul(factor)
                .ok_or_else(|| DtshError::Criterion(format!("not a number: '{digits}'")))?;
        }
        Ok(Self { op, value: Some(value) })
    }

    pub fn matches(&self, value: u64) -> bool {
        match self.value {
            Some(rhs) => self.op.apply(value, rhs),
            None => true,
        }
    }
}

fn parse_int(digits: &str) -> Option<u64> {
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, lower.as_str())
    };
    u64::from_str_radix(body, radix).ok()
}

/// An integer criterion: a kind and an expression.
#[derive(Debug, Clone)]
pub struct IntCriterion {
    kind: IntCriterionKind,
    expr: IntExpr,
}

impl IntCriterion {
    pub fn new(kind: IntCriterionKind, expr: &str) -> Result<Self> {
        Ok(Self {
            kind,
            expr: IntExpr::parse(expr)?,
        })
    }

    pub fn kind(&self) -> IntCriterionKind {
        self.kind
    }

    pub fn matches(&self, node: Node<'_>) -> bool {
        self.kind
            .haystack(node)
            .into_iter()
            .any(|value| self.expr.matches(value))
    }
}

/// Any criterion.
#[derive(Debug, Clone)]
pub enum Criterion {
    Text(TextCriterion),
    Int(IntCriterion),
}

impl Criterion {
    pub fn matches(&self, node: Node<'_>) -> bool {
        match self {
            Self::Text(c) => c.matches(node),
            Self::Int(c) => c.matches(node),
        }
    }
}

impl From<TextCriterion> for Criterion {
    fn from(c: TextCriterion) -> Self {
        Self::Text(c)
    }
}

impl From<IntCriterion> for Criterion {
    fn from(c: IntCriterion) -> Self {
        Self::Int(c)
    }
}

/// Criteria combined with AND (default) or OR, optionally negated.
///
/// An empty chain matches every node, negated or not.
#[derive(Debug, Clone, Default)]
pub struct CriteriaChain {
    criteria: Vec<Criterion>,
    ored: bool,
    negated: bool,
}

impl CriteriaChain {
    pub fn new(criteria: Vec<Criterion>, ored: bool, negated: bool) -> Self {
        Self {
            criteria,
            ored,
            negated,
        }
    }

    pub fn push(&mut self, criterion: impl Into<Criterion>) {
        self.criteria.push(criterion.into());
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn matches(&self, node: Node<'_>) -> bool {
        if self.criteria.is_empty() {
            return true;
        }
        let raw = if self.ored {
            self.criteria.iter().any(|c| c.matches(node))
        } else {
            self.criteria.iter().all(|c| c.matches(node))
        };
        raw != self.negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::board;
    use crate::tree::Devicetree;
    use proptest::prelude::*;

    fn text(kind: TextCriterionKind, pattern: &str) -> TextCriterion {
        TextCriterion::new(kind, pattern, false, false).unwrap()
    }

    fn matching(tree: &Devicetree, criterion: &Criterion) -> Vec<String> {
        tree.iter()
            .filter(|n| criterion.matches(*n))
            .map(|n| n.path().to_string())
            .collect()
    }

    #[test]
    fn plain_pattern_is_substring() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Name, "i2c"));
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000"]);
    }

    #[test]
    fn plain_pattern_escapes_regex_syntax() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Name, "cpu@0"));
        assert_eq!(matching(&tree, &c), ["/cpus/cpu@0"]);
        // '.' is literal without -E.
        let c = Criterion::from(text(TextCriterionKind::Compatible, "nordic.nrf"));
        assert!(matching(&tree, &c).is_empty());
    }

    #[test]
    fn wildcard_pattern_is_anchored() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Name, "led*"));
        assert_eq!(matching(&tree, &c), ["/leds", "/leds/led_0", "/leds/led_1"]);
        let c = Criterion::from(text(TextCriterionKind::Name, "*_1"));
        assert_eq!(matching(&tree, &c), ["/leds/led_1"]);
    }

    #[test]
    fn strict_regex_matches_at_start() {
        let tree = board();
        let c = Criterion::from(TextCriterion::new(TextCriterionKind::Name, "led_[01]", true, false).unwrap());
        assert_eq!(matching(&tree, &c), ["/leds/led_0", "/leds/led_1"]);
        let c = Criterion::from(TextCriterion::new(TextCriterionKind::Name, "_0", true, false).unwrap());
        assert!(matching(&tree, &c).is_empty());
    }

    #[test]
    fn ignore_case() {
        let tree = board();
        let c = Criterion::from(TextCriterion::new(TextCriterionKind::DeviceLabel, "uart_0", false, true).unwrap());
        assert_eq!(matching(&tree, &c), ["/soc/uart@40002000"]);
        let c = Criterion::from(text(TextCriterionKind::DeviceLabel, "uart_0"));
        assert!(matching(&tree, &c).is_empty());
    }

    #[test]
    fn invalid_regex_is_criterion_error() {
        let err = TextCriterion::new(TextCriterionKind::Name, "(", true, false).unwrap_err();
        assert!(matches!(err, DtshError::Criterion(_)));
        assert!(format!("{err}").starts_with("invalid RE '(':"));
    }

    #[test]
    fn binding_wildcard_matches_any_binding() {
        let tree = board();
        let any = Criterion::from(text(TextCriterionKind::Binding, "*"));
        let strict = Criterion::from(TextCriterion::new(TextCriterionKind::Binding, ".*", true, false).unwrap());
        let expected: Vec<String> = tree
            .iter()
            .filter(|n| n.binding().is_some())
            .map(|n| n.path().to_string())
            .collect();
        assert!(!expected.is_empty());
        assert_eq!(matching(&tree, &any), expected);
        assert_eq!(matching(&tree, &strict), expected);
    }

    #[test]
    fn binding_headline_and_description() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Binding, "environmental"));
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000/bme680@76"]);
        let c = Criterion::from(TextCriterion::new(TextCriterionKind::Description, "Measures", true, false).unwrap());
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000/bme680@76"]);
    }

    #[test]
    fn vendor_prefix_or_name() {
        let tree = board();
        let by_prefix = Criterion::from(text(TextCriterionKind::Vendor, "bosch"));
        let by_name = Criterion::from(text(TextCriterionKind::Vendor, "Sensortec"));
        assert_eq!(matching(&tree, &by_prefix), matching(&tree, &by_name));
    }

    #[test]
    fn also_known_as_spans_aliases_and_labels() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::AlsoKnownAs, "sensor"));
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000/bme680@76"]);
        let c = Criterion::from(text(TextCriterionKind::AlsoKnownAs, "arduino_serial"));
        assert_eq!(matching(&tree, &c), ["/soc/uart@40002000"]);
    }

    #[test]
    fn chosen_and_bus() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Chosen, "console"));
        assert_eq!(matching(&tree, &c), ["/soc/uart@40002000"]);
        let c = Criterion::from(text(TextCriterionKind::OnBus, "i2c"));
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000/bme680@76"]);
    }

    #[test]
    fn empty_haystack_never_matches() {
        let tree = board();
        let c = Criterion::from(text(TextCriterionKind::Alias, "*"));
        let leds = tree.node_at("/leds").unwrap();
        assert!(!c.matches(leds));
    }

    #[test]
    fn int_expr_operators() {
        let expr = IntExpr::parse(">= 0x10").unwrap();
        assert!(expr.matches(16));
        assert!(!expr.matches(15));
        assert!(IntExpr::parse("!=3").unwrap().matches(4));
        assert!(IntExpr::parse("<3").unwrap().matches(2));
        assert!(IntExpr::parse("3").unwrap().matches(3));
        assert!(IntExpr::parse("*").unwrap().matches(12345));
    }

    #[test]
    fn int_expr_bases_and_units() {
        assert!(IntExpr::parse("0b101").unwrap().matches(5));
        assert!(IntExpr::parse("0o17").unwrap().matches(15));
        assert!(IntExpr::parse("4k").unwrap().matches(4096));
        assert!(IntExpr::parse("1 MB").unwrap().matches(1024 * 1024));
        assert!(IntExpr::parse("48kb").unwrap().matches(0xc000));
    }

    #[test]
    fn int_expr_errors() {
        let msg = |raw: &str| format!("{}", IntExpr::parse(raw).unwrap_err());
        assert_eq!(msg("=>3"), "invalid operator: '=>'");
        assert_eq!(msg("0xzz"), "invalid integer expression: '0xzz'");
        assert_eq!(msg("12f"), "not a number: '12f'");
        assert_eq!(msg("3 km"), "not an SI unit: 'km'");
        assert_eq!(msg("three"), "invalid integer expression: 'three'");
    }

    #[test]
    fn int_criteria() {
        let tree = board();
        let c = Criterion::from(IntCriterion::new(IntCriterionKind::IrqNumber, "2").unwrap());
        assert_eq!(matching(&tree, &c), ["/soc/uart@40002000"]);
        let c = Criterion::from(IntCriterion::new(IntCriterionKind::IrqPriority, "*").unwrap());
        assert_eq!(
            matching(&tree, &c),
            [
                "/soc/clock@40000000",
                "/soc/uart@40002000",
                "/soc/i2c@40003000",
                "/soc/spi@40004000",
                "/soc/timer@4000a000",
            ]
        );
        let c = Criterion::from(IntCriterion::new(IntCriterionKind::UnitAddr, "0x76").unwrap());
        assert_eq!(matching(&tree, &c), ["/soc/i2c@40003000/bme680@76"]);
        let c = Criterion::from(IntCriterion::new(IntCriterionKind::DtsOrd, "0").unwrap());
        assert_eq!(matching(&tree, &c), ["/"]);
    }

    #[test]
    fn empty_chain_matches_everything() {
        let tree = board();
        for negated in [false, true] {
            let chain = CriteriaChain::new(Vec::new(), false, negated);
            assert!(tree.iter().all(|n| chain.matches(n)));
        }
    }

    const NAMES: [&str; 8] = ["soc", "led", "i2c", "@", "partition", "cpu", "flash", "zzz"];

    proptest! {
        #[test]
        fn chain_combinators(
            a in prop::sample::select(&NAMES[..]),
            b in prop::sample::select(&NAMES[..]),
            ored in any::<bool>(),
            negated in any::<bool>(),
        ) {
            let tree = board();
            let ca = Criterion::from(text(TextCriterionKind::Path, a));
            let cb = Criterion::from(text(TextCriterionKind::Path, b));
            let chain = CriteriaChain::new(vec![ca.clone(), cb.clone()], ored, negated);
            for node in tree.iter() {
                let (ma, mb) = (ca.matches(node), cb.matches(node));
                let raw = if ored { ma || mb } else { ma && mb };
                prop_assert_eq!(chain.matches(node), if negated { !raw } else { raw });
            }
        }
    }
}
