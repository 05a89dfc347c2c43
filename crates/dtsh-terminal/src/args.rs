//! Options shared by the built-in commands, and their typed values.

use dtsh_model::{CriteriaChain, IntCriterion, IntCriterionKind, SortKey, TextCriterion, TextCriterionKind};
use dtsh_types::error::{DtshError, Result};

use crate::options::{OptionSpec, ParsedArgs};

pub const REVERSE: OptionSpec = OptionSpec::flag(Some('r'), None, "reverse command output");
pub const ENABLED_ONLY: OptionSpec =
    OptionSpec::flag(None, Some("enabled-only"), "filter out disabled nodes or branches");
pub const ORDER_BY: OptionSpec = OptionSpec::arg(None, Some("order-by"), "key", "sort nodes or branches");
pub const FIXED_DEPTH: OptionSpec = OptionSpec::arg(None, Some("fixed-depth"), "depth", "limit devicetree depth");
pub const NO_CHILDREN: OptionSpec = OptionSpec::flag(Some('d'), None, "list nodes, not branch contents");
pub const RECURSIVE: OptionSpec = OptionSpec::flag(Some('R'), None, "list recursively");
pub const LOGICAL_OR: OptionSpec = OptionSpec::flag(None, Some("OR"), "match any criterion instead of all");
pub const LOGICAL_NOT: OptionSpec = OptionSpec::flag(None, Some("NOT"), "negate the criterion chain");
pub const REGEX: OptionSpec = OptionSpec::flag(Some('E'), None, "patterns are regular expressions");
pub const IGNORE_CASE: OptionSpec = OptionSpec::flag(Some('i'), None, "ignore case");
pub const COUNT: OptionSpec = OptionSpec::flag(None, Some("count"), "print matches count");
pub const TREE_LIKE: OptionSpec = OptionSpec::flag(Some('T'), None, "list results in tree-like format");

/// `--order-by` value, if given.
pub fn order_by(command: &str, args: &ParsedArgs) -> Result<Option<SortKey>> {
    args.value(&ORDER_BY)
        .map(|key| {
            SortKey::from_key(key).ok_or_else(|| DtshError::command(command, format!("invalid sort key: '{key}'")))
        })
        .transpose()
}

/// `--fixed-depth` value; 0 (unlimited) when not given.
pub fn fixed_depth(command: &str, args: &ParsedArgs) -> Result<usize> {
    let Some(raw) = args.value(&FIXED_DEPTH) else {
        return Ok(0);
    };
    let depth: i64 = raw
        .parse()
        .map_err(|_| DtshError::command(command, format!("expects an integer value (got '{raw}')")))?;
    usize::try_from(depth)
        .map_err(|_| DtshError::command(command, format!("expects a non negative value (got {depth})")))
}

// ---------------------------------------------------------------------------
// Search criteria options
// ---------------------------------------------------------------------------

/// Criterion kind selected by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionOption {
    Text(TextCriterionKind),
    Int(IntCriterionKind),
}

impl CriterionOption {
    /// Every criterion option, text ones first.
    pub fn all() -> Vec<(OptionSpec, Self)> {
        let text = TextCriterionKind::ALL.into_iter().map(|kind| {
            (
                OptionSpec::arg(None, Some(kind.option_name()), "pattern", kind.brief()),
                Self::Text(kind),
            )
        });
        let int = IntCriterionKind::ALL.into_iter().map(|kind| {
            (
                OptionSpec::arg(None, Some(kind.option_name()), "expr", kind.brief()),
                Self::Int(kind),
            )
        });
        text.chain(int).collect()
    }
}

/// Build the criteria chain from parsed arguments.
///
/// Criteria follow option declaration order; the last value given for an
/// option wins.
pub fn criteria_chain(
    command: &str,
    criteria: &[(OptionSpec, CriterionOption)],
    args: &ParsedArgs,
) -> Result<CriteriaChain> {
    let re_strict = args.flag(&REGEX);
    let ignore_case = args.flag(&IGNORE_CASE);
    let mut chain = CriteriaChain::new(Vec::new(), args.flag(&LOGICAL_OR), args.flag(&LOGICAL_NOT));
    for (spec, option) in criteria {
        let Some(value) = args.value(spec) else {
            continue;
        };
        let invalid = |e: DtshError| DtshError::command(command, e.to_string());
        match *option {
            CriterionOption::Text(kind) => {
                chain.push(TextCriterion::new(kind, value, re_strict, ignore_case).map_err(invalid)?);
            },
            CriterionOption::Int(kind) => {
                chain.push(IntCriterion::new(kind, value).map_err(invalid)?);
            },
        }
    }
    log::debug!("{command}: {} criteria", chain.len());
    Ok(chain)
}
