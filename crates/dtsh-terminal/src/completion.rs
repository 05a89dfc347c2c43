//! Tab completion for the line editor.
//!
//! Completion looks at the command line up to the cursor and decides what
//! the word under the cursor designates: a command, an option, a sort key,
//! or the command's parameter. Candidates that would not extend the word are
//! never returned.

use std::cell::Cell;
use std::rc::Rc;

use dtsh_model::{Devicetree, NodeId, SortKey, path};

use crate::args::ORDER_BY;
use crate::interpreter::{Command, CommandRegistry};
use crate::options::{OptionKind, OptionSpec, ParamKind};

/// What the completed word designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    Command,
    Option,
    SortKey,
    NodePath,
    AliasName,
    ChosenName,
    /// Nothing to complete here.
    None,
}

/// Completion candidates for the word starting at byte offset `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub mode: CompletionMode,
    pub start: usize,
    pub candidates: Vec<String>,
}

/// Completion provider shared with the session.
pub struct Autocomplete {
    tree: Rc<Devicetree>,
    registry: Rc<CommandRegistry>,
    cwd: Rc<Cell<NodeId>>,
}

impl Autocomplete {
    pub fn new(tree: Rc<Devicetree>, registry: Rc<CommandRegistry>, cwd: Rc<Cell<NodeId>>) -> Self {
        Self { tree, registry, cwd }
    }

    /// Complete the word that ends at `pos` in `line`.
    pub fn complete(&self, line: &str, pos: usize) -> Completion {
        let head = line.get(..pos).unwrap_or(line);
        let start = head
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());
        let word = &head[start..];
        let before: Vec<&str> = head[..start].split_whitespace().collect();

        let (mode, candidates) = self.candidates(&before, word);
        let candidates = candidates
            .into_iter()
            .filter(|c| c.len() > word.len() && c.starts_with(word))
            .collect();
        Completion {
            mode,
            start,
            candidates,
        }
    }

    fn candidates(&self, before: &[&str], word: &str) -> (CompletionMode, Vec<String>) {
        let Some((&name, rest)) = before.split_first() else {
            return (CompletionMode::Command, self.registry.completions(word));
        };
        if name == "help" {
            return match rest {
                [] => (CompletionMode::Command, self.registry.completions(word)),
                _ => (CompletionMode::None, Vec::new()),
            };
        }
        let Some(cmd) = self.registry.get(name) else {
            return (CompletionMode::None, Vec::new());
        };
        let options = cmd.all_options();

        if let Some(&previous) = rest.last()
            && let Some(spec) = expects_value(&options, previous)
        {
            if spec == ORDER_BY {
                let keys = SortKey::ALL.iter().map(|key| key.key().to_string()).collect();
                return (CompletionMode::SortKey, keys);
            }
            return (CompletionMode::None, Vec::new());
        }

        if word.starts_with('-') {
            return (CompletionMode::Option, option_names(&options, word));
        }
        match cmd.param().map(|param| param.kind) {
            Some(ParamKind::NodePath) => (CompletionMode::NodePath, self.node_paths(word)),
            Some(ParamKind::AliasName) => (
                CompletionMode::AliasName,
                self.tree.aliases().map(|(name, _)| name.to_string()).collect(),
            ),
            Some(ParamKind::ChosenName) => (
                CompletionMode::ChosenName,
                self.tree.chosen().map(|(name, _)| name.to_string()).collect(),
            ),
            None => (CompletionMode::None, Vec::new()),
        }
    }

    /// Children of the directory part of `word`, as `word` would spell them.
    fn node_paths(&self, word: &str) -> Vec<String> {
        if path::is_wildcard(word) {
            return Vec::new();
        }
        let (dir, prefix) = match word.rfind('/') {
            Some(i) => word.split_at(i + 1),
            None => ("", word),
        };
        let cwd = self.cwd.get();
        let base = if dir.is_empty() {
            Ok(cwd)
        } else {
            path::realpath(dir, self.tree.node(cwd).path()).and_then(|p| self.tree.locate(&p))
        };
        let Ok(base) = base else {
            return Vec::new();
        };
        self.tree
            .node(base)
            .children()
            .filter(|child| child.name().starts_with(prefix))
            .map(|child| {
                let slash = if child.has_children() { "/" } else { "" };
                format!("{dir}{}{slash}", child.name())
            })
            .collect()
    }
}

/// The option waiting for a value after `word`, if any.
fn expects_value(options: &[OptionSpec], word: &str) -> Option<OptionSpec> {
    let spec = if let Some(long) = word.strip_prefix("--") {
        if long.is_empty() || long.contains('=') {
            return None;
        }
        match options.iter().find(|o| o.long == Some(long)) {
            Some(exact) => *exact,
            None => {
                let mut prefixed = options.iter().filter(|o| o.long.is_some_and(|l| l.starts_with(long)));
                match (prefixed.next(), prefixed.next()) {
                    (Some(only), None) => *only,
                    _ => return None,
                }
            },
        }
    } else {
        let last = word.strip_prefix('-')?.chars().last()?;
        *options.iter().find(|o| o.short == Some(last))?
    };
    matches!(spec.kind, OptionKind::Arg { .. }).then_some(spec)
}

/// Option names for `word`: `-` lists short forms then long-only ones,
/// `--` lists long forms.
fn option_names(options: &[OptionSpec], word: &str) -> Vec<String> {
    if word.starts_with("--") {
        return options
            .iter()
            .filter_map(|o| o.long.map(|long| format!("--{long}")))
            .collect();
    }
    let short = options.iter().filter_map(|o| o.short.map(|c| format!("-{c}")));
    let long_only = options
        .iter()
        .filter(|o| o.short.is_none())
        .filter_map(|o| o.long.map(|long| format!("--{long}")));
    short.chain(long_only).collect()
}
