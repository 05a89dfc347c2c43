//! `find`: search branches for nodes.

use std::collections::HashSet;

use dtsh_model::{VirtualTree, arrange};
use dtsh_types::error::Result;

use crate::args::{
    self, COUNT, CriterionOption, ENABLED_ONLY, IGNORE_CASE, LOGICAL_NOT, LOGICAL_OR, ORDER_BY, REGEX, REVERSE,
    TREE_LIKE,
};
use crate::interpreter::{Command, CommandOutput, Environment};
use crate::list_commands::PATHS;
use crate::options::{OptionSpec, ParamSpec, ParsedArgs};
use crate::view::draw_tree;

pub(crate) struct FindCmd {
    options: Vec<OptionSpec>,
    criteria: Vec<(OptionSpec, CriterionOption)>,
}

impl FindCmd {
    pub(crate) fn new() -> Self {
        let criteria = CriterionOption::all();
        let mut options = vec![
            LOGICAL_OR,
            LOGICAL_NOT,
            REGEX,
            IGNORE_CASE,
            ENABLED_ONLY,
            COUNT,
            REVERSE,
            TREE_LIKE,
            ORDER_BY,
        ];
        options.extend(criteria.iter().map(|(spec, _)| *spec));
        Self { options, criteria }
    }
}

impl Command for FindCmd {
    fn name(&self) -> &str {
        "find"
    }
    fn description(&self) -> &str {
        "search branches for nodes"
    }
    fn options(&self) -> &[OptionSpec] {
        &self.options
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&PATHS)
    }
    fn supports_pager(&self) -> bool {
        true
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let chain = args::criteria_chain(self.name(), &self.criteria, args)?;
        let order_by = args::order_by(self.name(), args)?;
        let reverse = args.flag(&REVERSE);
        let enabled_only = args.flag(&ENABLED_ONLY);
        let tree_like = args.flag(&TREE_LIKE);

        let mut lines = Vec::new();
        let mut seen = HashSet::new();
        let mut count = 0;
        for expansion in env.expand_paths(self.name(), &args.params)? {
            for branch in arrange(env.tree, &expansion.nodes, order_by, reverse) {
                let found = env.tree.find(branch, &chain, order_by, reverse, enabled_only);
                if tree_like {
                    let path = env.pathway(branch, &expansion.prefix);
                    if found.is_empty() || !seen.insert(path.clone()) {
                        continue;
                    }
                    count += found.len();
                    let comb = VirtualTree::new(env.tree, branch, &found, order_by, reverse);
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.extend(draw_tree(env.tree, &path, branch, &|id, _| comb.children(id)));
                } else {
                    for node in found {
                        let path = env.pathway(node, &expansion.prefix);
                        if seen.insert(path.clone()) {
                            count += 1;
                            lines.push(path);
                        }
                    }
                }
            }
        }

        if args.flag(&COUNT) {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("Found: {count}"));
        }
        Ok(CommandOutput::lines(lines))
    }
}
