//! Listing built-ins: `ls` and `tree`.
//!
//! Both expand their path parameters, order the expanded nodes, and key the
//! results by display path: a node reached twice is listed once.

use std::collections::HashSet;

use dtsh_model::{NodeId, WalkOptions, arrange};
use dtsh_types::error::Result;

use crate::args::{self, ENABLED_ONLY, FIXED_DEPTH, NO_CHILDREN, ORDER_BY, RECURSIVE, REVERSE};
use crate::interpreter::{Command, CommandOutput, Environment};
use crate::options::{Arity, OptionSpec, ParamKind, ParamSpec, ParsedArgs};
use crate::view::draw_tree;

pub(crate) const PATHS: ParamSpec = ParamSpec {
    name: "path",
    brief: "devicetree path, possibly ending with '*'",
    arity: Arity::Variadic,
    kind: ParamKind::NodePath,
};

/// Expanded nodes as (display path, node), ordered per expression, first
/// occurrence of each path kept.
fn path2node(
    command: &str,
    args: &ParsedArgs,
    env: &Environment<'_>,
) -> Result<Vec<(String, NodeId)>> {
    let order_by = args::order_by(command, args)?;
    let reverse = args.flag(&REVERSE);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for expansion in env.expand_paths(command, &args.params)? {
        for node in arrange(env.tree, &expansion.nodes, order_by, reverse) {
            let path = env.pathway(node, &expansion.prefix);
            if seen.insert(path.clone()) {
                entries.push((path, node));
            }
        }
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

const LS_OPTIONS: [OptionSpec; 6] = [NO_CHILDREN, REVERSE, RECURSIVE, ENABLED_ONLY, ORDER_BY, FIXED_DEPTH];

pub(crate) struct LsCmd;

impl LsCmd {
    /// Branches to list as directories, with their ordered contents.
    fn path2contents(&self, args: &ParsedArgs, env: &Environment<'_>) -> Result<Vec<(String, Vec<NodeId>)>> {
        let opts = WalkOptions {
            order_by: args::order_by(self.name(), args)?,
            reverse: args.flag(&REVERSE),
            enabled_only: args.flag(&ENABLED_ONLY),
            fixed_depth: args::fixed_depth(self.name(), args)?,
        };
        let recursive = args.flag(&RECURSIVE) || args.value(&FIXED_DEPTH).is_some();
        let contents = |id: NodeId| {
            let children = env.tree.visible_children(id, opts.enabled_only);
            arrange(env.tree, &children, opts.order_by, opts.reverse)
        };

        let mut seen = HashSet::new();
        let mut listing = Vec::new();
        for (path, node) in path2node(self.name(), args, env)? {
            if !recursive {
                if seen.insert(path.clone()) {
                    listing.push((path, contents(node)));
                }
                continue;
            }
            // The branch itself, then every branch below it.
            let prefix = path.clone();
            let walked = std::iter::once(node).chain(env.tree.walk(node, &opts));
            for branch in walked {
                let branch_path = env.pathway(branch, &prefix);
                if seen.insert(branch_path.clone()) {
                    listing.push((branch_path, contents(branch)));
                }
            }
        }
        Ok(listing)
    }
}

impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "list branch contents"
    }
    fn options(&self) -> &[OptionSpec] {
        &LS_OPTIONS
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&PATHS)
    }
    fn supports_pager(&self) -> bool {
        true
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.flag(&NO_CHILDREN) {
            let paths = path2node(self.name(), args, env)?;
            return Ok(CommandOutput::lines(paths.into_iter().map(|(path, _)| path).collect()));
        }

        let listing = self.path2contents(args, env)?;
        let headers = listing.len() > 1;
        let mut lines = Vec::new();
        for (i, (dirpath, contents)) in listing.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            if headers {
                lines.push(format!("{dirpath}:"));
            }
            lines.extend(contents.iter().map(|&id| env.tree.node(id).name().to_string()));
        }
        Ok(CommandOutput::lines(lines))
    }
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

const TREE_OPTIONS: [OptionSpec; 4] = [REVERSE, ENABLED_ONLY, ORDER_BY, FIXED_DEPTH];

pub(crate) struct TreeCmd;
impl Command for TreeCmd {
    fn name(&self) -> &str {
        "tree"
    }
    fn description(&self) -> &str {
        "list branch contents in tree-like format"
    }
    fn options(&self) -> &[OptionSpec] {
        &TREE_OPTIONS
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&PATHS)
    }
    fn supports_pager(&self) -> bool {
        true
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let order_by = args::order_by(self.name(), args)?;
        let reverse = args.flag(&REVERSE);
        let enabled_only = args.flag(&ENABLED_ONLY);
        let fixed_depth = args::fixed_depth(self.name(), args)?;
        let tree = env.tree;
        let children = |id: NodeId, depth: usize| {
            if fixed_depth > 0 && depth >= fixed_depth {
                return Vec::new();
            }
            arrange(tree, &tree.visible_children(id, enabled_only), order_by, reverse)
        };

        let mut lines = Vec::new();
        for (i, (path, branch)) in path2node(self.name(), args, env)?.into_iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.extend(draw_tree(tree, &path, branch, &children));
        }
        Ok(CommandOutput::lines(lines))
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::{board, run, run_at};

    #[test]
    fn ls_lists_children() {
        assert_eq!(run("ls").unwrap(), "cpus\nsoc\nleds");
        assert_eq!(run("ls /leds").unwrap(), "led_0\nled_1");
        let tree = board();
        let (out, _) = run_at(&tree, "/leds", "ls").unwrap();
        assert_eq!(out, "led_0\nled_1");
    }

    #[test]
    fn ls_reverse_and_order_by() {
        assert_eq!(run("ls -r /leds").unwrap(), "led_1\nled_0");
        assert_eq!(run("ls --order-by N").unwrap(), "cpus\nleds\nsoc");
        let err = run("ls --order-by z").unwrap_err();
        assert_eq!(format!("{err}"), "ls: invalid sort key: 'z'");
    }

    #[test]
    fn ls_several_branches_get_headers() {
        assert_eq!(run("ls /cpus /leds").unwrap(), "/cpus:\ncpu@0\n\n/leds:\nled_0\nled_1");
        // The same branch is listed once.
        assert_eq!(run("ls /leds /leds/").unwrap(), "led_0\nled_1");
    }

    #[test]
    fn ls_wildcard_lists_each_match() {
        assert_eq!(run("ls /leds/led*").unwrap(), "/leds/led_0:\n\n/leds/led_1:");
        assert_eq!(run("ls /cp*").unwrap(), "cpu@0");
        assert_eq!(run("ls /nothing*").unwrap(), "");
        let tree = board();
        let (out, _) = run_at(&tree, "/soc/flash-controller@4001e000", "ls -d *").unwrap();
        assert_eq!(out, "flash@0");
    }

    #[test]
    fn ls_no_children() {
        assert_eq!(run("ls -d /leds/*").unwrap(), "/leds/led_0\n/leds/led_1");
        let tree = board();
        let (out, _) = run_at(&tree, "/leds", "ls -d . led_1").unwrap();
        assert_eq!(out, ".\nled_1");
    }

    #[test]
    fn ls_enabled_only() {
        let tree = board();
        let (all, _) = run_at(&tree, "/soc", "ls").unwrap();
        let (enabled, _) = run_at(&tree, "/soc", "ls --enabled-only").unwrap();
        assert_eq!(all.lines().count(), 7);
        assert_eq!(enabled.lines().count(), 5);
        assert!(!enabled.contains("spi@"));
    }

    #[test]
    fn ls_recursive() {
        let out = run("ls -R /leds").unwrap();
        assert_eq!(out, "/leds:\nled_0\nled_1\n\n/leds/led_0:\n\n/leds/led_1:");

        let tree = board();
        let (out, _) = run_at(&tree, "/soc", "ls --fixed-depth 1 i2c@40003000").unwrap();
        assert_eq!(out, "i2c@40003000:\nbme680@76\n\ni2c@40003000/bme680@76:");
    }

    #[test]
    fn ls_errors() {
        let err = run("ls /nope").unwrap_err();
        assert_eq!(format!("{err}"), "ls: no such node: /nope");
        let err = run("ls -x").unwrap_err();
        assert_eq!(format!("{err}"), "ls: unrecognized option '-x'");
        let err = run("ls --fixed-depth x").unwrap_err();
        assert_eq!(format!("{err}"), "ls: expects an integer value (got 'x')");
        assert!(run("ls -h").unwrap().starts_with("ls: list branch contents"));
    }

    #[test]
    fn tree_draws_branch() {
        assert_eq!(
            run("tree /soc/i2c@40003000").unwrap(),
            "/soc/i2c@40003000\n└── bme680@76"
        );
        let out = run("tree --fixed-depth 1 -r").unwrap();
        assert_eq!(out, ".\n├── leds\n├── soc\n└── cpus");
    }

    #[test]
    fn tree_several_branches() {
        let tree = board();
        let (out, _) = run_at(&tree, "/", "tree cpus leds").unwrap();
        assert_eq!(out, "cpus\n└── cpu@0\n\nleds\n├── led_0\n└── led_1");
    }

    #[test]
    fn tree_enabled_only() {
        let out = run("tree --enabled-only /soc").unwrap();
        assert!(!out.contains("spi@"));
        assert!(!out.contains("mx25"));
        assert!(out.contains("│   └── bme680@76"));
    }
}
