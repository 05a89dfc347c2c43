//! Navigation built-ins: `pwd`, `cd`, `alias` and `chosen`.

use dtsh_model::{Node, path};
use dtsh_types::error::{DtshError, Result};

use crate::args::ENABLED_ONLY;
use crate::find_commands::FindCmd;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::list_commands::{LsCmd, TreeCmd};
use crate::options::{Arity, OptionSpec, ParamKind, ParamSpec, ParsedArgs};

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(TreeCmd));
    reg.register(Box::new(FindCmd::new()));
    reg.register(Box::new(AliasCmd));
    reg.register(Box::new(ChosenCmd));
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "print current working branch"
    }
    fn execute(&self, _args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.tree.node(env.cwd).path().to_string()))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

const CD_PATH: ParamSpec = ParamSpec {
    name: "path",
    brief: "path to the new working branch",
    arity: Arity::Optional,
    kind: ParamKind::NodePath,
};

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "change current working branch"
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&CD_PATH)
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let raw = args.params.first().map_or("/", String::as_str);
        let target = path::realpath(raw, env.tree.node(env.cwd).path())
            .and_then(|path| env.tree.locate(&path))
            .map_err(|e| DtshError::command(self.name(), e.to_string()))?;
        log::debug!("cd {}", env.tree.node(target).path());
        env.cwd = target;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// alias, chosen
// ---------------------------------------------------------------------------

const ALIAS_OPTIONS: [OptionSpec; 1] = [ENABLED_ONLY];

const ALIAS_NAME: ParamSpec = ParamSpec {
    name: "name",
    brief: "alias name",
    arity: Arity::Optional,
    kind: ParamKind::AliasName,
};

const CHOSEN_NAME: ParamSpec = ParamSpec {
    name: "name",
    brief: "chosen name",
    arity: Arity::Optional,
    kind: ParamKind::ChosenName,
};

/// `name -> path` lines for the entries whose name contains the filter.
fn named_nodes<'t>(
    entries: impl Iterator<Item = (&'t str, Node<'t>)>,
    args: &ParsedArgs,
) -> CommandOutput {
    let filter = args.params.first().map_or("", String::as_str);
    let enabled_only = args.flag(&ENABLED_ONLY);
    let lines = entries
        .filter(|(name, node)| name.contains(filter) && (!enabled_only || node.enabled()))
        .map(|(name, node)| format!("{name} -> {}", node.path()))
        .collect();
    CommandOutput::lines(lines)
}

struct AliasCmd;
impl Command for AliasCmd {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "list aliased nodes"
    }
    fn options(&self) -> &[OptionSpec] {
        &ALIAS_OPTIONS
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&ALIAS_NAME)
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(named_nodes(env.tree.aliases(), args))
    }
}

struct ChosenCmd;
impl Command for ChosenCmd {
    fn name(&self) -> &str {
        "chosen"
    }
    fn description(&self) -> &str {
        "list chosen nodes"
    }
    fn options(&self) -> &[OptionSpec] {
        &ALIAS_OPTIONS
    }
    fn param(&self) -> Option<&ParamSpec> {
        Some(&CHOSEN_NAME)
    }
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(named_nodes(env.tree.chosen(), args))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dtsh_model::{Devicetree, NodeAttributes, NodeId};
    use dtsh_types::ShellConfig;

    pub(crate) fn board() -> Devicetree {
        Devicetree::from_toml_str(include_str!("../../../assets/board.toml")).unwrap()
    }

    pub(crate) fn registry() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        reg
    }

    /// Run `line` at `cwd`; returns the rendered output and the new cwd.
    pub(crate) fn run_at(tree: &Devicetree, cwd: &str, line: &str) -> Result<(String, NodeId)> {
        let config = ShellConfig::default();
        let mut env = Environment {
            tree,
            cwd: tree.locate(cwd)?,
            config: &config,
        };
        let exec = registry().execute(line, &mut env)?;
        Ok((exec.output.render(), env.cwd))
    }

    pub(crate) fn run(line: &str) -> Result<String> {
        run_at(&board(), "/", line).map(|(out, _)| out)
    }

    #[test]
    fn builtins_registered() {
        let reg = registry();
        let names: Vec<&str> = reg.list_commands().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alias", "cd", "chosen", "find", "ls", "pwd", "tree"]);
    }

    #[test]
    fn pwd_prints_cwd() {
        let tree = board();
        let (out, _) = run_at(&tree, "/soc", "pwd").unwrap();
        assert_eq!(out, "/soc");
        assert!(run("pwd extra").is_err());
    }

    #[test]
    fn cd_changes_cwd() {
        let tree = board();
        let (_, cwd) = run_at(&tree, "/", "cd soc/i2c@40003000").unwrap();
        assert_eq!(tree.node(cwd).path(), "/soc/i2c@40003000");
        let (_, cwd) = run_at(&tree, "/soc/i2c@40003000", "cd ../..").unwrap();
        assert_eq!(cwd, tree.root_id());
        let (_, cwd) = run_at(&tree, "/soc", "cd").unwrap();
        assert_eq!(cwd, tree.root_id());
        let (_, cwd) = run_at(&tree, "/", "cd ..").unwrap();
        assert_eq!(cwd, tree.root_id());
    }

    #[test]
    fn cd_errors() {
        let tree = board();
        let err = run_at(&tree, "/", "cd /nope").unwrap_err();
        assert_eq!(format!("{err}"), "cd: no such node: /nope");
        let err = run_at(&tree, "/", "cd /so*").unwrap_err();
        assert!(matches!(err, DtshError::Command { .. }));
        assert!(run_at(&tree, "/", "cd /soc /leds").is_err());
    }

    #[test]
    fn alias_lists_and_filters() {
        assert_eq!(
            run("alias").unwrap(),
            "led0 -> /leds/led_0\nled1 -> /leds/led_1\nsensor -> /soc/i2c@40003000/bme680@76"
        );
        assert_eq!(run("alias led1").unwrap(), "led1 -> /leds/led_1");
        assert_eq!(run("alias nothing").unwrap(), "");
    }

    #[test]
    fn chosen_lists_and_filters() {
        let all = run("chosen").unwrap();
        assert!(all.contains("zephyr,console -> /soc/uart@40002000"));
        assert_eq!(all.lines().count(), 3);
        assert_eq!(
            run("chosen flash").unwrap(),
            "zephyr,flash -> /soc/flash-controller@4001e000/flash@0"
        );
    }

    #[test]
    fn enabled_only_skips_disabled_targets() {
        let mut b = Devicetree::builder();
        let disabled = NodeAttributes {
            status: "disabled".to_string(),
            ..NodeAttributes::default()
        };
        b.add_node(b.root_id(), "spi@0", disabled).unwrap();
        b.add_node(b.root_id(), "uart@0", NodeAttributes::default()).unwrap();
        b.add_alias("flash", "/spi@0");
        b.add_alias("serial", "/uart@0");
        let tree = b.build().unwrap();

        let (out, _) = run_at(&tree, "/", "alias").unwrap();
        assert_eq!(out.lines().count(), 2);
        let (out, _) = run_at(&tree, "/", "alias --enabled-only").unwrap();
        assert_eq!(out, "serial -> /uart@0");
    }
}
