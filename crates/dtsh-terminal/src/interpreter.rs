//! Command trait, registry, and dispatch logic.
//!
//! Supports quoted arguments and a trailing output redirection (`>`, `>>`).

use std::collections::HashMap;

use dtsh_model::{Devicetree, NodeId, PathExpansion};
use dtsh_types::ShellConfig;
use dtsh_types::error::{DtshError, Result};

use crate::options::{self, HELP, OptionSpec, PAGER, ParamSpec, ParsedArgs};
use crate::output::Redirection;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
}

impl CommandOutput {
    /// Build text output from lines; no lines means no output.
    pub fn lines(lines: Vec<String>) -> Self {
        if lines.is_empty() {
            Self::None
        } else {
            Self::Text(lines.join("\n"))
        }
    }

    /// Plain text rendering, without a trailing newline.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Table { headers, rows } => render_table(headers, rows),
            Self::None => String::new(),
        }
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i + 1 == row.len() {
                        cell.clone()
                    } else {
                        format!("{cell:<width$}", width = widths[i])
                    }
                })
                .collect();
            cells.join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// What commands may read and change while executing.
pub struct Environment<'a> {
    pub tree: &'a Devicetree,
    /// Current working branch; `cd` is the only command that changes it.
    pub cwd: NodeId,
    pub config: &'a ShellConfig,
}

impl Environment<'_> {
    /// Expand positional path parameters (`.` when there are none).
    ///
    /// Path errors are reported as failures of `command`.
    pub fn expand_paths(&self, command: &str, params: &[String]) -> Result<Vec<PathExpansion>> {
        let here = [".".to_string()];
        let raws = if params.is_empty() { &here[..] } else { params };
        raws.iter()
            .map(|raw| {
                self.tree
                    .expand_path(raw, self.cwd)
                    .map_err(|e| DtshError::command(command, e.to_string()))
            })
            .collect()
    }

    /// Display path of a node reached through `prefix`.
    pub fn pathway(&self, node: NodeId, prefix: &str) -> String {
        self.tree.pathway(node, prefix, self.cwd)
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Declared options, without the implicit help and pager flags.
    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    /// Positional parameter, if the command takes any.
    fn param(&self) -> Option<&ParamSpec> {
        None
    }

    /// Whether `--pager` is accepted.
    fn supports_pager(&self) -> bool {
        false
    }

    /// Execute the command with parsed arguments.
    fn execute(&self, args: &ParsedArgs, env: &mut Environment<'_>) -> Result<CommandOutput>;

    /// Declared options followed by the implicit ones.
    fn all_options(&self) -> Vec<OptionSpec> {
        let mut all = self.options().to_vec();
        all.push(HELP);
        if self.supports_pager() {
            all.push(PAGER);
        }
        all
    }

    fn parse_argv(&self, argv: &[String]) -> Result<ParsedArgs> {
        options::parse_argv(self.name(), &self.all_options(), self.param(), argv)
    }

    fn usage(&self) -> String {
        options::synopsis(self.name(), &self.all_options(), self.param())
    }

    fn help(&self) -> String {
        options::help_text(self.name(), self.description(), &self.all_options(), self.param())
    }
}

/// Result of dispatching one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: CommandOutput,
    /// Page the output.
    pub pager: bool,
    /// Write the output to a file instead.
    pub redirection: Option<Redirection>,
}

impl Execution {
    fn plain(output: CommandOutput) -> Self {
        Self {
            output,
            pager: false,
            redirection: None,
        }
    }
}

/// Registry of available commands with dispatch.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|cmd| cmd.as_ref())
    }

    /// Parse and execute a command line.
    ///
    /// `help` is handled here rather than by a registered command.
    pub fn execute(&self, line: &str, env: &mut Environment<'_>) -> Result<Execution> {
        let Some(cmdline) = CommandLine::parse(line)? else {
            return Ok(Execution::plain(CommandOutput::None));
        };
        log::debug!("dispatch '{}' {:?}", cmdline.name, cmdline.argv);

        let redirection = cmdline
            .redirect
            .as_deref()
            .map(|spec| Redirection::parse(spec, env.config))
            .transpose()?;

        if cmdline.name == "help" {
            let output = self.execute_help(&cmdline.argv)?;
            return Ok(Execution {
                output,
                pager: false,
                redirection,
            });
        }

        let cmd = self
            .get(&cmdline.name)
            .ok_or_else(|| DtshError::CommandNotFound(cmdline.name.clone()))?;
        let args = cmd.parse_argv(&cmdline.argv)?;
        let output = if args.help {
            CommandOutput::Text(cmd.help())
        } else {
            cmd.execute(&args, env)?
        };
        Ok(Execution {
            output,
            pager: args.pager() && redirection.is_none(),
            redirection,
        })
    }

    fn execute_help(&self, argv: &[String]) -> Result<CommandOutput> {
        match argv {
            [] => Ok(CommandOutput::Table {
                headers: vec!["COMMAND".to_string(), "DESCRIPTION".to_string()],
                rows: self
                    .list_commands()
                    .into_iter()
                    .map(|(name, desc)| vec![name.to_string(), desc.to_string()])
                    .collect(),
            }),
            [name] => match self.get(name) {
                Some(cmd) => Ok(CommandOutput::Text(cmd.help())),
                None => Err(DtshError::command("help", format!("no such command: '{name}'"))),
            },
            _ => Err(DtshError::usage("help", "too many parameters")),
        }
    }

    /// Registered commands as (name, description), sorted by name.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Command names starting with `partial`, `help` included, sorted.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .keys()
            .map(String::as_str)
            .chain(std::iter::once("help"))
            .filter(|name| name.starts_with(partial))
            .map(String::from)
            .collect();
        names.sort();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Command line: name, arguments, redirection.
// ---------------------------------------------------------------------------

/// A command line split into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub argv: Vec<String>,
    /// Redirection directive, starting with `>` or `>>`.
    pub redirect: Option<String>,
}

impl CommandLine {
    /// Split a line; `None` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let (command, redirect) = parse_redirect(line.trim());
        let mut words = tokenize(command)?.into_iter();
        let Some(name) = words.next() else {
            return match redirect {
                Some(_) => Err(DtshError::Syntax("redirection without a command".to_string())),
                None => Ok(None),
            };
        };
        Ok(Some(Self {
            name,
            argv: words.collect(),
            redirect: redirect.map(|r| r.trim().to_string()),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: handles single quotes, double quotes, and backslash escapes.
// ---------------------------------------------------------------------------

/// Tokenize a command line respecting quotes and backslash escapes.
///
/// - Single-quoted strings preserve all characters literally.
/// - Inside double quotes, a backslash escapes `"` and `\` only.
/// - Backslash escapes the next character outside of quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => match chars.next_if(|&next| next == '"' || next == '\\') {
                    Some(escaped) => current.push(escaped),
                    None => current.push('\\'),
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    pending = true;
                },
                '"' => {
                    in_double = true;
                    pending = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if pending || !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                        pending = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(DtshError::Syntax("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(DtshError::Syntax("unterminated double quote".to_string()));
    }

    if pending || !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Split the last unquoted `>` or `>>` off a command line.
///
/// Returns the command part and the redirection directive (operator
/// included).
fn parse_redirect(input: &str) -> (&str, Option<&str>) {
    let bytes = input.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;
    let mut last_redirect: Option<usize> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if in_single {
            if b == b'\'' {
                in_single = false;
            }
        } else if in_double {
            if b == b'"' {
                in_double = false;
            } else if b == b'\\' {
                i += 1;
            }
        } else {
            match b {
                b'\'' => in_single = true,
                b'"' => in_double = true,
                b'\\' => i += 1,
                b'>' => {
                    last_redirect = Some(i);
                    if bytes.get(i + 1) == Some(&b'>') {
                        i += 1;
                    }
                },
                _ => {},
            }
        }
        i += 1;
    }

    match last_redirect {
        Some(pos) => (&input[..pos], Some(&input[pos..])),
        None => (input, None),
    }
}
