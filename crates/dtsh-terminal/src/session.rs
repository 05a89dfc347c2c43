//! Interactive session: read a line, dispatch it, report the outcome.
//!
//! The session owns the current working branch. Command failures are
//! reported through the output and never end the session; only a quit
//! command or the end of input does, and both close it the same way.

use std::cell::Cell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use dtsh_model::{Devicetree, NodeId};
use dtsh_types::ShellConfig;
use dtsh_types::error::{DtshError, Result};

use crate::completion::Autocomplete;
use crate::interpreter::{CommandOutput, CommandRegistry, Environment};
use crate::output::{FileOutput, Output, PagerScope};

/// Source of command lines.
pub trait Input {
    /// Next line, without its terminator; [`DtshError::EndOfInput`] once
    /// exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Lines from a script, for batch mode.
#[derive(Debug, Default)]
pub struct ScriptInput {
    lines: VecDeque<String>,
}

impl ScriptInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(text.lines()))
    }
}

impl Input for ScriptInput {
    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        self.lines.pop_front().ok_or(DtshError::EndOfInput)
    }
}

/// Where the session loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    ReadingInput,
    Dispatching,
    Executing,
    Terminated,
}

const QUIT_COMMANDS: [&str; 3] = ["q", "quit", "exit"];

pub struct Session {
    tree: Rc<Devicetree>,
    registry: Rc<CommandRegistry>,
    config: ShellConfig,
    cwd: Rc<Cell<NodeId>>,
    state: SessionState,
}

impl Session {
    /// Open a session at the root of `tree`.
    pub fn new(tree: Devicetree, registry: CommandRegistry, config: ShellConfig) -> Self {
        let cwd = Rc::new(Cell::new(tree.root_id()));
        Self {
            tree: Rc::new(tree),
            registry: Rc::new(registry),
            config,
            cwd,
            state: SessionState::ReadingInput,
        }
    }

    pub fn tree(&self) -> &Devicetree {
        &self.tree
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn cwd(&self) -> NodeId {
        self.cwd.get()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Completion provider that follows this session's working branch.
    pub fn autocomplete(&self) -> Autocomplete {
        Autocomplete::new(Rc::clone(&self.tree), Rc::clone(&self.registry), Rc::clone(&self.cwd))
    }

    pub fn prompt(&self) -> String {
        self.config.prompt_for(self.tree.node(self.cwd()).path())
    }

    /// Execute one command line and write its output.
    pub fn execute(&mut self, line: &str, output: &mut dyn Output) -> Result<()> {
        self.state = SessionState::Dispatching;
        let mut env = Environment {
            tree: self.tree.as_ref(),
            cwd: self.cwd.get(),
            config: &self.config,
        };
        let exec = self.registry.execute(line, &mut env)?;
        self.cwd.set(env.cwd);

        self.state = SessionState::Executing;
        if let Some(redirection) = &exec.redirection {
            FileOutput::open(redirection)?.write(&exec.output)
        } else if exec.pager {
            PagerScope::enter(output).write(&exec.output)
        } else {
            output.write(&exec.output)
        }
    }

    /// Run until a quit command or the end of input.
    pub fn run(&mut self, input: &mut dyn Input, output: &mut dyn Output) -> Result<()> {
        loop {
            self.state = SessionState::ReadingInput;
            let line = match input.read_line(&self.prompt()) {
                Ok(line) => line,
                Err(DtshError::EndOfInput) => break,
                Err(e) => {
                    self.state = SessionState::Terminated;
                    return Err(e);
                },
            };
            let line = line.trim();
            if QUIT_COMMANDS.contains(&line) {
                break;
            }
            if let Err(e) = self.execute(line, output) {
                log::debug!("'{line}' failed: {e:?}");
                output.write_error(&error_message(&e))?;
            }
        }
        self.close(output)
    }

    fn close(&mut self, output: &mut dyn Output) -> Result<()> {
        self.state = SessionState::Terminated;
        output.write(&CommandOutput::Text("bye.".to_string()))
    }
}

/// User-facing message for a failed command line.
pub fn error_message(err: &DtshError) -> String {
    match err {
        DtshError::Usage { .. } | DtshError::Command { .. } => err.to_string(),
        _ => format!("dtsh: {err}"),
    }
}
