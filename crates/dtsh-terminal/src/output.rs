//! Output collaborators and command output redirection.
//!
//! Commands never write anywhere themselves: the session hands their
//! [`CommandOutput`] to an [`Output`], possibly inside a pager scope, or to a
//! [`FileOutput`] when the command line ends with a redirection.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use dtsh_types::ShellConfig;
use dtsh_types::error::{DtshError, Result};

use crate::interpreter::CommandOutput;

/// Where command results and error messages go.
pub trait Output {
    /// Write one command result.
    fn write(&mut self, output: &CommandOutput) -> Result<()>;

    /// Report an error message.
    fn write_error(&mut self, message: &str) -> Result<()>;

    /// Start paging; writes are held until [`Output::pager_exit`].
    fn pager_enter(&mut self) {}

    fn pager_exit(&mut self) {}
}

/// Pager scope guard: enters on creation, exits on drop.
pub struct PagerScope<'o> {
    output: &'o mut dyn Output,
}

impl<'o> PagerScope<'o> {
    pub fn enter(output: &'o mut dyn Output) -> Self {
        output.pager_enter();
        Self { output }
    }

    pub fn write(&mut self, output: &CommandOutput) -> Result<()> {
        self.output.write(output)
    }
}

impl Drop for PagerScope<'_> {
    fn drop(&mut self) {
        self.output.pager_exit();
    }
}

/// Something that happened to a [`BufferOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Write(String),
    Error(String),
    PagerEnter,
    PagerExit,
}

/// In-memory output, for batch runs and tests.
#[derive(Debug, Default)]
pub struct BufferOutput {
    events: Vec<OutputEvent>,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    /// Written text, errors excluded, one entry per line.
    pub fn lines(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Write(text) => Some(text.as_str()),
                _ => None,
            })
            .flat_map(str::lines)
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Output for BufferOutput {
    fn write(&mut self, output: &CommandOutput) -> Result<()> {
        if *output != CommandOutput::None {
            self.events.push(OutputEvent::Write(output.render()));
        }
        Ok(())
    }

    fn write_error(&mut self, message: &str) -> Result<()> {
        self.events.push(OutputEvent::Error(message.to_string()));
        Ok(())
    }

    fn pager_enter(&mut self) {
        self.events.push(OutputEvent::PagerEnter);
    }

    fn pager_exit(&mut self) {
        self.events.push(OutputEvent::PagerExit);
    }
}

// ---------------------------------------------------------------------------
// Redirection
// ---------------------------------------------------------------------------

/// Validated redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub path: PathBuf,
    /// `>>`: append to the file instead of truncating it.
    pub append: bool,
}

impl Redirection {
    /// Parse a `> path` or `>> path` directive, expanding `~` from `$HOME`.
    pub fn parse(spec: &str, config: &ShellConfig) -> Result<Self> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::parse_with_home(spec, config, home.as_deref())
    }

    pub fn parse_with_home(spec: &str, config: &ShellConfig, home: Option<&Path>) -> Result<Self> {
        let (append, target) = match spec.strip_prefix(">>") {
            Some(rest) => (true, rest),
            None => (false, spec.strip_prefix('>').unwrap_or(spec)),
        };
        let target = target.trim();
        if target.is_empty() {
            return Err(DtshError::Redirection(
                "don't know where to redirect the output to ?".to_string(),
            ));
        }
        if config.fs_no_spaces && target.contains(char::is_whitespace) {
            return Err(DtshError::Redirection(format!(
                "spaces not allowed in redirection: '{target}'"
            )));
        }

        let path = match (target.strip_prefix('~'), home) {
            (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
                home.join(rest.trim_start_matches('/'))
            },
            _ => PathBuf::from(target),
        };
        let exists = path.exists();
        if exists && !append && config.fs_no_overwrite {
            return Err(DtshError::Redirection(format!("file exists: '{}'", path.display())));
        }
        log::debug!("redirect to {} (append: {})", path.display(), append && exists);
        Ok(Self {
            path,
            append: append && exists,
        })
    }
}

/// Output redirected to a file.
pub struct FileOutput {
    file: File,
    path: PathBuf,
}

impl FileOutput {
    pub fn open(redirection: &Redirection) -> Result<Self> {
        let mut options = OpenOptions::new();
        if redirection.append {
            options.append(true);
        } else {
            options.write(true).create(true).truncate(true);
        }
        let file = options.open(&redirection.path).map_err(|e| {
            DtshError::Redirection(format!("{}: {e}", redirection.path.display()))
        })?;
        Ok(Self {
            file,
            path: redirection.path.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Output for FileOutput {
    fn write(&mut self, output: &CommandOutput) -> Result<()> {
        if *output == CommandOutput::None {
            return Ok(());
        }
        writeln!(self.file, "{}", output.render())?;
        Ok(())
    }

    /// Errors are not redirected.
    fn write_error(&mut self, message: &str) -> Result<()> {
        log::warn!("{}: {message}", self.path.display());
        Ok(())
    }
}
