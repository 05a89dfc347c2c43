//! Terminal output: standard streams, with paging through an external pager.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use dtsh_terminal::{CommandOutput, Output};
use dtsh_types::error::Result;

/// Writes results to stdout and errors to stderr.
///
/// While the pager is active, output is held back and piped to the pager
/// command on exit. If the pager cannot run, the text goes to stdout.
pub struct TerminalOutput {
    pager: String,
    paging: bool,
    held: String,
}

impl TerminalOutput {
    pub fn new(pager: &str) -> Self {
        Self {
            pager: pager.to_string(),
            paging: false,
            held: String::new(),
        }
    }

    fn page(&self, text: &str) -> io::Result<()> {
        let mut words = self.pager.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no pager configured"))?;
        let mut child = Command::new(program).args(words).stdin(Stdio::piped()).spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // The user may quit the pager before reading everything.
            match stdin.write_all(text.as_bytes()) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                _ => {},
            }
        }
        child.wait()?;
        Ok(())
    }
}

impl Output for TerminalOutput {
    fn write(&mut self, output: &CommandOutput) -> Result<()> {
        if *output == CommandOutput::None {
            return Ok(());
        }
        let text = output.render();
        if self.paging {
            self.held.push_str(&text);
            self.held.push('\n');
        } else {
            writeln!(io::stdout().lock(), "{text}")?;
        }
        Ok(())
    }

    fn write_error(&mut self, message: &str) -> Result<()> {
        writeln!(io::stderr().lock(), "{message}")?;
        Ok(())
    }

    fn pager_enter(&mut self) {
        self.paging = true;
    }

    fn pager_exit(&mut self) {
        self.paging = false;
        let text = std::mem::take(&mut self.held);
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.page(&text) {
            log::warn!("pager '{}' failed: {e}", self.pager);
            print!("{text}");
        }
    }
}
