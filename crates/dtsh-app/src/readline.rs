//! Line editor input: history and tab completion through rustyline.

use std::io;
use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Context, Editor, Helper};

use dtsh_terminal::{Autocomplete, Input};
use dtsh_types::error::{DtshError, Result};

/// Completion glue between rustyline and the session.
pub struct DtshHelper {
    autocomplete: Autocomplete,
}

impl Helper for DtshHelper {}

impl rustyline::highlight::Highlighter for DtshHelper {}

impl rustyline::hint::Hinter for DtshHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl rustyline::validate::Validator for DtshHelper {}

impl Completer for DtshHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let completion = self.autocomplete.complete(line, pos);
        let pairs = completion
            .candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((completion.start, pairs))
    }
}

/// Interactive input with persistent history.
pub struct LineEditor {
    editor: Editor<DtshHelper, DefaultHistory>,
    history: Option<PathBuf>,
}

impl LineEditor {
    pub fn new(autocomplete: Autocomplete, history_size: usize, history: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = Config::builder().max_history_size(history_size)?.build();
        let mut editor: Editor<DtshHelper, DefaultHistory> = Editor::with_config(config)?;
        editor.set_helper(Some(DtshHelper { autocomplete }));

        if let Some(path) = &history
            && let Err(e) = editor.load_history(path)
        {
            // Expected on first run.
            let not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound);
            if !not_found {
                log::warn!("failed to load history: {e}");
            }
        }
        Ok(Self { editor, history })
    }

    /// Save history to disk.
    pub fn save_history(&mut self) {
        let Some(path) = &self.history else {
            return;
        };
        if let Some(dir) = path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            log::warn!("failed to create history directory: {e}");
            return;
        }
        if let Err(e) = self.editor.save_history(path) {
            log::warn!("failed to save history: {e}");
        }
    }
}

impl Input for LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(e) = self.editor.add_history_entry(line.as_str())
                {
                    log::warn!("failed to add history entry: {e}");
                }
                Ok(line)
            },
            // Ctrl-C abandons the current line.
            Err(ReadlineError::Interrupted) => Ok(String::new()),
            Err(ReadlineError::Eof) => Err(DtshError::EndOfInput),
            Err(ReadlineError::Io(e)) => Err(DtshError::Io(e)),
            Err(e) => Err(DtshError::Io(io::Error::other(e.to_string()))),
        }
    }
}
