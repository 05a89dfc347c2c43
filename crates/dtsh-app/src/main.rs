//! dtsh entry point.
//!
//! `dtsh <devicetree.toml|json> [script]`: browse a devicetree interactively,
//! or run the commands of a script file and exit.

mod readline;
mod terminal;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use dtsh_model::Devicetree;
use dtsh_terminal::{CommandRegistry, ScriptInput, Session, register_builtins};
use dtsh_types::ShellConfig;
use dtsh_types::config::{self, CONFIG_FILE, HISTORY_FILE};

use readline::LineEditor;
use terminal::TerminalOutput;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (source, script) = match args.as_slice() {
        [source] => (source, None),
        [source, script] => (source, Some(script)),
        _ => bail!("usage: dtsh <devicetree.toml|json> [script]"),
    };

    let config_dir = config::config_dir();
    let config = match &config_dir {
        Some(dir) => {
            let path = dir.join(CONFIG_FILE);
            ShellConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))?
        },
        None => ShellConfig::default(),
    };
    let tree = Devicetree::load(Path::new(source))
        .with_context(|| format!("failed to load devicetree from {source}"))?;
    log::info!("loaded {} nodes from {source}", tree.len());

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    let mut session = Session::new(tree, registry, config);
    let mut output = TerminalOutput::new(&session.config().pager);

    ignore_interrupts();

    if let Some(script) = script {
        let mut input =
            ScriptInput::from_file(Path::new(script)).with_context(|| format!("failed to read script {script}"))?;
        session.run(&mut input, &mut output)?;
        return Ok(());
    }

    if session.config().banner {
        println!("dtsh ({}): a shell-like browser for devicetrees", env!("CARGO_PKG_VERSION"));
        println!("How to exit: q, or quit, or exit, or press Ctrl-D");
        println!();
    }
    let history: Option<PathBuf> = config_dir.map(|dir| dir.join(HISTORY_FILE));
    let mut editor = LineEditor::new(session.autocomplete(), session.config().history_size, history)
        .context("failed to create line editor")?;
    let outcome = session.run(&mut editor, &mut output);
    editor.save_history();
    outcome?;
    Ok(())
}

/// Keep SIGINT from killing the shell, e.g. while a pager runs.
#[cfg(unix)]
fn ignore_interrupts() {
    use nix::sys::signal::{SigHandler, Signal, signal};

    // SAFETY: installing SIG_IGN does not run any handler code.
    if let Err(e) = unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) } {
        log::warn!("failed to ignore SIGINT: {e}");
    }
}

#[cfg(not(unix))]
fn ignore_interrupts() {}
