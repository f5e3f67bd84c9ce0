//! jjdiff entrypoint: computes the change set between two trees, runs the
//! interactive hunk-level selector (or `--print`s it non-interactively),
//! and applies the confirmed selection back onto the new tree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use core_actions::{Dispatcher, Outcome};
use core_config::Config;
use core_events::EventSource;
use core_render::{draw_editor_frame, print_changes, Viewport};
use core_state::{Editor, EditorResult};
use core_terminal::{CrosstermBackend, TerminalBackend};
use jjdiff_change::{apply_changes, reverse_changes, split_changes};

/// Interactive hunk-level change selector for two working-copy trees.
#[derive(Parser, Debug)]
#[command(name = "jjdiff")]
struct Args {
    /// The unmodified tree.
    old: PathBuf,
    /// The modified tree. On confirm, only the selected changes survive here.
    new: PathBuf,
    /// Render the full computed diff to stdout and exit, skipping the
    /// interactive session.
    #[arg(long)]
    print: bool,
    /// Path to an alternate config.toml, overriding XDG discovery.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging()?;
    install_panic_hook();

    tracing::info!(target: "runtime", old = %args.old.display(), new = %args.new.display(), "startup");

    let config = core_config::load_from(args.config.clone()).context("loading config")?;
    let deprioritize = config.deprioritize_matcher();

    delete_jj_instructions(&args.new);

    let changes = jjdiff_diff::diff(&args.old, &args.new, &deprioritize)
        .with_context(|| format!("diffing {} against {}", args.old.display(), args.new.display()))?;

    if args.print {
        print_changes(&changes, &HashSet::new(), terminal_width()?);
        return Ok(());
    }

    let result = run_interactive(changes.clone(), &config)?;

    match result {
        EditorResult::Cancelled => {
            tracing::info!(target: "runtime", "cancelled");
            std::process::exit(1);
        }
        EditorResult::Confirmed(included) => {
            let (_, sel_to_new) = split_changes(&changes, &included);
            let reversed = reverse_changes(&sel_to_new, &deprioritize);
            apply_changes(&args.new, &reversed).context("applying selection to the new tree")?;
            tracing::info!(target: "runtime", applied = reversed.len(), "confirmed");
            Ok(())
        }
    }
}

/// Idempotent host handshake: some callers drop a `JJ-INSTRUCTIONS` file at
/// the top of NEW before invoking the editor; it must not appear in the
/// diff or survive into the applied result.
fn delete_jj_instructions(new_root: &Path) {
    let path = new_root.join("JJ-INSTRUCTIONS");
    match std::fs::remove_file(&path) {
        Ok(()) => tracing::debug!(target: "runtime", path = %path.display(), "removed_jj_instructions"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(target: "runtime", path = %path.display(), %err, "jj_instructions_removal_failed"),
    }
}

fn terminal_width() -> Result<usize> {
    let (width, _) = core_terminal::size().context("reading terminal size")?;
    Ok(width as usize)
}

fn run_interactive(changes: Vec<jjdiff_change::Change>, config: &Config) -> Result<EditorResult> {
    let dispatcher = Dispatcher::new(config).context("building key dispatcher from config")?;
    let mut editor = Editor::new(changes);

    let mut backend = CrosstermBackend::new();
    backend.set_title("jjdiff").context("setting terminal title")?;
    let _guard = backend.enter_guard().context("entering alternate screen")?;

    let events = EventSource::spawn().context("starting input/resize threads")?;
    let mut viewport = Viewport::new();

    loop {
        let (width, height) = core_terminal::size().context("reading terminal size")?;
        draw_editor_frame(&mut viewport, &editor, width, height).context("rendering frame")?;

        if dispatcher.dispatch(&mut editor, events.recv()) == Outcome::Exit {
            break;
        }
    }

    Ok(editor.result().cloned().unwrap_or(EditorResult::Cancelled))
}

fn configure_logging() -> Result<Option<WorkerGuard>> {
    let log_dir = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from(".local/state"))
        .join("jjdiff");
    std::fs::create_dir_all(&log_dir).with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "jjdiff.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);

    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => Ok(None),
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
