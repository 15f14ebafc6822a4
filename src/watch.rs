use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};

use crate::convert::{Converter, Outcome};
use crate::error::ConvertError;

/// Editors often save in several steps; events arriving within this window are coalesced.
const SETTLE: Duration = Duration::from_millis(250);

/// Paths from `event` worth reconverting: creations and modifications of `target` when
/// watching a single file, otherwise of any file with extension `ext`.
fn wanted(event: &notify::Event, target: Option<&Path>, ext: &str) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any => {}
        _ => return Vec::new(),
    }
    event
        .paths
        .iter()
        .filter(|p| match target {
            Some(f) => p.as_path() == f,
            None => p.extension().is_some_and(|e| e == ext),
        })
        .cloned()
        .collect()
}

/// Collects `first` plus everything arriving until the channel stays quiet for `settle`.
fn drain_burst(rx: &Receiver<PathBuf>, first: PathBuf, settle: Duration) -> BTreeSet<PathBuf> {
    let mut pending = BTreeSet::from([first]);
    while let Ok(p) = rx.recv_timeout(settle) {
        pending.insert(p);
    }
    pending
}

/// Converts bursts of changed paths until the sender side hangs up. Returns how many
/// files were actually converted.
fn serve(conv: &Converter, rx: &Receiver<PathBuf>, settle: Duration) -> usize {
    let mut converted = 0;
    while let Ok(first) = rx.recv() {
        for p in drain_burst(rx, first, settle).into_iter().filter(|p| p.is_file()) {
            match conv.convert(&p) {
                Ok(Outcome::Converted) => converted += 1,
                Ok(Outcome::Skipped) => {}
                Err(e) => log::error!("{e}"),
            }
        }
    }
    converted
}

/// Blocks, reconverting inputs under `input` whenever they are created or modified.
/// Conversion errors are logged and the watcher keeps running.
pub fn watch(conv: &Converter, input: &Path) -> Result<(), ConvertError> {
    let input = input
        .canonicalize()
        .map_err(|e| ConvertError::read(input, e))?;
    let ext = conv.cfg.input_extension.clone();
    let single = input.is_file().then(|| input.clone());
    // Single files are watched through their directory so rename-on-save is seen.
    let root = match &single {
        Some(f) => f.parent().unwrap_or(&input).to_path_buf(),
        None => input.clone(),
    };
    let (tx, rx) = mpsc::channel::<PathBuf>();
    let target = single.clone();

    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for p in wanted(&event, target.as_deref(), &ext) {
                        let _ = tx.send(p);
                    }
                }
                Err(e) => log::warn!("watch error: {e}"),
            }
        })?;
    let mode = if single.is_some() {
        RecursiveMode::NonRecursive
    } else {
        RecursiveMode::Recursive
    };
    watcher.watch(&root, mode)?;
    log::info!("Watching {} for changes", input.display());

    serve(conv, &rx, SETTLE);
    Ok(())
}
