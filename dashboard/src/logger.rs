//! Log sink: stdout plus one timestamped file per run in the log directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::LogSettings;

const LOG_FILE_PREFIX: &str = "tickerboard_";

pub fn setup_logging(settings: &LogSettings) -> Result<()> {
    fs::create_dir_all(&settings.dir)
        .with_context(|| format!("creating log directory {}", settings.dir.display()))?;

    // Older runs go first; the file opened below is this run's.
    prune_logs(&settings.dir, settings.keep.saturating_sub(1))?;

    let log_path = settings.dir.join(format!(
        "{LOG_FILE_PREFIX}{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    ));

    let dispatch = settings.targets.iter().fold(
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .level(settings.level),
        |dispatch, (target, level)| dispatch.level_for(target.clone(), *level),
    );

    dispatch
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_path)?)
        .apply()?;

    log::debug!("Logging to {}", log_path.display());
    Ok(())
}

/// Deletes this program's log files except the `keep` most recent ones.
/// Other files in the directory are left alone.
fn prune_logs(log_dir: &Path, keep: usize) -> Result<()> {
    let mut logs: Vec<(SystemTime, PathBuf)> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|entry| entry.path())
        .filter(|path| is_own_log(path))
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .collect();

    logs.sort_by_key(|(modified, _)| std::cmp::Reverse(*modified));

    for (_, path) in logs.iter().skip(keep) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }
    Ok(())
}

fn is_own_log(path: &Path) -> bool {
    let named_like_ours = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
    named_like_ours && path.extension().is_some_and(|ext| ext == "log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn log_at(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = fs::File::create(&path).unwrap();
        // Explicit times keep the ordering independent of timestamp granularity.
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs)).unwrap();
        path
    }

    #[test]
    fn keeps_newest_own_logs() {
        let dir = tempfile::tempdir().unwrap();
        let oldest = log_at(dir.path(), "tickerboard_1.log", 300);
        let older = log_at(dir.path(), "tickerboard_2.log", 200);
        let newest = log_at(dir.path(), "tickerboard_3.log", 100);
        let foreign = log_at(dir.path(), "other_app.log", 900);
        let storage = log_at(dir.path(), "storage.json", 900);

        prune_logs(dir.path(), 2).unwrap();

        assert!(!oldest.exists());
        assert!(older.exists());
        assert!(newest.exists());
        assert!(foreign.exists());
        assert!(storage.exists());
    }

    #[test]
    fn keep_zero_clears_own_logs() {
        let dir = tempfile::tempdir().unwrap();
        let only = log_at(dir.path(), "tickerboard_1.log", 10);
        prune_logs(dir.path(), 0).unwrap();
        assert!(!only.exists());
    }
}
