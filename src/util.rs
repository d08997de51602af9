use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Merge keywords from env var `var` (comma/semicolon separated) and from the file
/// named by `{var}_FILE` (one per line) into `target`.
/// Entries are trimmed; duplicates (case-insensitive) are dropped, first spelling and
/// original order kept.
pub fn merge_extra_keywords(target: &mut Vec<String>, var: &str) {
    if let Ok(s) = std::env::var(var) {
        for raw in s.split(|c: char| c == ',' || c == ';') {
            let n = raw.trim();
            if !n.is_empty() {
                target.push(n.to_string());
            }
        }
    }

    let file_var = format!("{var}_FILE");
    if let Ok(path) = std::env::var(&file_var) {
        if !path.trim().is_empty() {
            if let Ok(f) = File::open(&path) {
                let r = BufReader::new(f);
                for line in r.lines().map_while(|l| l.ok()) {
                    let n = line.trim();
                    if !n.is_empty() {
                        target.push(n.to_string());
                    }
                }
            } else {
                tracing::warn!(var = %file_var, path = %path, "keyword file is set but cannot be opened");
            }
        }
    }

    let mut seen = ahash::AHashSet::with_capacity(target.len());
    target.retain(|k| {
        let k = k.trim().to_lowercase();
        !k.is_empty() && seen.insert(k)
    });
    for k in target.iter_mut() {
        *k = k.trim().to_string();
    }
}

// -------- file ops with retry/backoff --------

/// Transient Windows errors: access denied (5), sharing/lock violation (32, 33),
/// AV block (225), device gone or not ready (433, 21), volume altered (1006),
/// device I/O error (1117), user-mapped section open (1224).
fn is_retriable_io_error(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 433 | 1006 | 1117 | 1224))
}

/// Run `op` up to `tries` times, sleeping `delay_ms * attempt` between transient failures.
fn with_backoff<T>(tries: usize, delay_ms: u64, what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::other(format!("{what} failed"))))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "open", || File::open(path))
}

pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "create", || File::create(path))
}

/// Succeeds if the file doesn't exist.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    with_backoff(tries, delay_ms, "remove", || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
    .with_context(|| format!("remove {}", path.display()))
}

/// Atomically replace `dest` with `tmp`. Falls back to copy+remove when the rename
/// keeps failing (e.g. sharing violations).
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let tries = 20usize;
    let delay_ms = 50u64;
    if with_backoff(tries, delay_ms, "rename", || fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    with_backoff(tries, delay_ms, "copy", || fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_with_backoff(tmp, tries, delay_ms)
}
