//! Stage outputs: buffered writers on a temp path, promoted into place only when
//! complete, so an interrupted run never leaves a half-written file behind.

use crate::util::{create_with_backoff, remove_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CLEANED_POSTS_FILE: &str = "cleaned_posts.json";
pub const CLEANED_POSTS_JSONL_FILE: &str = "cleaned_posts.jsonl";
pub const STATISTICS_FILE: &str = "statistics.json";
pub const REPORT_FILE: &str = "report.md";

/// Temp sibling of `dest`: `.{name}.tmp` in the same directory.
pub fn tmp_path_for(dest: &Path) -> PathBuf {
    let name = dest.file_name().and_then(|s| s.to_str()).unwrap_or("out");
    dest.with_file_name(format!(".{name}.tmp"))
}

/// Buffered writer over a temp file. Nothing appears at the final path until
/// [`StagedFile::promote`].
pub struct StagedFile {
    tmp: PathBuf,
    dest: PathBuf,
    w: BufWriter<File>,
}

impl StagedFile {
    pub fn create(dest: &Path, buf_bytes: usize) -> Result<Self> {
        let tmp = tmp_path_for(dest);
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
            w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), f),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<File> {
        &mut self.w
    }

    /// Write `s` followed by `\n`.
    #[inline]
    pub fn write_line(&mut self, s: &str) -> std::io::Result<()> {
        let w = self.writer();
        w.write_all(s.as_bytes())?;
        w.write_all(b"\n")
    }

    /// Flush and sync the temp file, leaving it staged. On failure the temp file is removed.
    pub fn seal(self) -> Result<Sealed> {
        let Self { tmp, dest, mut w } = self;
        let res = w
            .flush()
            .with_context(|| format!("flush {}", tmp.display()))
            .and_then(|_| w.get_ref().sync_all().with_context(|| format!("sync {}", tmp.display())));
        if let Err(e) = res {
            drop(w);
            remove_quietly(&tmp);
            return Err(e);
        }
        Ok(Sealed { tmp, dest })
    }

    /// Drop the writer and remove the temp file.
    pub fn discard(self) -> Result<()> {
        let Self { tmp, w, .. } = self;
        drop(w);
        remove_with_backoff(&tmp, 8, 25)
    }

    /// Flush and move into place.
    pub fn promote(self) -> Result<PathBuf> {
        self.seal()?.promote()
    }
}

/// A fully written temp file waiting to be moved into place.
#[derive(Debug)]
pub struct Sealed {
    tmp: PathBuf,
    dest: PathBuf,
}

impl Sealed {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn promote(self) -> Result<PathBuf> {
        replace_file_atomic_backoff(&self.tmp, &self.dest)?;
        Ok(self.dest)
    }

    pub fn discard(self) -> Result<()> {
        remove_with_backoff(&self.tmp, 8, 25)
    }
}

fn remove_quietly(tmp: &Path) {
    if let Err(e) = remove_with_backoff(tmp, 8, 25) {
        tracing::warn!(path = %tmp.display(), error = %e, "could not remove temp file");
    }
}

/// Run `write` against a fresh staged file and seal it. Nothing is left on disk
/// when `write` fails.
fn stage_with(dest: &Path, buf_bytes: usize, write: impl FnOnce(&mut StagedFile) -> Result<()>) -> Result<Sealed> {
    let mut f = StagedFile::create(dest, buf_bytes)?;
    if let Err(e) = write(&mut f) {
        if let Err(d) = f.discard() {
            tracing::warn!(dest = %dest.display(), error = %d, "could not remove temp file");
        }
        return Err(e);
    }
    f.seal()
}

pub fn stage_json<T: Serialize + ?Sized>(dest: &Path, value: &T, pretty: bool, buf_bytes: usize) -> Result<Sealed> {
    stage_with(dest, buf_bytes, |f| {
        let res = if pretty {
            serde_json::to_writer_pretty(f.writer(), value)
        } else {
            serde_json::to_writer(f.writer(), value)
        };
        res.with_context(|| format!("serialize {}", dest.display()))?;
        f.write_line("").with_context(|| format!("write {}", dest.display()))
    })
}

/// One compact JSON value per line.
pub fn stage_jsonl<T: Serialize>(dest: &Path, items: &[T], buf_bytes: usize) -> Result<Sealed> {
    stage_with(dest, buf_bytes, |f| {
        for item in items {
            let line = serde_json::to_string(item).with_context(|| format!("serialize {}", dest.display()))?;
            f.write_line(&line).with_context(|| format!("write {}", dest.display()))?;
        }
        Ok(())
    })
}

pub fn stage_text(dest: &Path, text: &str, buf_bytes: usize) -> Result<Sealed> {
    stage_with(dest, buf_bytes, |f| {
        f.writer()
            .write_all(text.as_bytes())
            .with_context(|| format!("write {}", dest.display()))
    })
}
