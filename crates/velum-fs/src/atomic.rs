//! Atomic file replacement: write a sibling temp file, then rename over
//! the target, so a failed write never truncates an existing file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace the contents of `target` with `data`.
///
/// The temp file lives in the target's directory so the final rename
/// stays on one filesystem.
pub fn write_atomic(target: &Path, data: &[u8]) -> io::Result<()> {
    let parent = target.parent().filter(|p| !p.as_os_str().is_empty()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "target path has no parent directory",
        )
    })?;

    let tmp_path = tmp_path(parent, target);
    let mut tmp = File::create(&tmp_path)?;

    let written = tmp.write_all(data).and_then(|_| tmp.sync_all());
    if let Err(err) = written {
        drop(tmp);
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(tmp);

    if let Err(err) = fs::rename(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    Ok(())
}

fn tmp_path(parent: &Path, target: &Path) -> PathBuf {
    let base = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("velum-write");
    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(".{base}.tmp-{}-{counter}", std::process::id()))
}
