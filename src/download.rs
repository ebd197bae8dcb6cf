use anyhow::Result;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Write a downloaded attachment into `dir` and return the path used.
///
/// Only the final component of `filename` is kept, so a hostile name cannot
/// escape `dir`. An existing file is never overwritten: `report.pdf` becomes
/// `report (1).pdf`, `report (2).pdf`, ...
pub fn save_attachment(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let name = safe_file_name(filename);

    for n in 0u32.. {
        let path = dir.join(numbered(&name, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => {
                fill(&path, f, bytes)?;
                info!("saved {} bytes to {}", bytes.len(), path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!("u32 range exhausted")
}

/// Write `bytes` to the freshly created `path`. A short write leaves no
/// truncated file behind.
fn fill(path: &Path, mut out: impl Write, bytes: &[u8]) -> Result<()> {
    if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
        drop(out);
        if let Err(rm) = fs::remove_file(path) {
            warn!("could not remove partial {}: {rm}", path.display());
        }
        return Err(e.into());
    }
    Ok(())
}

fn safe_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        "attachment".to_string()
    } else {
        base.to_string()
    }
}

fn numbered(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({n})"),
    }
}
