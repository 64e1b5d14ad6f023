use crate::eve;
use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct BackupReport {
    pub path: PathBuf,
    pub file_count: usize,
}

pub fn create_backup(profile_dir: &Path) -> Result<BackupReport> {
    if !profile_dir.is_dir() {
        bail!("settings profile not found: {}", profile_dir.display());
    }

    let stamp_format = time::macros::format_description!("[year]-[month]-[day]-[hour]-[minute]");
    let stamp = OffsetDateTime::now_utc()
        .format(&stamp_format)
        .context("format backup stamp")?;
    let backup_dir = profile_dir.join(format!("Backup_{stamp}"));
    fs::create_dir_all(&backup_dir).context("create backup dir")?;

    let mut file_count = 0usize;
    for entry in WalkDir::new(profile_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path
            .extension()
            .map_or(true, |ext| ext != eve::SETTINGS_EXT)
        {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        fs::copy(path, backup_dir.join(file_name))
            .with_context(|| format!("copy {}", path.display()))?;
        file_count += 1;
    }

    Ok(BackupReport {
        path: backup_dir,
        file_count,
    })
}
