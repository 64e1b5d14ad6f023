use crate::server::Server;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CHAR_PREFIX: &str = "core_char_";
pub const USER_PREFIX: &str = "core_user_";
pub const SETTINGS_EXT: &str = "dat";
pub const PROFILE_PREFIX: &str = "settings_";
pub const DEFAULT_PROFILE: &str = "settings_Default";
const STEAM_APP_ID: &str = "8500";

pub fn settings_path(profile_dir: &Path, file_id: &str) -> PathBuf {
    profile_dir.join(format!("{file_id}.{SETTINGS_EXT}"))
}

pub fn settings_stem(file_name: &str) -> Option<&str> {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    if !file_name.ends_with(".dat") {
        return None;
    }
    if !stem.starts_with(CHAR_PREFIX) && !stem.starts_with(USER_PREFIX) {
        return None;
    }
    // Trailing markers belong to cache copies the client keeps next to live files.
    if stem.ends_with('_') || stem.ends_with(')') {
        return None;
    }
    Some(stem)
}

pub fn numeric_id(stem: &str) -> &str {
    stem.rsplit('_').next().unwrap_or(stem)
}

pub fn detect_settings_roots(server: Server) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for base in ccp_data_dirs() {
        let Ok(entries) = fs::read_dir(&base) else {
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if entry
                .file_name()
                .to_string_lossy()
                .contains(server.as_str())
            {
                roots.push(path);
            }
        }
    }
    roots.sort();
    roots
}

fn ccp_data_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs_home() {
        candidates.push(
            home.join(".local/share/Steam/steamapps/compatdata")
                .join(STEAM_APP_ID)
                .join("pfx/drive_c/users/steamuser/AppData/Local/CCP/EVE"),
        );
        candidates.push(
            home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam/steamapps/compatdata")
                .join(STEAM_APP_ID)
                .join("pfx/drive_c/users/steamuser/AppData/Local/CCP/EVE"),
        );
    }
    candidates.into_iter().filter(|path| path.is_dir()).collect()
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

pub fn find_profiles(settings_root: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(settings_root) else {
        return Vec::new();
    };
    let mut profiles: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            name.starts_with(PROFILE_PREFIX).then_some(name)
        })
        .collect();
    profiles.sort();
    profiles
}

pub fn looks_like_settings_root(path: &Path) -> bool {
    path.is_dir() && !find_profiles(path).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn accepts_live_settings_files() {
        assert_eq!(
            settings_stem("core_char_91132137.dat"),
            Some("core_char_91132137")
        );
        assert_eq!(settings_stem("core_user_8421.dat"), Some("core_user_8421"));
        assert_eq!(
            settings_stem("core_char_1_100.dat"),
            Some("core_char_1_100")
        );
    }

    #[test]
    fn rejects_cache_and_foreign_files() {
        assert_eq!(settings_stem("core_char_91132137.bak"), None);
        assert_eq!(settings_stem("core_char_91132137_.dat"), None);
        assert_eq!(settings_stem("core_char_91132137 (1).dat"), None);
        assert_eq!(settings_stem("prefs.ini"), None);
        assert_eq!(settings_stem("core_public__.dat"), None);
    }

    #[test]
    fn numeric_id_takes_the_trailing_segment() {
        assert_eq!(numeric_id("core_char_91132137"), "91132137");
        assert_eq!(numeric_id("core_user_8421"), "8421");
        assert_eq!(numeric_id("core_char_1_100"), "100");
    }

    #[test]
    fn finds_profile_dirs_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("settings_Default")).unwrap();
        fs::create_dir(dir.path().join("settings_Alt")).unwrap();
        fs::create_dir(dir.path().join("cache")).unwrap();
        fs::write(dir.path().join("settings_notes.txt"), "x").unwrap();

        let profiles = find_profiles(dir.path());
        assert_eq!(profiles, vec!["settings_Alt", "settings_Default"]);
        assert!(looks_like_settings_root(dir.path()));
    }

    #[test]
    fn empty_root_is_not_a_settings_root() {
        let dir = TempDir::new().unwrap();
        assert!(!looks_like_settings_root(dir.path()));
        assert!(find_profiles(&dir.path().join("missing")).is_empty());
    }
}
