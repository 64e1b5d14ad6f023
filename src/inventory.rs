use crate::eve;
use crate::names::{self, NameLookup, NameReport};
use crate::server::Server;
use crate::store::{self, Store};
use anyhow::{bail, Result};
use filetime::FileTime;
use std::{collections::BTreeMap, fs, path::Path};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct CharacterFile {
    pub file_id: String,
    pub character_id: String,
    pub mtime_ms: i64,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountFile {
    pub file_id: String,
    pub account_id: String,
    pub mtime_ms: i64,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct Inventory {
    pub characters: BTreeMap<String, CharacterFile>,
    pub accounts: BTreeMap<String, AccountFile>,
    pub pending_lookups: Vec<NameLookup>,
}

pub fn scan(profile_dir: &Path, server: Server, store: &Store) -> Result<Inventory> {
    if !profile_dir.is_dir() {
        bail!("settings profile not found: {}", profile_dir.display());
    }

    let mut inventory = Inventory::default();
    for entry in WalkDir::new(profile_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(stem) = eve::settings_stem(&file_name) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        let mtime_ms = file_mtime_ms(&metadata);
        let file_id = stem.to_string();
        let description = store.get_string(&store::description_key(server, &file_id));

        if stem.starts_with(eve::CHAR_PREFIX) {
            let character_id = eve::numeric_id(stem).to_string();
            let name = store.get_string(&store::name_key(server, &file_id));
            if name.is_none() && server.supports_name_lookup() {
                inventory.pending_lookups.push(NameLookup {
                    file_id: file_id.clone(),
                    character_id: character_id.clone(),
                });
            }
            inventory.characters.insert(
                file_id.clone(),
                CharacterFile {
                    file_id,
                    character_id,
                    mtime_ms,
                    name,
                    description,
                },
            );
        } else {
            let account_id = eve::numeric_id(stem).to_string();
            inventory.accounts.insert(
                file_id.clone(),
                AccountFile {
                    file_id,
                    account_id,
                    mtime_ms,
                    description,
                },
            );
        }
    }
    Ok(inventory)
}

pub fn scan_and_resolve(
    profile_dir: &Path,
    server: Server,
    store: &mut Store,
    offline: bool,
) -> Result<(Inventory, NameReport)> {
    let mut inventory = scan(profile_dir, server, store)?;
    if offline || inventory.pending_lookups.is_empty() {
        return Ok((inventory, NameReport::default()));
    }

    let report = names::resolve_missing(
        store,
        server,
        &inventory.pending_lookups,
        names::DEFAULT_WORKERS,
    )?;
    for resolved in &report.resolved {
        if let Some(character) = inventory.characters.get_mut(&resolved.file_id) {
            character.name = Some(resolved.name.clone());
        }
    }
    inventory
        .pending_lookups
        .retain(|lookup| !report.resolved.iter().any(|r| r.file_id == lookup.file_id));
    Ok((inventory, report))
}

fn file_mtime_ms(metadata: &fs::Metadata) -> i64 {
    let mtime = FileTime::from_last_modification_time(metadata);
    mtime.unix_seconds() * 1000 + i64::from(mtime.nanoseconds() / 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use filetime::set_file_mtime;
    use tempfile::TempDir;

    fn empty_store(dir: &TempDir) -> Store {
        Store::load_or_create(dir.path().join("settings.json")).unwrap()
    }

    #[test]
    fn splits_characters_from_accounts() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("settings_Default");
        fs::create_dir(&profile).unwrap();
        fs::write(profile.join("core_char_100.dat"), b"c").unwrap();
        fs::write(profile.join("core_char_200.dat"), b"c").unwrap();
        fs::write(profile.join("core_user_900.dat"), b"u").unwrap();

        let store = empty_store(&dir);
        let inventory = scan(&profile, Server::Singularity, &store).unwrap();
        assert_eq!(inventory.characters.len(), 2);
        assert_eq!(inventory.accounts.len(), 1);
        assert!(inventory.characters.contains_key("core_char_100"));
        assert_eq!(
            inventory.accounts["core_user_900"].account_id,
            "900"
        );
    }

    #[test]
    fn skips_cache_copies_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("settings_Default");
        fs::create_dir(&profile).unwrap();
        fs::write(profile.join("core_char_100.dat"), b"c").unwrap();
        fs::write(profile.join("core_char_100_.dat"), b"c").unwrap();
        fs::write(profile.join("core_char_100 (1).dat"), b"c").unwrap();
        fs::write(profile.join("core_char_100.dat.bak"), b"c").unwrap();
        fs::write(profile.join("prefs.ini"), b"x").unwrap();
        fs::create_dir(profile.join("core_user_1.dat")).unwrap();

        let store = empty_store(&dir);
        let inventory = scan(&profile, Server::Singularity, &store).unwrap();
        assert_eq!(inventory.characters.len(), 1);
        assert!(inventory.accounts.is_empty());
    }

    #[test]
    fn cached_names_and_descriptions_come_from_the_store() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("settings_Default");
        fs::create_dir(&profile).unwrap();
        fs::write(profile.join("core_char_100.dat"), b"c").unwrap();
        fs::write(profile.join("core_char_200.dat"), b"c").unwrap();

        let mut store = empty_store(&dir);
        store
            .set_string("names.tranquility.core_char_100", "Arya Blackwood")
            .unwrap();
        store
            .set_string("descriptions.tranquility.core_char_100", "main")
            .unwrap();

        let inventory = scan(&profile, Server::Tranquility, &store).unwrap();
        let known = &inventory.characters["core_char_100"];
        assert_eq!(known.name.as_deref(), Some("Arya Blackwood"));
        assert_eq!(known.description.as_deref(), Some("main"));

        let unknown = &inventory.characters["core_char_200"];
        assert!(unknown.name.is_none());
        assert_eq!(
            inventory.pending_lookups,
            vec![NameLookup {
                file_id: "core_char_200".to_string(),
                character_id: "200".to_string(),
            }]
        );
    }

    #[test]
    fn no_lookups_are_queued_for_unsupported_servers() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("settings_Default");
        fs::create_dir(&profile).unwrap();
        fs::write(profile.join("core_char_100.dat"), b"c").unwrap();

        let store = empty_store(&dir);
        let inventory = scan(&profile, Server::Thunderdome, &store).unwrap();
        assert!(inventory.pending_lookups.is_empty());
        assert!(inventory.characters["core_char_100"].name.is_none());
    }

    #[test]
    fn records_modification_times_in_millis() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("settings_Default");
        fs::create_dir(&profile).unwrap();
        let path = profile.join("core_user_900.dat");
        fs::write(&path, b"u").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 250_000_000)).unwrap();

        let store = empty_store(&dir);
        let inventory = scan(&profile, Server::Singularity, &store).unwrap();
        assert_eq!(
            inventory.accounts["core_user_900"].mtime_ms,
            1_700_000_000_250
        );
    }

    #[test]
    fn missing_profile_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);
        let missing = dir.path().join("settings_Gone");
        assert!(scan(&missing, Server::Singularity, &store).is_err());
    }
}
