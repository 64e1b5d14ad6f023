use crate::server::Server;
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const SERVER_KEY: &str = "server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub server: Server,
    pub profile: String,
}

impl Scope {
    pub fn new(server: Server, profile: impl Into<String>) -> Self {
        Scope {
            server,
            profile: profile.into(),
        }
    }

    pub fn links_key(&self) -> String {
        format!("links.{}.{}", self.server.as_str(), self.profile)
    }

    pub fn groups_key(&self) -> String {
        format!("groups.{}.{}", self.server.as_str(), self.profile)
    }

    pub fn saved_group_key(&self) -> String {
        format!("savedGroup.{}.{}", self.server.as_str(), self.profile)
    }
}

pub fn name_key(server: Server, file_id: &str) -> String {
    format!("names.{}.{file_id}", server.as_str())
}

pub fn description_key(server: Server, file_id: &str) -> String {
    format!("descriptions.{}.{file_id}", server.as_str())
}

pub fn saved_folder_key(server: Server) -> String {
    format!("savedFolder.{}", server.as_str())
}

pub fn saved_profile_key(server: Server) -> String {
    format!("savedProfile.{}", server.as_str())
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl Store {
    pub fn open_default() -> Result<Self> {
        let base = BaseDirs::new().context("resolve home dir")?;
        let data_dir = base.data_local_dir().join("podlink");
        Store::load_or_create(data_dir.join("settings.json"))
    }

    pub fn load_or_create(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read settings store")?;
            let values = serde_json::from_str(&raw).context("parse settings store")?;
            return Ok(Store { path, values });
        }

        let store = Store {
            path,
            values: BTreeMap::new(),
        };
        store.save()?;
        Ok(store)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create settings dir")?;
        }
        let raw = serde_json::to_string_pretty(&self.values).context("serialize settings store")?;
        fs::write(&self.path, raw).context("write settings store")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        self.save()
    }

    pub fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).context("serialize settings value")?;
        self.values.insert(key.to_string(), value);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.values.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.save()
    }
}
