use crate::eve;
use crate::links;
use crate::store::{Scope, Store};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDocument {
    pub schema_version: u32,
    pub server: String,
    pub profile: String,
    pub exported_at: String,
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { imported: usize, total: usize },
    Failed(ImportFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImportFailure {
    #[error("file is not valid JSON")]
    BadJson,
    #[error("document has no links object")]
    NoLinks,
}

impl ImportFailure {
    pub fn reason(self) -> &'static str {
        match self {
            ImportFailure::BadJson => "bad-json",
            ImportFailure::NoLinks => "no-links",
        }
    }
}

pub fn export_links(store: &Store, scope: &Scope, dest_dir: &Path) -> Result<ExportReport> {
    let now = OffsetDateTime::now_utc();
    let document = TransferDocument {
        schema_version: SCHEMA_VERSION,
        server: scope.server.as_str().to_string(),
        profile: scope.profile.clone(),
        exported_at: now.format(&Rfc3339).context("format export timestamp")?,
        links: links::links(store, scope),
    };

    let stamp_format =
        time::macros::format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = now.format(&stamp_format).context("format export stamp")?;
    let file_name = format!("eve-links_{}_{}_{stamp}.json", document.server, document.profile);
    let path = dest_dir.join(file_name);

    let count = document.links.len();
    let raw = serde_json::to_string_pretty(&document).context("serialize link export")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(ExportReport { path, count })
}

pub fn import_links(store: &mut Store, scope: &Scope, path: &Path) -> Result<ImportOutcome> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => return Ok(ImportOutcome::Failed(ImportFailure::BadJson)),
    };
    let Some(incoming) = value.get("links").and_then(Value::as_object) else {
        return Ok(ImportOutcome::Failed(ImportFailure::NoLinks));
    };

    let mut cleaned = BTreeMap::new();
    for (character, account) in incoming {
        let Some(account) = account.as_str() else {
            continue;
        };
        if !character.starts_with(eve::CHAR_PREFIX) || !account.starts_with(eve::USER_PREFIX) {
            continue;
        }
        cleaned.insert(character.clone(), account.to_string());
    }

    let mut merged = links::links(store, scope);
    let imported = cleaned.len();
    for (character, account) in cleaned {
        merged.insert(character, account);
    }
    links::set_links(store, scope, &merged)?;
    Ok(ImportOutcome::Imported {
        imported,
        total: merged.len(),
    })
}
