use crate::inventory::{AccountFile, CharacterFile, Inventory};
use crate::store::{Scope, Store};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_AUTO_LINK_WINDOW_MS: i64 = 10_000;

pub fn links(store: &Store, scope: &Scope) -> BTreeMap<String, String> {
    store.read_json(&scope.links_key()).unwrap_or_default()
}

pub fn set_links(store: &mut Store, scope: &Scope, links: &BTreeMap<String, String>) -> Result<()> {
    store.write_json(&scope.links_key(), links)
}

pub fn link(store: &mut Store, scope: &Scope, character: &str, account: &str) -> Result<()> {
    let mut map = links(store, scope);
    map.insert(character.to_string(), account.to_string());
    set_links(store, scope, &map)
}

pub fn unlink(store: &mut Store, scope: &Scope, character: &str) -> Result<bool> {
    let mut map = links(store, scope);
    if map.remove(character).is_none() {
        return Ok(false);
    }
    set_links(store, scope, &map)?;
    Ok(true)
}

pub fn linked_account<'a>(links: &'a BTreeMap<String, String>, character: &str) -> Option<&'a str> {
    links.get(character).map(String::as_str)
}

pub fn linked_characters(
    links: &BTreeMap<String, String>,
    characters: &BTreeMap<String, CharacterFile>,
    account: &str,
) -> Vec<String> {
    let mut linked: Vec<String> = links
        .iter()
        .filter(|(_, acct)| acct.as_str() == account)
        .map(|(character, _)| character.clone())
        .collect();
    linked.sort_by_key(|character| {
        std::cmp::Reverse(characters.get(character).map_or(0, |c| c.mtime_ms))
    });
    linked
}

pub fn prune_dangling(store: &mut Store, scope: &Scope, inventory: &Inventory) -> Result<usize> {
    let mut map = links(store, scope);
    let before = map.len();
    map.retain(|character, account| {
        inventory.characters.contains_key(character) && inventory.accounts.contains_key(account)
    });
    let removed = before - map.len();
    if removed > 0 {
        set_links(store, scope, &map)?;
    }
    Ok(removed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreshAccount {
    pub file_id: String,
    pub account_id: String,
    pub age_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoLinkOutcome {
    Linked {
        character: String,
        account: String,
        account_id: String,
    },
    NoCharacterSelected,
    NoneFresh,
    MultipleFresh {
        candidates: Vec<FreshAccount>,
    },
}

impl AutoLinkOutcome {
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AutoLinkOutcome::Linked { .. } => None,
            AutoLinkOutcome::NoCharacterSelected => Some("no-character-selected"),
            AutoLinkOutcome::NoneFresh => Some("none-fresh"),
            AutoLinkOutcome::MultipleFresh { .. } => Some("multiple-fresh"),
        }
    }
}

pub fn fresh_accounts(
    accounts: &BTreeMap<String, AccountFile>,
    window_ms: i64,
    now_ms: i64,
) -> Vec<FreshAccount> {
    let mut fresh: Vec<FreshAccount> = accounts
        .values()
        .map(|account| FreshAccount {
            file_id: account.file_id.clone(),
            account_id: account.account_id.clone(),
            age_ms: now_ms - account.mtime_ms,
        })
        .filter(|candidate| candidate.age_ms >= 0 && candidate.age_ms < window_ms)
        .collect();
    fresh.sort_by_key(|candidate| candidate.age_ms);
    fresh
}

pub fn auto_link(
    store: &mut Store,
    scope: &Scope,
    character: Option<&str>,
    inventory: &Inventory,
    window_ms: i64,
    now_ms: i64,
) -> Result<AutoLinkOutcome> {
    let Some(character) = character.filter(|id| inventory.characters.contains_key(*id)) else {
        return Ok(AutoLinkOutcome::NoCharacterSelected);
    };

    let mut fresh = fresh_accounts(&inventory.accounts, window_ms, now_ms);
    match fresh.len() {
        0 => Ok(AutoLinkOutcome::NoneFresh),
        1 => {
            let candidate = fresh.remove(0);
            link(store, scope, character, &candidate.file_id)?;
            Ok(AutoLinkOutcome::Linked {
                character: character.to_string(),
                account: candidate.file_id,
                account_id: candidate.account_id,
            })
        }
        _ => Ok(AutoLinkOutcome::MultipleFresh { candidates: fresh }),
    }
}
