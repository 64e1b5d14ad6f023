use crate::server::Server;
use crate::store::{self, Store};
use anyhow::Result;
use serde::Deserialize;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    sync::mpsc,
    thread,
    time::Duration,
};

pub const DEFAULT_WORKERS: usize = 4;
const USER_AGENT: &str = "podlink";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameLookup {
    pub file_id: String,
    pub character_id: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedName {
    pub file_id: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct NameReport {
    pub resolved: Vec<ResolvedName>,
    pub unresolved: usize,
}

#[derive(Debug, Deserialize)]
struct CharacterInfo {
    name: String,
}

pub fn resolve_missing(
    store: &mut Store,
    server: Server,
    lookups: &[NameLookup],
    workers: usize,
) -> Result<NameReport> {
    if lookups.is_empty() || !server.supports_name_lookup() {
        return Ok(NameReport::default());
    }

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(10))
        .timeout_write(Duration::from_secs(10))
        .build();
    let names = map_limit(lookups, workers, |lookup| {
        fetch_name(&agent, server, &lookup.character_id)
    });

    let mut report = NameReport::default();
    for (lookup, name) in lookups.iter().zip(names) {
        match name {
            Some(name) => {
                store.set_string(&store::name_key(server, &lookup.file_id), &name)?;
                report.resolved.push(ResolvedName {
                    file_id: lookup.file_id.clone(),
                    name,
                });
            }
            None => report.unresolved += 1,
        }
    }
    Ok(report)
}

fn fetch_name(agent: &ureq::Agent, server: Server, character_id: &str) -> Option<String> {
    let url = server.character_endpoint(character_id)?;
    let response = agent.get(&url).set("User-Agent", USER_AGENT).call().ok()?;
    let info: CharacterInfo = response.into_json().ok()?;
    let name = info.name.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

pub fn map_limit<T, R, F>(items: &[T], limit: usize, job: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let width = limit.max(1).min(items.len());
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        for _ in 0..width {
            let tx = tx.clone();
            let next = &next;
            let job = &job;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }
                let _ = tx.send((index, job(&items[index])));
            });
        }
    });
    drop(tx);

    let mut results: Vec<(usize, R)> = rx.into_iter().collect();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, value)| value).collect()
}
