use crate::store::{Scope, Store};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ALL_GROUPS_ID: &str = "all";
pub const DEFAULT_GROUP_NAME: &str = "New Group";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub template: Option<String>,
}

impl Group {
    pub fn clean_members(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for member in &self.members {
            let member = member.trim();
            if member.is_empty() || seen.iter().any(|known: &String| known == member) {
                continue;
            }
            seen.push(member.to_string());
        }
        seen
    }

    pub fn template_member(&self) -> Option<&str> {
        self.template
            .as_deref()
            .map(str::trim)
            .filter(|template| !template.is_empty())
    }

    pub fn display_name(&self, group_id: &str) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            group_id.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

pub fn groups(store: &Store, scope: &Scope) -> BTreeMap<String, Group> {
    store.read_json(&scope.groups_key()).unwrap_or_default()
}

pub fn set_groups(store: &mut Store, scope: &Scope, groups: &BTreeMap<String, Group>) -> Result<()> {
    store.write_json(&scope.groups_key(), groups)
}

pub fn create_group(store: &mut Store, scope: &Scope, name: &str) -> Result<String> {
    let mut map = groups(store, scope);
    let group_id = next_group_id(&map, now_ms());
    let trimmed = name.trim();
    let name = if trimmed.is_empty() {
        DEFAULT_GROUP_NAME.to_string()
    } else {
        trimmed.to_string()
    };
    map.insert(
        group_id.clone(),
        Group {
            name,
            members: Vec::new(),
            template: None,
        },
    );
    set_groups(store, scope, &map)?;
    Ok(group_id)
}

fn next_group_id(existing: &BTreeMap<String, Group>, now_ms: i64) -> String {
    let mut stamp = now_ms;
    loop {
        let group_id = format!("g_{stamp}");
        if !existing.contains_key(&group_id) {
            return group_id;
        }
        stamp += 1;
    }
}

pub fn delete_group(store: &mut Store, scope: &Scope, group_id: &str) -> Result<bool> {
    if group_id.is_empty() || group_id == ALL_GROUPS_ID {
        return Ok(false);
    }
    let mut map = groups(store, scope);
    if map.remove(group_id).is_none() {
        return Ok(false);
    }
    set_groups(store, scope, &map)?;
    Ok(true)
}

pub fn add_member(store: &mut Store, scope: &Scope, group_id: &str, character: &str) -> Result<bool> {
    if group_id.is_empty() || group_id == ALL_GROUPS_ID || character.is_empty() {
        return Ok(false);
    }
    let mut map = groups(store, scope);
    let Some(group) = map.get_mut(group_id) else {
        return Ok(false);
    };
    insert_member(group, character);
    set_groups(store, scope, &map)?;
    Ok(true)
}

pub fn remove_member(
    store: &mut Store,
    scope: &Scope,
    group_id: &str,
    character: &str,
) -> Result<bool> {
    if group_id.is_empty() || group_id == ALL_GROUPS_ID || character.is_empty() {
        return Ok(false);
    }
    let mut map = groups(store, scope);
    let Some(group) = map.get_mut(group_id) else {
        return Ok(false);
    };
    group.members = group
        .clean_members()
        .into_iter()
        .filter(|member| member != character)
        .collect();
    if group.template_member() == Some(character) {
        group.template = None;
    }
    set_groups(store, scope, &map)?;
    Ok(true)
}

pub fn set_template(
    store: &mut Store,
    scope: &Scope,
    group_id: &str,
    character: &str,
) -> Result<bool> {
    if group_id.is_empty() || group_id == ALL_GROUPS_ID || character.is_empty() {
        return Ok(false);
    }
    let mut map = groups(store, scope);
    let Some(group) = map.get_mut(group_id) else {
        return Ok(false);
    };
    insert_member(group, character);
    group.template = Some(character.to_string());
    set_groups(store, scope, &map)?;
    Ok(true)
}

fn insert_member(group: &mut Group, character: &str) {
    let mut members = group.clean_members();
    if !members.iter().any(|member| member == character) {
        members.push(character.to_string());
    }
    group.members = members;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTag {
    pub name: String,
    pub is_template: bool,
}

pub fn membership_index(groups: &BTreeMap<String, Group>) -> BTreeMap<String, Vec<GroupTag>> {
    let mut index: BTreeMap<String, Vec<GroupTag>> = BTreeMap::new();
    for (group_id, group) in groups {
        let name = group.display_name(group_id);
        let template = group.template_member();
        for member in group.clean_members() {
            let is_template = template == Some(member.as_str());
            index.entry(member).or_default().push(GroupTag {
                name: name.clone(),
                is_template,
            });
        }
    }
    index
}

fn now_ms() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    elapsed.as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> Store {
        Store::load_or_create(dir.path().join("settings.json")).unwrap()
    }

    fn scope() -> Scope {
        Scope::new(Server::Tranquility, "settings_Default")
    }

    #[test]
    fn blank_names_fall_back_to_the_default() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();

        let group_id = create_group(&mut store, &scope, "   ").unwrap();
        assert!(group_id.starts_with("g_"));
        let map = groups(&store, &scope);
        assert_eq!(map[&group_id].name, DEFAULT_GROUP_NAME);

        let named = create_group(&mut store, &scope, "  Raiders  ").unwrap();
        assert_eq!(groups(&store, &scope)[&named].name, "Raiders");
    }

    #[test]
    fn colliding_ids_are_bumped_until_free() {
        let mut existing = BTreeMap::new();
        existing.insert("g_1000".to_string(), Group::default());
        existing.insert("g_1001".to_string(), Group::default());
        assert_eq!(next_group_id(&existing, 1000), "g_1002");
        assert_eq!(next_group_id(&existing, 500), "g_500");
    }

    #[test]
    fn the_all_group_cannot_be_deleted() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        assert!(!delete_group(&mut store, &scope, ALL_GROUPS_ID).unwrap());
        assert!(!delete_group(&mut store, &scope, "").unwrap());
        assert!(!delete_group(&mut store, &scope, "g_missing").unwrap());

        let group_id = create_group(&mut store, &scope, "Raiders").unwrap();
        assert!(delete_group(&mut store, &scope, &group_id).unwrap());
        assert!(groups(&store, &scope).is_empty());
    }

    #[test]
    fn the_all_group_cannot_be_mutated() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        let mut map = BTreeMap::new();
        map.insert(
            ALL_GROUPS_ID.to_string(),
            Group {
                name: "All".to_string(),
                members: vec!["core_char_1".to_string()],
                template: None,
            },
        );
        set_groups(&mut store, &scope, &map).unwrap();

        assert!(!add_member(&mut store, &scope, ALL_GROUPS_ID, "core_char_2").unwrap());
        assert!(!remove_member(&mut store, &scope, ALL_GROUPS_ID, "core_char_1").unwrap());
        assert!(!set_template(&mut store, &scope, ALL_GROUPS_ID, "core_char_1").unwrap());

        let group = &groups(&store, &scope)[ALL_GROUPS_ID];
        assert_eq!(group.members, vec!["core_char_1"]);
        assert!(group.template.is_none());
    }

    #[test]
    fn members_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        let group_id = create_group(&mut store, &scope, "Raiders").unwrap();

        assert!(add_member(&mut store, &scope, &group_id, "core_char_1").unwrap());
        assert!(add_member(&mut store, &scope, &group_id, "core_char_1").unwrap());
        assert!(add_member(&mut store, &scope, &group_id, "core_char_2").unwrap());
        assert!(!add_member(&mut store, &scope, "g_missing", "core_char_1").unwrap());

        let map = groups(&store, &scope);
        assert_eq!(map[&group_id].members, vec!["core_char_1", "core_char_2"]);
    }

    #[test]
    fn removing_the_template_member_clears_the_template() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        let group_id = create_group(&mut store, &scope, "Raiders").unwrap();
        add_member(&mut store, &scope, &group_id, "core_char_1").unwrap();
        set_template(&mut store, &scope, &group_id, "core_char_1").unwrap();

        assert!(remove_member(&mut store, &scope, &group_id, "core_char_1").unwrap());
        let group = &groups(&store, &scope)[&group_id];
        assert!(group.members.is_empty());
        assert!(group.template.is_none());
    }

    #[test]
    fn removing_a_plain_member_keeps_the_template() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        let group_id = create_group(&mut store, &scope, "Raiders").unwrap();
        set_template(&mut store, &scope, &group_id, "core_char_1").unwrap();
        add_member(&mut store, &scope, &group_id, "core_char_2").unwrap();

        assert!(remove_member(&mut store, &scope, &group_id, "core_char_2").unwrap());
        let group = &groups(&store, &scope)[&group_id];
        assert_eq!(group.members, vec!["core_char_1"]);
        assert_eq!(group.template.as_deref(), Some("core_char_1"));
    }

    #[test]
    fn setting_a_template_adds_it_as_a_member() {
        let dir = TempDir::new().unwrap();
        let mut store = test_store(&dir);
        let scope = scope();
        let group_id = create_group(&mut store, &scope, "Raiders").unwrap();

        assert!(set_template(&mut store, &scope, &group_id, "core_char_7").unwrap());
        let group = &groups(&store, &scope)[&group_id];
        assert_eq!(group.members, vec!["core_char_7"]);
        assert_eq!(group.template_member(), Some("core_char_7"));
    }

    #[test]
    fn membership_index_marks_templates() {
        let mut map = BTreeMap::new();
        map.insert(
            "g_1".to_string(),
            Group {
                name: "Raiders".to_string(),
                members: vec![
                    "core_char_1".to_string(),
                    "core_char_2".to_string(),
                    "core_char_1".to_string(),
                ],
                template: Some("core_char_1".to_string()),
            },
        );
        map.insert(
            "g_2".to_string(),
            Group {
                name: "  ".to_string(),
                members: vec!["core_char_2".to_string()],
                template: None,
            },
        );

        let index = membership_index(&map);
        let tags = &index["core_char_1"];
        assert_eq!(tags.len(), 1);
        assert!(tags[0].is_template);
        assert_eq!(tags[0].name, "Raiders");

        let tags = &index["core_char_2"];
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|tag| !tag.is_template));
        assert_eq!(tags[1].name, "g_2");
    }

    #[test]
    fn malformed_group_entries_deserialize_with_defaults() {
        let raw = r#"{"name":"Old"}"#;
        let group: Group = serde_json::from_str(raw).unwrap();
        assert!(group.members.is_empty());
        assert!(group.template.is_none());
    }
}
