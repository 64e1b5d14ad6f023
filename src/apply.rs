use crate::eve;
use crate::groups::{Group, ALL_GROUPS_ID};
use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(ApplyReport),
    Failed(ApplyFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApplyFailure {
    #[error("no settings folder selected")]
    NoFolder,
    #[error("no group selected")]
    NoGroup,
    #[error("group does not exist")]
    MissingGroup,
    #[error("group has no template character")]
    NoTemplate,
    #[error("template character has no linked account")]
    TemplateNotLinked,
    #[error("template settings files are missing")]
    TemplateMissingFiles,
    #[error("no source character selected")]
    NoSourceCharacter,
    #[error("source character has no linked account")]
    NoSourceLink,
    #[error("source settings files are missing")]
    SourceMissingFiles,
}

impl ApplyFailure {
    pub fn reason(self) -> &'static str {
        match self {
            ApplyFailure::NoFolder => "no-folder",
            ApplyFailure::NoGroup => "no-group",
            ApplyFailure::MissingGroup => "missing-group",
            ApplyFailure::NoTemplate => "no-template",
            ApplyFailure::TemplateNotLinked => "template-not-linked",
            ApplyFailure::TemplateMissingFiles => "template-missing-files",
            ApplyFailure::NoSourceCharacter => "no-source-char",
            ApplyFailure::NoSourceLink => "no-source-link",
            ApplyFailure::SourceMissingFiles => "source-missing-files",
        }
    }
}

pub fn overwrite_targets(
    profile_dir: &Path,
    source: &str,
    targets: &[String],
) -> Result<ApplyOutcome> {
    if !profile_dir.is_dir() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoFolder));
    }
    let source_path = eve::settings_path(profile_dir, source);
    if !source_path.exists() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::SourceMissingFiles));
    }
    let content =
        fs::read(&source_path).with_context(|| format!("read {}", source_path.display()))?;

    let source_prefix = entity_prefix(source);
    let mut report = ApplyReport::default();
    for target in targets {
        if target == source {
            continue;
        }
        if target.is_empty() || entity_prefix(target) != source_prefix {
            report.skipped += 1;
            continue;
        }
        let target_path = eve::settings_path(profile_dir, target);
        if !target_path.exists() {
            report.skipped += 1;
            continue;
        }
        fs::write(&target_path, &content)
            .with_context(|| format!("write {}", target_path.display()))?;
        report.applied += 1;
    }
    Ok(ApplyOutcome::Applied(report))
}

pub fn apply_group_from_template(
    profile_dir: &Path,
    groups: &BTreeMap<String, Group>,
    group_id: &str,
    links: &BTreeMap<String, String>,
) -> Result<ApplyOutcome> {
    if group_id.is_empty() || group_id == ALL_GROUPS_ID {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoGroup));
    }
    if !profile_dir.is_dir() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoFolder));
    }
    let Some(group) = groups.get(group_id) else {
        return Ok(ApplyOutcome::Failed(ApplyFailure::MissingGroup));
    };
    let Some(template) = group.template_member() else {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoTemplate));
    };
    let Some(template_account) = links.get(template) else {
        return Ok(ApplyOutcome::Failed(ApplyFailure::TemplateNotLinked));
    };

    let template_char_path = eve::settings_path(profile_dir, template);
    let template_account_path = eve::settings_path(profile_dir, template_account);
    if !template_char_path.exists() || !template_account_path.exists() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::TemplateMissingFiles));
    }
    let char_content = fs::read(&template_char_path)
        .with_context(|| format!("read {}", template_char_path.display()))?;
    let account_content = fs::read(&template_account_path)
        .with_context(|| format!("read {}", template_account_path.display()))?;

    let mut report = ApplyReport::default();
    for member in group.clean_members() {
        if member == template {
            continue;
        }
        let Some(member_account) = links.get(&member) else {
            report.skipped += 1;
            continue;
        };
        let member_char_path = eve::settings_path(profile_dir, &member);
        let member_account_path = eve::settings_path(profile_dir, member_account);
        if !member_char_path.exists() || !member_account_path.exists() {
            report.skipped += 1;
            continue;
        }
        fs::write(&member_char_path, &char_content)
            .with_context(|| format!("write {}", member_char_path.display()))?;
        fs::write(&member_account_path, &account_content)
            .with_context(|| format!("write {}", member_account_path.display()))?;
        report.applied += 1;
    }
    Ok(ApplyOutcome::Applied(report))
}

pub fn apply_links_from_source(
    profile_dir: &Path,
    links: &BTreeMap<String, String>,
    source: &str,
) -> Result<ApplyOutcome> {
    if !profile_dir.is_dir() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoFolder));
    }
    if source.is_empty() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoSourceCharacter));
    }
    let Some(source_account) = links.get(source) else {
        return Ok(ApplyOutcome::Failed(ApplyFailure::NoSourceLink));
    };

    let source_char_path = eve::settings_path(profile_dir, source);
    let source_account_path = eve::settings_path(profile_dir, source_account);
    if !source_char_path.exists() || !source_account_path.exists() {
        return Ok(ApplyOutcome::Failed(ApplyFailure::SourceMissingFiles));
    }
    let char_content = fs::read(&source_char_path)
        .with_context(|| format!("read {}", source_char_path.display()))?;
    let account_content = fs::read(&source_account_path)
        .with_context(|| format!("read {}", source_account_path.display()))?;

    let mut report = ApplyReport::default();
    for (target, target_account) in links {
        if target.is_empty() || target_account.is_empty() {
            report.skipped += 1;
            continue;
        }
        if target == source {
            continue;
        }
        let target_char_path = eve::settings_path(profile_dir, target);
        let target_account_path = eve::settings_path(profile_dir, target_account);
        if !target_char_path.exists() || !target_account_path.exists() {
            report.skipped += 1;
            continue;
        }
        fs::write(&target_char_path, &char_content)
            .with_context(|| format!("write {}", target_char_path.display()))?;
        fs::write(&target_account_path, &account_content)
            .with_context(|| format!("write {}", target_account_path.display()))?;
        report.applied += 1;
    }
    Ok(ApplyOutcome::Applied(report))
}

fn entity_prefix(file_id: &str) -> Option<&'static str> {
    if file_id.starts_with(eve::CHAR_PREFIX) {
        Some(eve::CHAR_PREFIX)
    } else if file_id.starts_with(eve::USER_PREFIX) {
        Some(eve::USER_PREFIX)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_settings(dir: &Path, file_id: &str, content: &[u8]) -> PathBuf {
        let path = eve::settings_path(dir, file_id);
        fs::write(&path, content).unwrap();
        path
    }

    fn read_settings(dir: &Path, file_id: &str) -> Vec<u8> {
        fs::read(eve::settings_path(dir, file_id)).unwrap()
    }

    fn group_with_template(members: &[&str], template: &str) -> BTreeMap<String, Group> {
        let mut groups = BTreeMap::new();
        groups.insert(
            "g_1".to_string(),
            Group {
                name: "Raiders".to_string(),
                members: members.iter().map(|m| m.to_string()).collect(),
                template: Some(template.to_string()),
            },
        );
        groups
    }

    #[test]
    fn overwrite_copies_bytes_to_existing_targets() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), "core_char_1", b"source-bytes");
        write_settings(dir.path(), "core_char_2", b"old");
        write_settings(dir.path(), "core_char_3", b"old");

        let targets = vec![
            "core_char_1".to_string(),
            "core_char_2".to_string(),
            "core_char_3".to_string(),
            "core_char_4".to_string(),
        ];
        let outcome = overwrite_targets(dir.path(), "core_char_1", &targets).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Applied(ApplyReport {
                applied: 2,
                skipped: 1,
            })
        );
        assert_eq!(read_settings(dir.path(), "core_char_2"), b"source-bytes");
        assert_eq!(read_settings(dir.path(), "core_char_3"), b"source-bytes");
        assert_eq!(read_settings(dir.path(), "core_char_1"), b"source-bytes");
    }

    #[test]
    fn overwrite_never_crosses_entity_kinds() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), "core_char_1", b"char");
        write_settings(dir.path(), "core_user_9", b"user");

        let targets = vec!["core_user_9".to_string()];
        let outcome = overwrite_targets(dir.path(), "core_char_1", &targets).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Applied(ApplyReport {
                applied: 0,
                skipped: 1,
            })
        );
        assert_eq!(read_settings(dir.path(), "core_user_9"), b"user");
    }

    #[test]
    fn overwrite_fails_without_a_source_file() {
        let dir = TempDir::new().unwrap();
        let targets = vec!["core_char_2".to_string()];
        let outcome = overwrite_targets(dir.path(), "core_char_1", &targets).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Failed(ApplyFailure::SourceMissingFiles)
        );

        let missing = dir.path().join("missing");
        let outcome = overwrite_targets(&missing, "core_char_1", &targets).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoFolder));
    }

    #[test]
    fn group_apply_copies_both_files_per_member() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), "core_char_1", b"tmpl-char");
        write_settings(dir.path(), "core_user_1", b"tmpl-user");
        write_settings(dir.path(), "core_char_2", b"old-char");
        write_settings(dir.path(), "core_user_2", b"old-user");
        write_settings(dir.path(), "core_char_3", b"unlinked");

        let groups = group_with_template(&["core_char_1", "core_char_2", "core_char_3"], "core_char_1");
        let links = BTreeMap::from([
            ("core_char_1".to_string(), "core_user_1".to_string()),
            ("core_char_2".to_string(), "core_user_2".to_string()),
        ]);

        let outcome = apply_group_from_template(dir.path(), &groups, "g_1", &links).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Applied(ApplyReport {
                applied: 1,
                skipped: 1,
            })
        );
        assert_eq!(read_settings(dir.path(), "core_char_2"), b"tmpl-char");
        assert_eq!(read_settings(dir.path(), "core_user_2"), b"tmpl-user");
        assert_eq!(read_settings(dir.path(), "core_char_1"), b"tmpl-char");
        assert_eq!(read_settings(dir.path(), "core_user_1"), b"tmpl-user");

        // Running again copies the same bytes onto the same members.
        let outcome = apply_group_from_template(dir.path(), &groups, "g_1", &links).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Applied(ApplyReport {
                applied: 1,
                skipped: 1,
            })
        );
        assert_eq!(read_settings(dir.path(), "core_char_2"), b"tmpl-char");
    }

    #[test]
    fn group_apply_failure_reasons() {
        let dir = TempDir::new().unwrap();
        let links = BTreeMap::new();

        let outcome =
            apply_group_from_template(dir.path(), &BTreeMap::new(), "", &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoGroup));

        let outcome =
            apply_group_from_template(dir.path(), &BTreeMap::new(), ALL_GROUPS_ID, &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoGroup));

        let missing_dir = dir.path().join("missing");
        let outcome =
            apply_group_from_template(&missing_dir, &BTreeMap::new(), "g_1", &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoFolder));

        let outcome =
            apply_group_from_template(dir.path(), &BTreeMap::new(), "g_1", &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::MissingGroup));

        let mut groups = BTreeMap::new();
        groups.insert("g_1".to_string(), Group::default());
        let outcome = apply_group_from_template(dir.path(), &groups, "g_1", &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoTemplate));

        let groups = group_with_template(&["core_char_1"], "core_char_1");
        let outcome = apply_group_from_template(dir.path(), &groups, "g_1", &links).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::TemplateNotLinked));

        let links = BTreeMap::from([("core_char_1".to_string(), "core_user_1".to_string())]);
        let outcome = apply_group_from_template(dir.path(), &groups, "g_1", &links).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Failed(ApplyFailure::TemplateMissingFiles)
        );
    }

    #[test]
    fn link_apply_copies_to_every_other_linked_pair() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), "core_char_1", b"src-char");
        write_settings(dir.path(), "core_user_1", b"src-user");
        write_settings(dir.path(), "core_char_2", b"old-char");
        write_settings(dir.path(), "core_user_2", b"old-user");

        let links = BTreeMap::from([
            ("core_char_1".to_string(), "core_user_1".to_string()),
            ("core_char_2".to_string(), "core_user_2".to_string()),
            ("core_char_3".to_string(), "core_user_3".to_string()),
        ]);

        let outcome = apply_links_from_source(dir.path(), &links, "core_char_1").unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Applied(ApplyReport {
                applied: 1,
                skipped: 1,
            })
        );
        assert_eq!(read_settings(dir.path(), "core_char_2"), b"src-char");
        assert_eq!(read_settings(dir.path(), "core_user_2"), b"src-user");
        assert_eq!(read_settings(dir.path(), "core_char_1"), b"src-char");
        assert_eq!(read_settings(dir.path(), "core_user_1"), b"src-user");
    }

    #[test]
    fn link_apply_failure_reasons() {
        let dir = TempDir::new().unwrap();
        let links = BTreeMap::new();

        let missing_dir = dir.path().join("missing");
        let outcome = apply_links_from_source(&missing_dir, &links, "core_char_1").unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoFolder));

        let outcome = apply_links_from_source(dir.path(), &links, "").unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoSourceCharacter));

        let outcome = apply_links_from_source(dir.path(), &links, "core_char_1").unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::NoSourceLink));

        let links = BTreeMap::from([("core_char_1".to_string(), "core_user_1".to_string())]);
        let outcome = apply_links_from_source(dir.path(), &links, "core_char_1").unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed(ApplyFailure::SourceMissingFiles));
    }

    #[test]
    fn failure_reasons_are_stable_strings() {
        assert_eq!(ApplyFailure::NoFolder.reason(), "no-folder");
        assert_eq!(ApplyFailure::MissingGroup.reason(), "missing-group");
        assert_eq!(ApplyFailure::NoSourceCharacter.reason(), "no-source-char");
        assert_eq!(
            ApplyFailure::TemplateMissingFiles.reason(),
            "template-missing-files"
        );
    }
}
