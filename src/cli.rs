use crate::{
    apply::{self, ApplyOutcome},
    backup, eve, groups, inventory,
    inventory::Inventory,
    links,
    server::{self, Server},
    store::{self, Scope, Store},
    transfer,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

struct GlobalOptions {
    format: OutputFormat,
    server: Option<String>,
    folder: Option<String>,
    profile: Option<String>,
    offline: bool,
    quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Status,
    Servers,
    Folders,
    Profiles,
    Characters { group: Option<String> },
    Accounts,
    Links,
    PruneLinks,
    Link { character: String, account: String },
    Unlink { character: String },
    AutoLink { character: String, window_ms: i64 },
    Groups,
    GroupNew { name: String },
    GroupDelete { group_id: String },
    GroupAdd { group_id: String, character: String },
    GroupRemove { group_id: String, character: String },
    GroupTemplate { group_id: String, character: String },
    GroupAddLinked { group_id: String, account: String },
    ApplyGroup { group_id: String },
    ApplyLinks { character: String },
    Overwrite { source: String, targets: Vec<String>, all: bool },
    Export { out: Option<String> },
    Import { path: String },
    Backup,
    Describe { file_id: String, text: Option<String>, clear: bool },
    UseServer { value: String },
    UseFolder { value: String },
    UseProfile { value: String },
    UseGroup { value: String },
    Reset { yes: bool },
    Help,
    Version,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(
        args.first().map(|s| s.as_str()),
        Some("--help" | "-h" | "help")
    ) {
        print_help();
        return Ok(());
    }
    if matches!(
        args.first().map(|s| s.as_str()),
        Some("--version" | "-V" | "version")
    ) {
        println!("podlink v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (global, tokens) = parse_global_options(&args);
    let command = parse_command(&tokens)?;
    match command {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("podlink v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let mut cli = Cli::open(global)?;
            cli.run_command(command)
        }
    }
}

fn parse_global_options(args: &[String]) -> (GlobalOptions, Vec<String>) {
    let mut format = OutputFormat::Text;
    let mut server = None;
    let mut folder = None;
    let mut profile = None;
    let mut offline = false;
    let mut quiet = false;
    let mut tokens = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--format=") {
            if let Some(parsed) = OutputFormat::parse(value) {
                format = parsed;
            }
            continue;
        }
        if arg == "--format" {
            if let Some(value) = iter.next() {
                if let Some(parsed) = OutputFormat::parse(value) {
                    format = parsed;
                }
            }
            continue;
        }
        if let Some(value) = arg.strip_prefix("--server=") {
            server = Some(value.to_string());
            continue;
        }
        if arg == "--server" {
            if let Some(value) = iter.next() {
                server = Some(value.to_string());
            }
            continue;
        }
        if let Some(value) = arg.strip_prefix("--folder=") {
            folder = Some(value.to_string());
            continue;
        }
        if arg == "--folder" {
            if let Some(value) = iter.next() {
                folder = Some(value.to_string());
            }
            continue;
        }
        if let Some(value) = arg.strip_prefix("--profile=") {
            profile = Some(value.to_string());
            continue;
        }
        if arg == "--profile" {
            if let Some(value) = iter.next() {
                profile = Some(value.to_string());
            }
            continue;
        }
        if arg == "--offline" {
            offline = true;
            continue;
        }
        if arg == "-q" || arg == "--quiet" {
            quiet = true;
            continue;
        }
        tokens.push(arg.to_string());
    }

    (
        GlobalOptions {
            format,
            server,
            folder,
            profile,
            offline,
            quiet,
        },
        tokens,
    )
}

fn parse_command(tokens: &[String]) -> Result<CliCommand> {
    let Some(head) = tokens.first() else {
        return Ok(CliCommand::Help);
    };
    let rest = tokens.get(1..).unwrap_or(&[]);
    match head.as_str() {
        "status" => Ok(CliCommand::Status),
        "servers" => Ok(CliCommand::Servers),
        "folders" => Ok(CliCommand::Folders),
        "profiles" => Ok(CliCommand::Profiles),
        "characters" => parse_characters(rest),
        "accounts" => Ok(CliCommand::Accounts),
        "links" => match rest.first().map(|value| value.as_str()) {
            None => Ok(CliCommand::Links),
            Some("prune") => Ok(CliCommand::PruneLinks),
            Some(other) => bail!("Unknown links command: {other} (use 'prune')"),
        },
        "link" => {
            let character = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("link requires <character> <account>"))?;
            let account = rest
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("link requires <character> <account>"))?;
            Ok(CliCommand::Link {
                character: character.to_string(),
                account: account.to_string(),
            })
        }
        "unlink" => {
            let character = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("unlink requires <character>"))?;
            Ok(CliCommand::Unlink {
                character: character.to_string(),
            })
        }
        "autolink" => parse_autolink(rest),
        "groups" => Ok(CliCommand::Groups),
        "group" => parse_group(rest),
        "apply" => parse_apply(rest),
        "overwrite" => parse_overwrite(rest),
        "export" => parse_export(rest),
        "import" => {
            let path = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("import requires <file>"))?;
            Ok(CliCommand::Import {
                path: path.to_string(),
            })
        }
        "backup" => Ok(CliCommand::Backup),
        "describe" => parse_describe(rest),
        "use" => parse_use(rest),
        "reset" => Ok(CliCommand::Reset {
            yes: rest.iter().any(|value| value == "--yes"),
        }),
        "help" => Ok(CliCommand::Help),
        "version" => Ok(CliCommand::Version),
        other => bail!("Unknown command: {other} (use 'help')"),
    }
}

fn parse_characters(args: &[String]) -> Result<CliCommand> {
    let mut group = None;
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--group" => {
                if let Some(value) = iter.next() {
                    group = Some(value.to_string());
                } else {
                    bail!("--group requires a value");
                }
            }
            value if value.starts_with("--group=") => {
                group = Some(value.trim_start_matches("--group=").to_string());
            }
            other => bail!("Unknown characters option: {other}"),
        }
    }
    Ok(CliCommand::Characters { group })
}

fn parse_autolink(args: &[String]) -> Result<CliCommand> {
    let character = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("autolink requires <character>"))?
        .to_string();
    let mut window_ms = links::DEFAULT_AUTO_LINK_WINDOW_MS;
    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--window" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--window requires milliseconds"))?;
                window_ms = parse_window(value)?;
            }
            value if value.starts_with("--window=") => {
                window_ms = parse_window(value.trim_start_matches("--window="))?;
            }
            other => bail!("Unknown autolink option: {other}"),
        }
    }
    Ok(CliCommand::AutoLink {
        character,
        window_ms,
    })
}

fn parse_window(value: &str) -> Result<i64> {
    match value.parse::<i64>() {
        Ok(window) if window > 0 => Ok(window),
        _ => bail!("Invalid window: {value} (expected positive milliseconds)"),
    }
}

fn parse_group(args: &[String]) -> Result<CliCommand> {
    let sub = args.first().map(|value| value.as_str()).unwrap_or("");
    match sub {
        "new" => Ok(CliCommand::GroupNew {
            name: args.get(1..).unwrap_or(&[]).join(" "),
        }),
        "delete" => {
            let group_id = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("group delete requires <group>"))?;
            Ok(CliCommand::GroupDelete {
                group_id: group_id.to_string(),
            })
        }
        "add" | "remove" | "template" => {
            let group_id = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("group {sub} requires <group> <character>"))?;
            let character = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("group {sub} requires <group> <character>"))?;
            let command = match sub {
                "add" => CliCommand::GroupAdd {
                    group_id: group_id.to_string(),
                    character: character.to_string(),
                },
                "remove" => CliCommand::GroupRemove {
                    group_id: group_id.to_string(),
                    character: character.to_string(),
                },
                _ => CliCommand::GroupTemplate {
                    group_id: group_id.to_string(),
                    character: character.to_string(),
                },
            };
            Ok(command)
        }
        "add-linked" => {
            let group_id = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("group add-linked requires <group> <account>"))?;
            let account = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("group add-linked requires <group> <account>"))?;
            Ok(CliCommand::GroupAddLinked {
                group_id: group_id.to_string(),
                account: account.to_string(),
            })
        }
        other => bail!(
            "Unknown group command: {other} (use 'new', 'delete', 'add', 'remove', 'template', or 'add-linked')"
        ),
    }
}

fn parse_apply(args: &[String]) -> Result<CliCommand> {
    match args.first().map(|value| value.as_str()) {
        Some("group") => {
            let group_id = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("apply group requires <group>"))?;
            Ok(CliCommand::ApplyGroup {
                group_id: group_id.to_string(),
            })
        }
        Some("links") => {
            let character = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("apply links requires <character>"))?;
            Ok(CliCommand::ApplyLinks {
                character: character.to_string(),
            })
        }
        _ => bail!("Unknown apply command (use 'group' or 'links')"),
    }
}

fn parse_overwrite(args: &[String]) -> Result<CliCommand> {
    let source = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("overwrite requires <source> and targets or --all"))?
        .to_string();
    let mut targets = Vec::new();
    let mut all = false;
    for arg in args.iter().skip(1) {
        if arg == "--all" {
            all = true;
        } else {
            targets.push(arg.to_string());
        }
    }
    if targets.is_empty() && !all {
        bail!("overwrite requires target ids or --all");
    }
    Ok(CliCommand::Overwrite {
        source,
        targets,
        all,
    })
}

fn parse_export(args: &[String]) -> Result<CliCommand> {
    let mut out = None;
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--out requires a directory"))?;
                out = Some(value.to_string());
            }
            value if value.starts_with("--out=") => {
                out = Some(value.trim_start_matches("--out=").to_string());
            }
            other => bail!("Unknown export option: {other}"),
        }
    }
    Ok(CliCommand::Export { out })
}

fn parse_describe(args: &[String]) -> Result<CliCommand> {
    let file_id = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("describe requires <file>"))?
        .to_string();
    let rest = args.get(1..).unwrap_or(&[]);
    let clear = rest.iter().any(|value| value == "--clear");
    let text: Vec<&str> = rest
        .iter()
        .filter(|value| value.as_str() != "--clear")
        .map(|value| value.as_str())
        .collect();
    if clear && !text.is_empty() {
        bail!("describe cannot combine --clear with text");
    }
    let text = if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    };
    Ok(CliCommand::Describe {
        file_id,
        text,
        clear,
    })
}

fn parse_use(args: &[String]) -> Result<CliCommand> {
    let target = args.first().map(|value| value.as_str()).unwrap_or("");
    let value = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("use {target} requires a value"))
        .map(|value| value.to_string());
    match target {
        "server" => Ok(CliCommand::UseServer { value: value? }),
        "folder" => Ok(CliCommand::UseFolder { value: value? }),
        "profile" => Ok(CliCommand::UseProfile { value: value? }),
        "group" => Ok(CliCommand::UseGroup { value: value? }),
        other => bail!("Unknown use target: {other} (use 'server', 'folder', 'profile', or 'group')"),
    }
}

struct Session {
    server: Server,
    profile: String,
    profile_dir: PathBuf,
    scope: Scope,
}

struct Cli {
    store: Store,
    format: OutputFormat,
    server_override: Option<String>,
    folder_override: Option<String>,
    profile_override: Option<String>,
    offline: bool,
    quiet: bool,
}

impl Cli {
    fn open(global: GlobalOptions) -> Result<Self> {
        Ok(Cli {
            store: Store::open_default()?,
            format: global.format,
            server_override: global.server,
            folder_override: global.folder,
            profile_override: global.profile,
            offline: global.offline,
            quiet: global.quiet,
        })
    }

    fn server(&self) -> Result<Server> {
        if let Some(value) = &self.server_override {
            return Server::parse(value)
                .with_context(|| format!("unknown server: {value} (use 'podlink servers')"));
        }
        Ok(self
            .store
            .get_string(store::SERVER_KEY)
            .and_then(|value| Server::parse(&value))
            .unwrap_or_default())
    }

    fn settings_root(&self, server: Server) -> Result<PathBuf> {
        if let Some(value) = &self.folder_override {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
            bail!("settings folder not found: {value}");
        }
        if let Some(saved) = self.store.get_string(&store::saved_folder_key(server)) {
            let path = PathBuf::from(&saved);
            if path.is_dir() {
                return Ok(path);
            }
        }
        eve::detect_settings_roots(server)
            .into_iter()
            .next()
            .with_context(|| {
                format!(
                    "no settings folder found for {}; run 'podlink use folder <dir>'",
                    server.as_str()
                )
            })
    }

    fn profile(&self, server: Server, root: &Path) -> Result<String> {
        let profiles = eve::find_profiles(root);
        if profiles.is_empty() {
            bail!("no settings profiles in {}", root.display());
        }
        if let Some(value) = &self.profile_override {
            if profiles.iter().any(|profile| profile == value) {
                return Ok(value.clone());
            }
            bail!("profile not found: {value}");
        }
        if let Some(saved) = self.store.get_string(&store::saved_profile_key(server)) {
            if profiles.contains(&saved) {
                return Ok(saved);
            }
        }
        if profiles.iter().any(|profile| profile == eve::DEFAULT_PROFILE) {
            return Ok(eve::DEFAULT_PROFILE.to_string());
        }
        Ok(profiles[0].clone())
    }

    fn session(&self) -> Result<Session> {
        let server = self.server()?;
        let root = self.settings_root(server)?;
        let profile = self.profile(server, &root)?;
        let profile_dir = root.join(&profile);
        let scope = Scope::new(server, profile.clone());
        Ok(Session {
            server,
            profile,
            profile_dir,
            scope,
        })
    }

    fn load_inventory(&mut self, session: &Session) -> Result<Inventory> {
        let (inventory, report) = inventory::scan_and_resolve(
            &session.profile_dir,
            session.server,
            &mut self.store,
            self.offline,
        )?;
        if !self.quiet && self.format == OutputFormat::Text {
            if !report.resolved.is_empty() {
                eprintln!("resolved {} character names", report.resolved.len());
            }
            if report.unresolved > 0 {
                eprintln!("{} character names could not be resolved", report.unresolved);
            }
        }
        Ok(inventory)
    }

    fn run_command(&mut self, command: CliCommand) -> Result<()> {
        match command {
            CliCommand::Status => self.cmd_status(),
            CliCommand::Servers => self.cmd_servers(),
            CliCommand::Folders => self.cmd_folders(),
            CliCommand::Profiles => self.cmd_profiles(),
            CliCommand::Characters { group } => self.cmd_characters(group.as_deref()),
            CliCommand::Accounts => self.cmd_accounts(),
            CliCommand::Links => self.cmd_links(),
            CliCommand::PruneLinks => self.cmd_prune_links(),
            CliCommand::Link { character, account } => self.cmd_link(&character, &account),
            CliCommand::Unlink { character } => self.cmd_unlink(&character),
            CliCommand::AutoLink {
                character,
                window_ms,
            } => self.cmd_autolink(&character, window_ms),
            CliCommand::Groups => self.cmd_groups(),
            CliCommand::GroupNew { name } => self.cmd_group_new(&name),
            CliCommand::GroupDelete { group_id } => self.cmd_group_delete(&group_id),
            CliCommand::GroupAdd {
                group_id,
                character,
            } => self.cmd_group_add(&group_id, &character),
            CliCommand::GroupRemove {
                group_id,
                character,
            } => self.cmd_group_remove(&group_id, &character),
            CliCommand::GroupTemplate {
                group_id,
                character,
            } => self.cmd_group_template(&group_id, &character),
            CliCommand::GroupAddLinked { group_id, account } => {
                self.cmd_group_add_linked(&group_id, &account)
            }
            CliCommand::ApplyGroup { group_id } => self.cmd_apply_group(&group_id),
            CliCommand::ApplyLinks { character } => self.cmd_apply_links(&character),
            CliCommand::Overwrite {
                source,
                targets,
                all,
            } => self.cmd_overwrite(&source, targets, all),
            CliCommand::Export { out } => self.cmd_export(out.as_deref()),
            CliCommand::Import { path } => self.cmd_import(Path::new(&path)),
            CliCommand::Backup => self.cmd_backup(),
            CliCommand::Describe {
                file_id,
                text,
                clear,
            } => self.cmd_describe(&file_id, text.as_deref(), clear),
            CliCommand::UseServer { value } => self.cmd_use_server(&value),
            CliCommand::UseFolder { value } => self.cmd_use_folder(&value),
            CliCommand::UseProfile { value } => self.cmd_use_profile(&value),
            CliCommand::UseGroup { value } => self.cmd_use_group(&value),
            CliCommand::Reset { yes } => self.cmd_reset(yes),
            CliCommand::Help | CliCommand::Version => Ok(()),
        }
    }

    fn cmd_status(&mut self) -> Result<()> {
        let server = self.server()?;
        let root = self.settings_root(server).ok();
        let (profile, counts) = match &root {
            Some(root) => {
                let profile = self.profile(server, root).ok();
                let counts = profile.as_ref().and_then(|profile| {
                    let scope = Scope::new(server, profile.clone());
                    let inventory =
                        inventory::scan(&root.join(profile), server, &self.store).ok()?;
                    Some((
                        inventory.characters.len(),
                        inventory.accounts.len(),
                        links::links(&self.store, &scope).len(),
                        groups::groups(&self.store, &scope).len(),
                    ))
                });
                (profile, counts)
            }
            None => (None, None),
        };
        let group = profile.as_ref().and_then(|profile| {
            let scope = Scope::new(server, profile.clone());
            self.store.get_string(&scope.saved_group_key())
        });

        let output = StatusOutput {
            server: server.as_str().to_string(),
            server_name: server.display_name().to_string(),
            folder: root.as_ref().map(|path| path.display().to_string()),
            profile: profile.clone(),
            store_path: self.store.path().display().to_string(),
            characters: counts.map(|counts| counts.0),
            accounts: counts.map(|counts| counts.1),
            links: counts.map(|counts| counts.2),
            groups: counts.map(|counts| counts.3),
            group,
        };

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                println!("Server:  {} ({})", output.server_name, output.server);
                match &output.folder {
                    Some(folder) => println!("Folder:  {folder}"),
                    None => println!("Folder:  (none detected)"),
                }
                if let Some(profile) = &output.profile {
                    println!("Profile: {profile}");
                }
                println!("Store:   {}", output.store_path);
                if let (Some(characters), Some(accounts), Some(links), Some(groups)) = (
                    output.characters,
                    output.accounts,
                    output.links,
                    output.groups,
                ) {
                    println!(
                        "Files:   {characters} characters, {accounts} accounts, {links} links, {groups} groups"
                    );
                }
                if let Some(group) = &output.group {
                    println!("Group:   {group}");
                }
            }
        }
        Ok(())
    }

    fn cmd_servers(&mut self) -> Result<()> {
        let active = self.server()?;
        let items: Vec<ServerListItem> = server::supported_servers()
            .into_iter()
            .map(|server| ServerListItem {
                id: server.as_str().to_string(),
                name: server.display_name().to_string(),
                active: server == active,
                name_lookup: server.supports_name_lookup(),
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                for item in items {
                    let marker = if item.active { "*" } else { " " };
                    println!("{marker} {id:<13} {name}", id = item.id, name = item.name);
                }
            }
        }
        Ok(())
    }

    fn cmd_folders(&mut self) -> Result<()> {
        let server = self.server()?;
        let current = self.settings_root(server).ok();
        let mut items: Vec<FolderListItem> = eve::detect_settings_roots(server)
            .into_iter()
            .map(|path| FolderListItem {
                selected: Some(&path) == current.as_ref(),
                exists: true,
                path: path.display().to_string(),
            })
            .collect();
        if let Some(saved) = self.store.get_string(&store::saved_folder_key(server)) {
            if !items.iter().any(|item| item.path == saved) {
                let path = PathBuf::from(&saved);
                items.push(FolderListItem {
                    selected: Some(&path) == current.as_ref(),
                    exists: path.is_dir(),
                    path: saved,
                });
            }
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                if items.is_empty() {
                    println!(
                        "No settings folders found for {}; run 'podlink use folder <dir>'.",
                        server.as_str()
                    );
                }
                for item in items {
                    let marker = if item.selected { "*" } else { " " };
                    let missing = if item.exists { "" } else { " (missing)" };
                    println!("{marker} {}{missing}", item.path);
                }
            }
        }
        Ok(())
    }

    fn cmd_profiles(&mut self) -> Result<()> {
        let server = self.server()?;
        let root = self.settings_root(server)?;
        let active = self.profile(server, &root).ok();
        let items: Vec<ProfileListItem> = eve::find_profiles(&root)
            .into_iter()
            .map(|name| ProfileListItem {
                active: Some(&name) == active.as_ref(),
                name,
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                for item in items {
                    if item.active {
                        println!("* {}", item.name);
                    } else {
                        println!("  {}", item.name);
                    }
                }
            }
        }
        Ok(())
    }

    fn cmd_characters(&mut self, group_flag: Option<&str>) -> Result<()> {
        let session = self.session()?;
        let inventory = self.load_inventory(&session)?;
        let link_map = links::links(&self.store, &session.scope);
        let group_map = groups::groups(&self.store, &session.scope);
        let index = groups::membership_index(&group_map);

        let filter = match group_flag {
            Some(value) => Some(value.to_string()),
            None => self.store.get_string(&session.scope.saved_group_key()),
        }
        .filter(|value| value != groups::ALL_GROUPS_ID);

        // A stale saved filter falls back to the full list; an explicit flag must match.
        let filter_group = match &filter {
            Some(group_id) => match group_map.get(group_id) {
                Some(group) => Some(group),
                None if group_flag.is_some() => bail!("unknown group: {group_id}"),
                None => None,
            },
            None => None,
        };

        let mut items = Vec::new();
        for character in inventory.characters.values() {
            let tags = index.get(&character.file_id);
            let (member, template) = match filter_group {
                Some(group) => {
                    let member = group
                        .clean_members()
                        .iter()
                        .any(|m| m == &character.file_id);
                    if !member {
                        continue;
                    }
                    (true, group.template_member() == Some(character.file_id.as_str()))
                }
                None => (
                    tags.is_some(),
                    tags.map_or(false, |tags| tags.iter().any(|tag| tag.is_template)),
                ),
            };

            let account =
                links::linked_account(&link_map, &character.file_id).map(|value| value.to_string());
            let account_id = account
                .as_ref()
                .and_then(|account| inventory.accounts.get(account))
                .map(|account| account.account_id.clone());
            items.push(CharacterListItem {
                file_id: character.file_id.clone(),
                character_id: character.character_id.clone(),
                name: character.name.clone(),
                modified_ms: character.mtime_ms,
                modified: format_timestamp(character.mtime_ms),
                account,
                account_id,
                groups: tags.map_or_else(Vec::new, |tags| {
                    tags.iter().map(|tag| tag.name.clone()).collect()
                }),
                member,
                template,
                description: character.description.clone(),
            });
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                for item in items {
                    let marker = if item.template {
                        "*"
                    } else if item.member {
                        "+"
                    } else {
                        " "
                    };
                    let name = item.name.as_deref().unwrap_or("-");
                    let modified = item
                        .modified
                        .unwrap_or_else(|| "----------------".to_string());
                    let account = match (&item.account_id, &item.account) {
                        (Some(account_id), _) => format!("acct:{account_id}"),
                        (None, Some(account)) => format!("acct:{account}"),
                        (None, None) => "-".to_string(),
                    };
                    let mut line = format!(
                        "{marker} {file_id:<24} {name:<22} {modified:<17} {account:<18}",
                        file_id = item.file_id
                    );
                    if !item.groups.is_empty() {
                        line.push_str(&format!(" [{}]", item.groups.join(", ")));
                    }
                    if let Some(description) = &item.description {
                        line.push_str(&format!(" {description}"));
                    }
                    println!("{}", line.trim_end());
                }
            }
        }
        Ok(())
    }

    fn cmd_accounts(&mut self) -> Result<()> {
        let session = self.session()?;
        let inventory = self.load_inventory(&session)?;
        let link_map = links::links(&self.store, &session.scope);

        let mut items = Vec::new();
        for account in inventory.accounts.values() {
            let characters = links::linked_characters(&link_map, &inventory.characters, &account.file_id)
                .into_iter()
                .map(|character| {
                    inventory
                        .characters
                        .get(&character)
                        .and_then(|entry| entry.name.clone())
                        .unwrap_or(character)
                })
                .collect();
            items.push(AccountListItem {
                file_id: account.file_id.clone(),
                account_id: account.account_id.clone(),
                modified_ms: account.mtime_ms,
                modified: format_timestamp(account.mtime_ms),
                characters,
                description: account.description.clone(),
            });
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                for item in items {
                    let modified = item
                        .modified
                        .unwrap_or_else(|| "----------------".to_string());
                    let mut line = format!(
                        "  {file_id:<24} {modified:<17}",
                        file_id = item.file_id
                    );
                    if !item.characters.is_empty() {
                        line.push_str(&format!(" chars: {}", item.characters.join(", ")));
                    }
                    if let Some(description) = &item.description {
                        line.push_str(&format!(" {description}"));
                    }
                    println!("{}", line.trim_end());
                }
            }
        }
        Ok(())
    }

    fn cmd_links(&mut self) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        let link_map = links::links(&self.store, &session.scope);

        let items: Vec<LinkListItem> = link_map
            .iter()
            .map(|(character, account)| LinkListItem {
                character: character.clone(),
                account: account.clone(),
                character_exists: inventory.characters.contains_key(character),
                account_exists: inventory.accounts.contains_key(account),
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                if items.is_empty() {
                    println!("No links stored for {}.", session.profile);
                }
                for item in items {
                    let mut line = format!("{} -> {}", item.character, item.account);
                    if !item.character_exists || !item.account_exists {
                        line.push_str(" (missing files)");
                    }
                    println!("{line}");
                }
            }
        }
        Ok(())
    }

    fn cmd_prune_links(&mut self) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        let removed = links::prune_dangling(&mut self.store, &session.scope, &inventory)?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&PruneOutput { removed })?);
            }
            OutputFormat::Text => {
                if removed == 0 {
                    println!("No dangling links.");
                } else {
                    println!("Removed {removed} dangling links.");
                }
            }
        }
        Ok(())
    }

    fn cmd_link(&mut self, character: &str, account: &str) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        if !inventory.characters.contains_key(character) {
            bail!("unknown character file: {character}");
        }
        if !inventory.accounts.contains_key(account) {
            bail!("unknown account file: {account}");
        }
        links::link(&mut self.store, &session.scope, character, account)?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&LinkOutput {
                        ok: true,
                        character: character.to_string(),
                        account: account.to_string(),
                    })?
                );
            }
            OutputFormat::Text => println!("Linked {character} -> {account}."),
        }
        Ok(())
    }

    fn cmd_unlink(&mut self, character: &str) -> Result<()> {
        let session = self.session()?;
        let removed = links::unlink(&mut self.store, &session.scope, character)?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&UnlinkOutput { ok: true, removed })?
                );
            }
            OutputFormat::Text => {
                if removed {
                    println!("Unlinked {character}.");
                } else {
                    println!("No link stored for {character}.");
                }
            }
        }
        Ok(())
    }

    fn cmd_autolink(&mut self, character: &str, window_ms: i64) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        let outcome = links::auto_link(
            &mut self.store,
            &session.scope,
            Some(character),
            &inventory,
            window_ms,
            now_ms(),
        )?;

        match outcome {
            links::AutoLinkOutcome::Linked {
                character,
                account,
                account_id,
            } => match self.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&AutoLinkOutput {
                            ok: true,
                            character: Some(character),
                            account: Some(account),
                            account_id: Some(account_id),
                            reason: None,
                            candidates: Vec::new(),
                        })?
                    );
                }
                OutputFormat::Text => println!("Linked {character} -> {account}."),
            },
            links::AutoLinkOutcome::NoCharacterSelected => {
                self.print_autolink_failure("no-character-selected", Vec::new(), || {
                    format!("unknown character file: {character}")
                })?;
            }
            links::AutoLinkOutcome::NoneFresh => {
                self.print_autolink_failure("none-fresh", Vec::new(), || {
                    format!(
                        "no account file was written within the last {} ms; log out in the game client first",
                        window_ms
                    )
                })?;
            }
            links::AutoLinkOutcome::MultipleFresh { candidates } => {
                if self.format == OutputFormat::Text {
                    for candidate in &candidates {
                        println!(
                            "  {file_id:<24} {age_ms} ms ago",
                            file_id = candidate.file_id,
                            age_ms = candidate.age_ms
                        );
                    }
                }
                self.print_autolink_failure("multiple-fresh", candidates, || {
                    "multiple fresh account files; pick one with 'podlink link'".to_string()
                })?;
            }
        }
        Ok(())
    }

    fn print_autolink_failure(
        &self,
        reason: &'static str,
        candidates: Vec<links::FreshAccount>,
        message: impl Fn() -> String,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&AutoLinkOutput {
                        ok: false,
                        character: None,
                        account: None,
                        account_id: None,
                        reason: Some(reason),
                        candidates,
                    })?
                );
                Ok(())
            }
            OutputFormat::Text => bail!("{}", message()),
        }
    }

    fn cmd_groups(&mut self) -> Result<()> {
        let session = self.session()?;
        let group_map = groups::groups(&self.store, &session.scope);
        let selected = self.store.get_string(&session.scope.saved_group_key());

        let items: Vec<GroupListItem> = group_map
            .iter()
            .map(|(group_id, group)| GroupListItem {
                group_id: group_id.clone(),
                name: group.display_name(group_id),
                members: group.clean_members().len(),
                template: group.template_member().map(|value| value.to_string()),
                selected: Some(group_id) == selected.as_ref(),
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                if items.is_empty() {
                    println!("No groups for {}.", session.profile);
                }
                for item in items {
                    let marker = if item.selected { "*" } else { " " };
                    let template = item
                        .template
                        .map(|value| format!(" template: {value}"))
                        .unwrap_or_default();
                    println!(
                        "{marker} {group_id:<16} {name:<20} {members} members{template}",
                        group_id = item.group_id,
                        name = item.name,
                        members = item.members
                    );
                }
            }
        }
        Ok(())
    }

    fn cmd_group_new(&mut self, name: &str) -> Result<()> {
        let session = self.session()?;
        let group_id = groups::create_group(&mut self.store, &session.scope, name)?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&GroupIdOutput {
                        ok: true,
                        group_id: group_id.clone(),
                    })?
                );
            }
            OutputFormat::Text => println!("Created group {group_id}."),
        }
        Ok(())
    }

    fn cmd_group_delete(&mut self, group_id: &str) -> Result<()> {
        let session = self.session()?;
        if group_id == groups::ALL_GROUPS_ID {
            bail!("cannot delete the built-in group '{}'", groups::ALL_GROUPS_ID);
        }
        if !groups::delete_group(&mut self.store, &session.scope, group_id)? {
            bail!("unknown group: {group_id}");
        }
        self.print_ok(|| format!("Deleted group {group_id}."))
    }

    fn cmd_group_add(&mut self, group_id: &str, character: &str) -> Result<()> {
        let session = self.session()?;
        if !groups::add_member(&mut self.store, &session.scope, group_id, character)? {
            bail!("unknown group: {group_id}");
        }
        self.print_ok(|| format!("Added {character} to {group_id}."))
    }

    fn cmd_group_remove(&mut self, group_id: &str, character: &str) -> Result<()> {
        let session = self.session()?;
        if !groups::remove_member(&mut self.store, &session.scope, group_id, character)? {
            bail!("unknown group: {group_id}");
        }
        self.print_ok(|| format!("Removed {character} from {group_id}."))
    }

    fn cmd_group_template(&mut self, group_id: &str, character: &str) -> Result<()> {
        let session = self.session()?;
        if !groups::set_template(&mut self.store, &session.scope, group_id, character)? {
            bail!("unknown group: {group_id}");
        }
        self.print_ok(|| format!("Template of {group_id} is now {character}."))
    }

    fn cmd_group_add_linked(&mut self, group_id: &str, account: &str) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        let link_map = links::links(&self.store, &session.scope);
        let members = links::linked_characters(&link_map, &inventory.characters, account);
        if members.is_empty() {
            bail!("no characters linked to {account}");
        }
        let mut added = 0usize;
        for character in &members {
            if !groups::add_member(&mut self.store, &session.scope, group_id, character)? {
                bail!("unknown group: {group_id}");
            }
            added += 1;
        }

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&GroupAddLinkedOutput {
                        ok: true,
                        added,
                        characters: members,
                    })?
                );
            }
            OutputFormat::Text => println!("Added {added} characters to {group_id}."),
        }
        Ok(())
    }

    fn cmd_apply_group(&mut self, group_id: &str) -> Result<()> {
        let session = self.session()?;
        let group_map = groups::groups(&self.store, &session.scope);
        let link_map = links::links(&self.store, &session.scope);
        let outcome =
            apply::apply_group_from_template(&session.profile_dir, &group_map, group_id, &link_map)?;
        self.print_apply_outcome(outcome)
    }

    fn cmd_apply_links(&mut self, character: &str) -> Result<()> {
        let session = self.session()?;
        let link_map = links::links(&self.store, &session.scope);
        let outcome = apply::apply_links_from_source(&session.profile_dir, &link_map, character)?;
        self.print_apply_outcome(outcome)
    }

    fn cmd_overwrite(&mut self, source: &str, targets: Vec<String>, all: bool) -> Result<()> {
        let session = self.session()?;
        let inventory = inventory::scan(&session.profile_dir, session.server, &self.store)?;
        let targets = if all {
            if inventory.characters.contains_key(source) {
                inventory.characters.keys().cloned().collect()
            } else if inventory.accounts.contains_key(source) {
                inventory.accounts.keys().cloned().collect()
            } else {
                bail!("unknown settings file: {source}");
            }
        } else {
            targets
        };
        let outcome = apply::overwrite_targets(&session.profile_dir, source, &targets)?;
        self.print_apply_outcome(outcome)
    }

    fn print_apply_outcome(&self, outcome: ApplyOutcome) -> Result<()> {
        match outcome {
            ApplyOutcome::Applied(report) => match self.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&ApplySummary {
                            ok: true,
                            applied: report.applied,
                            skipped: report.skipped,
                        })?
                    );
                    Ok(())
                }
                OutputFormat::Text => {
                    println!("Applied {}, skipped {}.", report.applied, report.skipped);
                    Ok(())
                }
            },
            ApplyOutcome::Failed(failure) => match self.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&FailureSummary {
                            ok: false,
                            reason: failure.reason(),
                        })?
                    );
                    Ok(())
                }
                OutputFormat::Text => bail!("{failure}"),
            },
        }
    }

    fn cmd_export(&mut self, out: Option<&str>) -> Result<()> {
        let session = self.session()?;
        let dest = PathBuf::from(out.unwrap_or("."));
        std::fs::create_dir_all(&dest).context("create export dir")?;
        let report = transfer::export_links(&self.store, &session.scope, &dest)?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ExportOutput {
                        ok: true,
                        path: report.path.display().to_string(),
                        count: report.count,
                    })?
                );
            }
            OutputFormat::Text => {
                println!("Exported {} links to {}.", report.count, report.path.display());
            }
        }
        Ok(())
    }

    fn cmd_import(&mut self, path: &Path) -> Result<()> {
        let session = self.session()?;
        let outcome = transfer::import_links(&mut self.store, &session.scope, path)?;

        match outcome {
            transfer::ImportOutcome::Imported { imported, total } => match self.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&ImportOutput {
                            ok: true,
                            imported,
                            total,
                        })?
                    );
                }
                OutputFormat::Text => println!("Imported {imported} links ({total} total)."),
            },
            transfer::ImportOutcome::Failed(failure) => match self.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&FailureSummary {
                            ok: false,
                            reason: failure.reason(),
                        })?
                    );
                }
                OutputFormat::Text => bail!("{failure}"),
            },
        }
        Ok(())
    }

    fn cmd_backup(&mut self) -> Result<()> {
        let session = self.session()?;
        let report = backup::create_backup(&session.profile_dir)?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&BackupOutput {
                        ok: true,
                        path: report.path.display().to_string(),
                        file_count: report.file_count,
                    })?
                );
            }
            OutputFormat::Text => {
                println!(
                    "Backed up {} files to {}.",
                    report.file_count,
                    report.path.display()
                );
            }
        }
        Ok(())
    }

    fn cmd_describe(&mut self, file_id: &str, text: Option<&str>, clear: bool) -> Result<()> {
        if !file_id.starts_with(eve::CHAR_PREFIX) && !file_id.starts_with(eve::USER_PREFIX) {
            bail!("not a settings file id: {file_id}");
        }
        let server = self.server()?;
        let key = store::description_key(server, file_id);

        if clear {
            let removed = self.store.remove(&key)?;
            return self.print_ok(|| {
                if removed {
                    format!("Cleared description for {file_id}.")
                } else {
                    format!("No description stored for {file_id}.")
                }
            });
        }
        if let Some(text) = text {
            self.store.set_string(&key, text)?;
            return self.print_ok(|| format!("Saved description for {file_id}."));
        }

        let description = self.store.get_string(&key);
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&DescribeOutput {
                        file_id: file_id.to_string(),
                        description,
                    })?
                );
            }
            OutputFormat::Text => match description {
                Some(description) => println!("{description}"),
                None => println!("(no description)"),
            },
        }
        Ok(())
    }

    fn cmd_use_server(&mut self, value: &str) -> Result<()> {
        let server = Server::parse(value)
            .with_context(|| format!("unknown server: {value} (use 'podlink servers')"))?;
        self.store.set_string(store::SERVER_KEY, server.as_str())?;
        self.print_ok(|| format!("Server set to {}.", server.display_name()))
    }

    fn cmd_use_folder(&mut self, value: &str) -> Result<()> {
        let server = self.server()?;
        let path = PathBuf::from(value);
        if !path.is_dir() {
            bail!("settings folder not found: {value}");
        }
        if !eve::looks_like_settings_root(&path) {
            eprintln!("warning: no settings profiles found in {value}");
        }
        self.store
            .set_string(&store::saved_folder_key(server), value)?;
        self.print_ok(|| format!("Folder set to {value}."))
    }

    fn cmd_use_profile(&mut self, value: &str) -> Result<()> {
        let server = self.server()?;
        let root = self.settings_root(server)?;
        let profiles = eve::find_profiles(&root);
        if !profiles.iter().any(|profile| profile == value) {
            bail!("profile not found: {value}");
        }
        self.store
            .set_string(&store::saved_profile_key(server), value)?;
        self.print_ok(|| format!("Profile set to {value}."))
    }

    fn cmd_use_group(&mut self, value: &str) -> Result<()> {
        let session = self.session()?;
        if value != groups::ALL_GROUPS_ID {
            let group_map = groups::groups(&self.store, &session.scope);
            if !group_map.contains_key(value) {
                bail!("unknown group: {value}");
            }
        }
        self.store
            .set_string(&session.scope.saved_group_key(), value)?;
        self.print_ok(|| format!("Group filter set to {value}."))
    }

    fn cmd_reset(&mut self, yes: bool) -> Result<()> {
        if !yes {
            bail!("reset wipes every saved setting; pass --yes to confirm");
        }
        self.store.clear()?;
        self.print_ok(|| "Cleared all saved settings.".to_string())
    }

    fn print_ok(&self, message: impl Fn() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&OkOutput { ok: true })?);
            }
            OutputFormat::Text => println!("{}", message()),
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusOutput {
    server: String,
    server_name: String,
    folder: Option<String>,
    profile: Option<String>,
    store_path: String,
    characters: Option<usize>,
    accounts: Option<usize>,
    links: Option<usize>,
    groups: Option<usize>,
    group: Option<String>,
}

#[derive(Serialize)]
struct ServerListItem {
    id: String,
    name: String,
    active: bool,
    name_lookup: bool,
}

#[derive(Serialize)]
struct FolderListItem {
    path: String,
    selected: bool,
    exists: bool,
}

#[derive(Serialize)]
struct ProfileListItem {
    name: String,
    active: bool,
}

#[derive(Serialize)]
struct CharacterListItem {
    file_id: String,
    character_id: String,
    name: Option<String>,
    modified_ms: i64,
    modified: Option<String>,
    account: Option<String>,
    account_id: Option<String>,
    groups: Vec<String>,
    member: bool,
    template: bool,
    description: Option<String>,
}

#[derive(Serialize)]
struct AccountListItem {
    file_id: String,
    account_id: String,
    modified_ms: i64,
    modified: Option<String>,
    characters: Vec<String>,
    description: Option<String>,
}

#[derive(Serialize)]
struct LinkListItem {
    character: String,
    account: String,
    character_exists: bool,
    account_exists: bool,
}

#[derive(Serialize)]
struct PruneOutput {
    removed: usize,
}

#[derive(Serialize)]
struct LinkOutput {
    ok: bool,
    character: String,
    account: String,
}

#[derive(Serialize)]
struct UnlinkOutput {
    ok: bool,
    removed: bool,
}

#[derive(Serialize)]
struct AutoLinkOutput {
    ok: bool,
    character: Option<String>,
    account: Option<String>,
    account_id: Option<String>,
    reason: Option<&'static str>,
    candidates: Vec<links::FreshAccount>,
}

#[derive(Serialize)]
struct GroupListItem {
    group_id: String,
    name: String,
    members: usize,
    template: Option<String>,
    selected: bool,
}

#[derive(Serialize)]
struct GroupIdOutput {
    ok: bool,
    group_id: String,
}

#[derive(Serialize)]
struct GroupAddLinkedOutput {
    ok: bool,
    added: usize,
    characters: Vec<String>,
}

#[derive(Serialize)]
struct ApplySummary {
    ok: bool,
    applied: usize,
    skipped: usize,
}

#[derive(Serialize)]
struct FailureSummary {
    ok: bool,
    reason: &'static str,
}

#[derive(Serialize)]
struct ExportOutput {
    ok: bool,
    path: String,
    count: usize,
}

#[derive(Serialize)]
struct ImportOutput {
    ok: bool,
    imported: usize,
    total: usize,
}

#[derive(Serialize)]
struct BackupOutput {
    ok: bool,
    path: String,
    file_count: usize,
}

#[derive(Serialize)]
struct DescribeOutput {
    file_id: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct OkOutput {
    ok: bool,
}

fn now_ms() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    elapsed.as_millis() as i64
}

fn format_timestamp(mtime_ms: i64) -> Option<String> {
    if mtime_ms <= 0 {
        return None;
    }
    let date = time::OffsetDateTime::from_unix_timestamp(mtime_ms.div_euclid(1000)).ok()?;
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    date.format(&format).ok()
}

fn print_help() {
    println!("podlink v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  podlink status                           Show current selection");
    println!("  podlink servers                          List known game servers");
    println!("  podlink folders                          List detected settings folders");
    println!("  podlink profiles                         List settings profiles");
    println!("  podlink characters [--group <id>]        List character settings files");
    println!("  podlink accounts                         List account settings files");
    println!("  podlink links                            List stored links");
    println!("  podlink links prune                      Drop links whose files are gone");
    println!("  podlink link <char> <account>            Link a character file to an account file");
    println!("  podlink unlink <char>                    Remove a character link");
    println!("  podlink autolink <char> [--window <ms>]  Link against the freshest account file");
    println!("  podlink groups                           List groups");
    println!("  podlink group new [name]                 Create a group");
    println!("  podlink group delete <id>                Delete a group");
    println!("  podlink group add <id> <char>            Add a group member");
    println!("  podlink group remove <id> <char>         Remove a group member");
    println!("  podlink group template <id> <char>       Mark the template member");
    println!("  podlink group add-linked <id> <account>  Add every character linked to an account");
    println!("  podlink apply group <id>                 Copy template settings over group members");
    println!("  podlink apply links <char>               Copy one linked pair over all linked pairs");
    println!("  podlink overwrite <source> [targets...]  Copy one settings file over others (--all)");
    println!("  podlink export [--out <dir>]             Export links to a JSON document");
    println!("  podlink import <file>                    Merge links from a JSON document");
    println!("  podlink backup                           Copy settings files into a Backup_ folder");
    println!("  podlink describe <file> [text|--clear]   Show, set, or clear a file description");
    println!("  podlink use server <id>                  Select the active server");
    println!("  podlink use folder <dir>                 Select the settings folder");
    println!("  podlink use profile <name>               Select the settings profile");
    println!("  podlink use group <id>                   Select the default group filter");
    println!("  podlink reset --yes                      Clear every saved setting");
    println!();
    println!("Global options:");
    println!("  --server <id>                            Override the active server");
    println!("  --folder <dir>                           Override the settings folder");
    println!("  --profile <name>                         Override the settings profile");
    println!("  --format <json|text>                     Output format");
    println!("  --offline                                Skip character name lookups");
    println!("  -q, --quiet                              Suppress progress notes");
    println!("  -h, --help                               Show help");
    println!("  -V, --version                            Show version");
}
