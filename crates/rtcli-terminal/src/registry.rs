//! Command registry: an immutable forest of commands, groups, aliases and
//! separators.
//!
//! Entries keep their declared order for help listings. Lookup goes through
//! an index keyed by `(enclosing group, name)`, built once by
//! [`RegistryBuilder::build`], so dispatch never scans the table.

use std::collections::HashMap;
use std::fmt;

use rtcli_types::{CliError, Result};

use crate::args::{ArgSpec, BoundArguments, signature, validate_specs};
use crate::interpreter::{CommandOutput, Environment, Handler};

/// Position of an entry in the registry.
pub type EntryId = usize;

/// Framework commands that act on the session rather than on a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    EnterScript,
    ClearScript,
    PrintScript,
    RunScript,
}

/// What running a command does.
pub enum CommandAction {
    Handler(Box<dyn Handler>),
    Builtin(Builtin),
}

impl fmt::Debug for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandAction::Handler(_) => f.write_str("Handler(..)"),
            CommandAction::Builtin(b) => write!(f, "Builtin({b:?})"),
        }
    }
}

/// A leaf command.
#[derive(Debug)]
pub struct CommandEntry {
    pub name: String,
    pub help: String,
    pub args: Vec<ArgSpec>,
    pub group: Option<EntryId>,
    pub action: CommandAction,
}

/// An alternate name for a command or group, at its target's level.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub name: String,
    pub target: EntryId,
}

/// A named node that holds commands and subgroups.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub name: String,
    pub id: String,
    pub help: String,
    pub parent: Option<EntryId>,
}

/// One row of the command table.
#[derive(Debug)]
pub enum Entry {
    Command(CommandEntry),
    Alias(AliasEntry),
    Group(GroupEntry),
    /// Help section header; never matched against input.
    Separator {
        label: String,
        group: Option<EntryId>,
    },
}

/// Declaration of a command for [`RegistryBuilder`].
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub name: String,
    pub help: String,
    pub args: Vec<ArgSpec>,
    pub shortcuts: Vec<String>,
    /// Id of the enclosing group.
    pub group: Option<String>,
}

impl CommandDef {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            args: Vec::new(),
            shortcuts: Vec::new(),
            group: None,
        }
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    pub fn shortcut(mut self, name: impl Into<String>) -> Self {
        self.shortcuts.push(name.into());
        self
    }

    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group = Some(group_id.into());
        self
    }
}

/// Declaration of a group for [`RegistryBuilder`].
#[derive(Debug, Clone)]
pub struct GroupDef {
    pub name: String,
    /// Unique id; defaults to the name.
    pub id: Option<String>,
    pub help: String,
    pub shortcuts: Vec<String>,
    /// Id of the parent group.
    pub parent: Option<String>,
}

impl GroupDef {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            help: help.into(),
            shortcuts: Vec::new(),
            parent: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn shortcut(mut self, name: impl Into<String>) -> Self {
        self.shortcuts.push(name.into());
        self
    }

    pub fn in_group(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(parent_id.into());
        self
    }
}

enum Pending {
    Command(CommandDef, CommandAction),
    Group(GroupDef),
    Separator {
        label: String,
        group: Option<String>,
    },
}

/// Collects declarations in table order; [`RegistryBuilder::build`]
/// validates them and produces the immutable registry.
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<Pending>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a command backed by a closure.
    pub fn command<F>(&mut self, def: CommandDef, handler: F) -> &mut Self
    where
        F: Fn(&BoundArguments, &Environment<'_>) -> Result<CommandOutput> + 'static,
    {
        self.command_with(def, Box::new(handler))
    }

    /// Declare a command backed by any [`Handler`].
    pub fn command_with(&mut self, def: CommandDef, handler: Box<dyn Handler>) -> &mut Self {
        self.pending
            .push(Pending::Command(def, CommandAction::Handler(handler)));
        self
    }

    pub(crate) fn builtin(&mut self, def: CommandDef, builtin: Builtin) -> &mut Self {
        self.pending
            .push(Pending::Command(def, CommandAction::Builtin(builtin)));
        self
    }

    pub fn group(&mut self, def: GroupDef) -> &mut Self {
        self.pending.push(Pending::Group(def));
        self
    }

    /// Add a help section header at the root level.
    pub fn separator(&mut self, label: impl Into<String>) -> &mut Self {
        self.pending.push(Pending::Separator {
            label: label.into(),
            group: None,
        });
        self
    }

    /// Add a help section header inside a group.
    pub fn separator_in(&mut self, group_id: impl Into<String>, label: impl Into<String>) -> &mut Self {
        self.pending.push(Pending::Separator {
            label: label.into(),
            group: Some(group_id.into()),
        });
        self
    }

    /// Validate every declaration and freeze the table.
    pub fn build(self) -> Result<CommandRegistry> {
        let mut reg = CommandRegistry {
            entries: Vec::with_capacity(self.pending.len()),
            index: HashMap::new(),
        };
        let mut group_ids: HashMap<String, EntryId> = HashMap::new();

        for pending in self.pending {
            match pending {
                Pending::Group(def) => {
                    check_name(&def.name)?;
                    let id = def.id.clone().unwrap_or_else(|| def.name.clone());
                    if group_ids.contains_key(&id) {
                        return Err(CliError::InvalidRegistry(format!(
                            "duplicate group id '{id}'"
                        )));
                    }
                    let parent = lookup_group(&group_ids, def.parent.as_deref())?;
                    let entry_id = reg.push_named(
                        parent,
                        &def.name,
                        Entry::Group(GroupEntry {
                            name: def.name.clone(),
                            id: id.clone(),
                            help: def.help,
                            parent,
                        }),
                    )?;
                    group_ids.insert(id, entry_id);
                    reg.push_aliases(parent, entry_id, &def.shortcuts)?;
                },
                Pending::Command(def, action) => {
                    check_name(&def.name)?;
                    validate_specs(&def.args).map_err(|e| {
                        CliError::InvalidRegistry(format!("command '{}': {e}", def.name))
                    })?;
                    let group = lookup_group(&group_ids, def.group.as_deref())?;
                    let entry_id = reg.push_named(
                        group,
                        &def.name,
                        Entry::Command(CommandEntry {
                            name: def.name.clone(),
                            help: def.help,
                            args: def.args,
                            group,
                            action,
                        }),
                    )?;
                    reg.push_aliases(group, entry_id, &def.shortcuts)?;
                },
                Pending::Separator { label, group } => {
                    let group = lookup_group(&group_ids, group.as_deref())?;
                    reg.entries.push(Entry::Separator { label, group });
                },
            }
        }

        log::debug!(
            "command registry built: {} entries, {} names",
            reg.entries.len(),
            reg.index.len()
        );
        Ok(reg)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(CliError::InvalidRegistry(format!(
            "invalid command name '{name}'"
        )));
    }
    Ok(())
}

fn lookup_group(ids: &HashMap<String, EntryId>, id: Option<&str>) -> Result<Option<EntryId>> {
    match id {
        None => Ok(None),
        Some(id) => ids.get(id).copied().map(Some).ok_or_else(|| {
            CliError::InvalidRegistry(format!("group '{id}' is not declared before use"))
        }),
    }
}

/// Outcome of walking a token path through the registry.
#[derive(Debug)]
pub enum Resolved<'r> {
    /// The path ended on a group (`None` = root).
    Group(Option<EntryId>),
    /// A command was reached after `consumed` tokens.
    Command {
        id: EntryId,
        entry: &'r CommandEntry,
        consumed: usize,
    },
}

/// The immutable command table.
pub struct CommandRegistry {
    entries: Vec<Entry>,
    index: HashMap<(Option<EntryId>, String), EntryId>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CommandRegistry {
    fn push_named(&mut self, level: Option<EntryId>, name: &str, entry: Entry) -> Result<EntryId> {
        let key = (level, name.to_string());
        if self.index.contains_key(&key) {
            return Err(CliError::InvalidRegistry(format!(
                "duplicate name '{name}'{}",
                match level {
                    Some(g) => format!(" in group '{}'", self.path_of(Some(g))),
                    None => String::new(),
                }
            )));
        }
        let id = self.entries.len();
        self.entries.push(entry);
        self.index.insert(key, id);
        Ok(id)
    }

    fn push_aliases(&mut self, level: Option<EntryId>, target: EntryId, names: &[String]) -> Result<()> {
        for name in names {
            check_name(name)?;
            self.push_named(
                level,
                name,
                Entry::Alias(AliasEntry {
                    name: name.clone(),
                    target,
                }),
            )?;
        }
        Ok(())
    }

    /// All entries in declared order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Look up one name at one level, following aliases to their target.
    pub fn lookup(&self, level: Option<EntryId>, name: &str) -> Option<EntryId> {
        let id = *self.index.get(&(level, name.to_string()))?;
        match &self.entries[id] {
            Entry::Alias(alias) => Some(alias.target),
            _ => Some(id),
        }
    }

    /// Walk `tokens` from the root: groups first, then one command.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Resolved<'_>> {
        let mut level = None;
        for (i, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let id = self
                .lookup(level, token)
                .ok_or_else(|| CliError::UnknownCommand {
                    token: token.to_string(),
                    group_path: self.path_of(level),
                })?;
            match &self.entries[id] {
                Entry::Group(_) => level = Some(id),
                Entry::Command(entry) => {
                    return Ok(Resolved::Command {
                        id,
                        entry,
                        consumed: i + 1,
                    });
                },
                // Aliases are followed by `lookup` and separators are never
                // indexed.
                Entry::Alias(_) | Entry::Separator { .. } => {
                    return Err(CliError::UnknownCommand {
                        token: token.to_string(),
                        group_path: self.path_of(level),
                    });
                },
            }
        }
        Ok(Resolved::Group(level))
    }

    /// Space-separated names of `group` and its ancestors.
    pub fn path_of(&self, group: Option<EntryId>) -> String {
        let mut names = Vec::new();
        let mut cur = group;
        while let Some(id) = cur {
            match &self.entries[id] {
                Entry::Group(g) => {
                    names.push(g.name.as_str());
                    cur = g.parent;
                },
                _ => break,
            }
        }
        names.reverse();
        names.join(" ")
    }

    /// Full invocation path of a command, e.g. `root_1 shell status`.
    pub fn command_path(&self, id: EntryId) -> String {
        match &self.entries[id] {
            Entry::Command(cmd) => {
                let prefix = self.path_of(cmd.group);
                if prefix.is_empty() {
                    cmd.name.clone()
                } else {
                    format!("{prefix} {}", cmd.name)
                }
            },
            Entry::Group(_) => self.path_of(Some(id)),
            Entry::Alias(alias) => self.command_path(alias.target),
            Entry::Separator { label, .. } => label.clone(),
        }
    }

    /// Names of the aliases that point at `target`.
    pub fn aliases_of(&self, target: EntryId) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Alias(a) if a.target == target => Some(a.name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn level_of(&self, id: EntryId) -> Option<EntryId> {
        match &self.entries[id] {
            Entry::Command(c) => c.group,
            Entry::Group(g) => g.parent,
            Entry::Alias(a) => self.level_of(a.target),
            Entry::Separator { group, .. } => *group,
        }
    }

    /// Help listing for one level, in declared order.
    pub fn listing(&self, group: Option<EntryId>) -> String {
        let mut out = String::new();
        if let Some(g) = group {
            out.push_str(&format!("{}:\n", self.path_of(Some(g))));
        }
        for (id, entry) in self.entries.iter().enumerate() {
            if self.level_of(id) != group {
                continue;
            }
            match entry {
                Entry::Separator { label, .. } => {
                    out.push_str(&format!("\n  [{label}]\n"));
                },
                Entry::Command(cmd) => {
                    let first = cmd.help.lines().next().unwrap_or("");
                    out.push_str(&format!(
                        "  {:<28} {:<24} {first}\n",
                        cmd.name,
                        signature(&cmd.args)
                    ));
                },
                Entry::Alias(alias) => {
                    let target = match &self.entries[alias.target] {
                        Entry::Command(c) => c.name.as_str(),
                        Entry::Group(g) => g.name.as_str(),
                        _ => "",
                    };
                    out.push_str(&format!("  {:<28} -> {target}\n", alias.name));
                },
                Entry::Group(g) => {
                    out.push_str(&format!("  {:<28} {:<24} {}\n", g.name, "(group)", g.help));
                },
            }
        }
        out.trim_end().to_string()
    }

    /// Detailed help for one command.
    pub fn describe(&self, id: EntryId) -> String {
        let Some(Entry::Command(cmd)) = self.entries.get(id) else {
            return self.listing(Some(id));
        };
        let path = self.command_path(id);
        let mut out = format!("{path}: {}\n", cmd.help);
        let aliases = self.aliases_of(id);
        if !aliases.is_empty() {
            out.push_str(&format!("  shortcuts: {}\n", aliases.join(", ")));
        }
        out.push_str(&format!("  usage: {path} {}", signature(&cmd.args)));
        for (i, spec) in cmd.args.iter().enumerate() {
            out.push_str(&format!("\n  {i}: {spec:<12} {}", spec.help));
        }
        out.trim_end().to_string()
    }

    /// `help [path...]`: list a level or describe a command.
    pub fn help<S: AsRef<str>>(&self, path: &[S]) -> Result<String> {
        match self.resolve(path)? {
            Resolved::Group(group) => Ok(self.listing(group)),
            Resolved::Command { id, .. } => Ok(self.describe(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use rtcli_types::ArgKind;

    fn noop(_: &BoundArguments, _: &Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::None)
    }

    fn nested() -> CommandRegistry {
        let mut b = RegistryBuilder::new();
        b.group(GroupDef::new("root_1", "first root"))
            .group(GroupDef::new("root_2", "second root"))
            .group(
                GroupDef::new("shell", "Shell commands")
                    .id("shell_root_1")
                    .in_group("root_1")
                    .shortcut("sh"),
            )
            .group(
                GroupDef::new("shell", "Shell commands")
                    .id("shell_root_2")
                    .in_group("root_2"),
            )
            .command(CommandDef::new("status", "status one").in_group("shell_root_1"), noop)
            .command(CommandDef::new("status", "status two").in_group("shell_root_2"), noop)
            .separator("Top level")
            .command(
                CommandDef::new("rx", "Control receive mode.")
                    .arg(ArgSpec::required(ArgKind::U8, "0=Disable [1=Enable]"))
                    .shortcut("r"),
                noop,
            );
        b.build().unwrap()
    }

    fn resolved_id(reg: &CommandRegistry, line: &[&str]) -> EntryId {
        match reg.resolve(line).unwrap() {
            Resolved::Command { id, .. } => id,
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn same_name_under_different_parents() {
        let reg = nested();
        let one = resolved_id(&reg, &["root_1", "shell", "status"]);
        let two = resolved_id(&reg, &["root_2", "shell", "status"]);
        assert_ne!(one, two);
        assert_eq!(reg.command_path(one), "root_1 shell status");
        assert_eq!(reg.command_path(two), "root_2 shell status");
    }

    #[test]
    fn group_alias_resolves() {
        let reg = nested();
        assert_eq!(
            resolved_id(&reg, &["root_1", "sh", "status"]),
            resolved_id(&reg, &["root_1", "shell", "status"])
        );
    }

    #[test]
    fn command_alias_resolves_to_same_entry() {
        let reg = nested();
        assert_eq!(resolved_id(&reg, &["r"]), resolved_id(&reg, &["rx"]));
    }

    #[test]
    fn consumed_counts_path_tokens() {
        let reg = nested();
        match reg.resolve(&["root_2", "shell", "status", "extra"]).unwrap() {
            Resolved::Command { consumed, .. } => assert_eq!(consumed, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_token_names_enclosing_path() {
        let reg = nested();
        match reg.resolve(&["root_1", "shell", "stat"]) {
            Err(CliError::UnknownCommand { token, group_path }) => {
                assert_eq!(token, "stat");
                assert_eq!(group_path, "root_1 shell");
            },
            other => panic!("expected UnknownCommand, got {other:?}"),
        }
    }

    #[test]
    fn no_fallback_to_sibling_group() {
        let reg = nested();
        // `sh` only exists under root_1.
        assert!(reg.resolve(&["root_2", "sh", "status"]).is_err());
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let reg = nested();
        assert!(reg.resolve(&["RX"]).is_err());
        assert!(reg.resolve(&["rx_"]).is_err());
        assert!(reg.resolve(&["r", "1"]).is_ok());
        assert!(reg.resolve(&["stat"]).is_err());
    }

    #[test]
    fn separators_never_match() {
        let reg = nested();
        assert!(reg.resolve(&["Top"]).is_err());
        assert!(reg.resolve(&["[Top"]).is_err());
        assert!(
            reg.entries()
                .iter()
                .any(|e| matches!(e, Entry::Separator { .. }))
        );
    }

    #[test]
    fn ending_on_group_returns_group() {
        let reg = nested();
        match reg.resolve(&["root_1", "shell"]).unwrap() {
            Resolved::Group(Some(id)) => assert_eq!(reg.path_of(Some(id)), "root_1 shell"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            reg.resolve::<&str>(&[]).unwrap(),
            Resolved::Group(None)
        ));
    }

    #[test]
    fn listing_keeps_declared_order() {
        let reg = nested();
        let text = reg.listing(None);
        let root_1 = text.find("root_1").unwrap();
        let sep = text.find("[Top level]").unwrap();
        let rx = text.find("rx ").unwrap();
        let alias = text.find("-> rx").unwrap();
        assert!(root_1 < sep && sep < rx && rx < alias);
        assert!(!text.contains("status"));
    }

    #[test]
    fn describe_lists_shortcuts_and_args() {
        let reg = nested();
        let text = reg.help(&["r"]).unwrap();
        assert!(text.starts_with("rx: Control receive mode."));
        assert!(text.contains("shortcuts: r"));
        assert!(text.contains("usage: rx uint8"));
        assert!(text.contains("0=Disable [1=Enable]"));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("tx", ""), noop)
            .command(CommandDef::new("tx", ""), noop);
        assert!(matches!(b.build(), Err(CliError::InvalidRegistry(_))));
    }

    #[test]
    fn alias_clash_rejected() {
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("tx", ""), noop)
            .command(CommandDef::new("txAt", "").shortcut("tx"), noop);
        assert!(b.build().is_err());
    }

    #[test]
    fn undeclared_group_rejected() {
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("status", "").in_group("nope"), noop);
        assert!(b.build().is_err());
    }

    #[test]
    fn duplicate_group_id_rejected() {
        let mut b = RegistryBuilder::new();
        b.group(GroupDef::new("a", "")).group(GroupDef::new("b", "").id("a"));
        assert!(b.build().is_err());
    }

    #[test]
    fn bad_spec_order_rejected() {
        let mut b = RegistryBuilder::new();
        b.command(
            CommandDef::new("bad", "")
                .arg(ArgSpec::optional(ArgKind::U8, ""))
                .arg(ArgSpec::required(ArgKind::U8, "")),
            noop,
        );
        assert!(b.build().is_err());
    }

    #[test]
    fn whitespace_in_name_rejected() {
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("two words", ""), noop);
        assert!(b.build().is_err());
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("", ""), noop);
        assert!(b.build().is_err());
    }

    #[test]
    fn closure_handlers_capture_state() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut b = RegistryBuilder::new();
        b.command(CommandDef::new("ping", ""), move |_, _| {
            counter.set(counter.get() + 1);
            Ok(CommandOutput::None)
        });
        let reg = b.build().unwrap();
        let Resolved::Command { entry, .. } = reg.resolve(&["ping"]).unwrap() else {
            panic!("expected command");
        };
        let CommandAction::Handler(handler) = &entry.action else {
            panic!("expected handler");
        };
        let env = Environment {
            endpoint: "test",
            command: "ping",
            replaying: false,
        };
        handler.execute(&BoundArguments::default(), &env).unwrap();
        assert_eq!(hits.get(), 1);
    }
}
