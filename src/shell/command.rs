//! Command trait and registry for the shell.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::host::KeyShare;

/// Result of executing a command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Command executed successfully with optional message.
    Success(Option<String>),
    /// Command failed with error message.
    Error(String),
    /// Signal to exit the shell.
    Exit,
    /// Continue without output.
    Continue,
}

impl CommandResult {
    pub fn success(msg: impl Into<String>) -> Self {
        CommandResult::Success(Some(msg.into()))
    }

    pub fn ok() -> Self {
        CommandResult::Success(None)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        CommandResult::Error(msg.into())
    }
}

/// Context available to commands during execution.
pub struct ShellContext<'a> {
    pub host: &'a KeyShare,
    /// Registry, for the help command.
    pub registry: Option<&'a CommandRegistry>,
    /// Identifiers seen so far, offered as completions.
    pub identifiers: &'a mut BTreeSet<String>,
}

impl<'a> ShellContext<'a> {
    pub fn new(host: &'a KeyShare, identifiers: &'a mut BTreeSet<String>) -> Self {
        Self {
            host,
            registry: None,
            identifiers,
        }
    }

    pub fn with_registry(mut self, registry: &'a CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Records identifiers for later completion.
    pub fn remember<I: IntoIterator<Item = String>>(&mut self, identifiers: I) {
        self.identifiers
            .extend(identifiers.into_iter().filter(|id| !id.is_empty()));
    }
}

/// Kind of value a command argument takes, used for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Identifier,
    Command,
    Path,
    None,
}

/// A command that can be executed in the shell.
pub trait Command: Send + Sync {
    /// Returns the primary name of the command.
    fn name(&self) -> &str;

    /// Returns command aliases (alternative names).
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Returns a short description of the command.
    fn description(&self) -> &str;

    /// Returns usage information (e.g., "get <identifier> [output]").
    fn usage(&self) -> &str;

    /// Returns detailed help text.
    fn help(&self) -> &str {
        self.description()
    }

    /// Executes the command with the given arguments.
    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult;

    /// What the argument at `arg_index` (0-based) completes to.
    fn arg_kind(&self, _arg_index: usize) -> ArgKind {
        ArgKind::None
    }

    fn min_args(&self) -> usize {
        0
    }

    /// Maximum number of arguments (None = unlimited).
    fn max_args(&self) -> Option<usize> {
        None
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .field("description", &self.description())
            .finish()
    }
}

/// Registry of all available commands.
pub struct CommandRegistry {
    /// Commands indexed by their primary name.
    commands: HashMap<String, Arc<dyn Command>>,
    /// Alias to primary name mapping.
    aliases: HashMap<String, String>,
    /// Every name and alias, sorted for prefix completion.
    names: BTreeSet<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
            names: BTreeSet::new(),
        }
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_string();
        self.names.insert(name.clone());

        for alias in command.aliases() {
            self.aliases.insert(alias.to_string(), name.clone());
            self.names.insert(alias.to_string());
        }

        self.commands.insert(name, command);
    }

    /// Looks up a command by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        if let Some(cmd) = self.commands.get(name) {
            return Some(Arc::clone(cmd));
        }
        self.aliases
            .get(name)
            .and_then(|primary| self.commands.get(primary))
            .map(Arc::clone)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn completions(&self, prefix: &str) -> Vec<String> {
        complete_prefix(&self.names, prefix)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries of a sorted set that start with `prefix`.
pub fn complete_prefix(set: &BTreeSet<String>, prefix: &str) -> Vec<String> {
    set.range(prefix.to_string()..)
        .take_while(|s| s.starts_with(prefix))
        .cloned()
        .collect()
}
