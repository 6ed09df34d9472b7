//! Shell module - rustyline-based interactive browser.
//!
//! This module provides a shell-like interface over a [`KeyShare`] host with:
//! - Command registry with aliases and help
//! - Completion of commands, identifiers and paths
//! - Persistent command history

pub mod command;
pub mod commands;
pub mod completer;

use anyhow::{Result, anyhow};
use rustyline::completion::{Completer, Pair};
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::host::KeyShare;
use crate::identifier::ROOT_IDENTIFIER;

use command::{CommandRegistry, CommandResult, ShellContext};
use commands::register_all;
use completer::KeyshareCompleter;

/// The prompt displayed to the user.
const PROMPT: &str = "keyshare> ";

/// rustyline helper; only completion is customised.
pub struct KeyshareHelper {
    completer: KeyshareCompleter,
}

impl Completer for KeyshareHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for KeyshareHelper {
    type Hint = String;
}

impl Highlighter for KeyshareHelper {}

impl Validator for KeyshareHelper {}

impl Helper for KeyshareHelper {}

/// Configuration for the shell.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Path to the history file.
    pub history_path: PathBuf,
    /// Maximum number of history entries to keep.
    pub max_history: usize,
    /// Whether to show the welcome message.
    pub show_welcome: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("history"),
            max_history: 1000,
            show_welcome: true,
        }
    }
}

impl ShellConfig {
    pub fn new(history_path: PathBuf) -> Self {
        Self {
            history_path,
            ..Default::default()
        }
    }
}

/// The interactive shell.
pub struct Shell {
    registry: Arc<CommandRegistry>,
    /// Identifiers for completion (shared with the helper).
    identifiers: Arc<RwLock<BTreeSet<String>>>,
    config: ShellConfig,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    pub fn with_config(config: ShellConfig) -> Self {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);

        Self {
            registry: Arc::new(registry),
            identifiers: Arc::new(RwLock::new(BTreeSet::new())),
            config,
        }
    }

    /// Seeds completion with everything under the root.
    fn init_identifiers(&self, host: &KeyShare) {
        let nodes = match host.enumerate(ROOT_IDENTIFIER) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("Could not enumerate root for completion: {}", e);
                return;
            }
        };
        if let Ok(mut identifiers) = self.identifiers.write() {
            identifiers.clear();
            identifiers.extend(nodes.iter().map(|n| n.id()).filter(|id| !id.is_empty()));
            log::debug!("Initialized completion with {} identifiers", identifiers.len());
        }
    }

    /// Runs the interactive shell until quit or EOF.
    pub fn run(&self, host: &KeyShare) -> Result<()> {
        self.init_identifiers(host);

        let helper = KeyshareHelper {
            completer: KeyshareCompleter::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.identifiers),
            ),
        };

        let mut editor: Editor<KeyshareHelper, FileHistory> = Editor::new()?;
        editor.set_helper(Some(helper));
        editor.set_max_history_size(self.config.max_history)?;
        editor.set_history_ignore_dups(true)?;
        editor.set_history_ignore_space(true);

        let history = &self.config.history_path;
        if history.exists() {
            if let Err(e) = editor.load_history(history) {
                log::warn!("Could not load history: {}", e);
            } else {
                log::debug!("Loaded history from {}", history.display());
            }
        }

        if self.config.show_welcome {
            println!("Vault unlocked. Type 'help' for available commands.");
        }
        log::info!("Shell started");

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line);

                    match self.execute_line(line, host)? {
                        CommandResult::Success(Some(msg)) => println!("{}", msg),
                        CommandResult::Error(msg) => eprintln!("Error: {}", msg),
                        CommandResult::Exit => break,
                        CommandResult::Success(None) | CommandResult::Continue => {}
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    log::debug!("Interrupted (Ctrl-C)");
                }
                Err(ReadlineError::Eof) => {
                    println!("exit");
                    log::info!("EOF received (Ctrl-D)");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {}", err);
                    log::error!("Readline error: {}", err);
                    break;
                }
            }
        }

        if let Some(parent) = history.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        if let Err(e) = editor.save_history(history) {
            log::warn!("Failed to save history: {}", e);
        } else {
            log::debug!("Saved history to {}", history.display());
        }

        log::info!("Shell exited");
        Ok(())
    }

    /// Parses and executes one command line.
    pub fn execute_line(&self, line: &str, host: &KeyShare) -> Result<CommandResult> {
        let mut identifiers = self
            .identifiers
            .write()
            .map_err(|e| anyhow!("Identifier set lock poisoned: {}", e))?;
        let mut ctx = ShellContext::new(host, &mut identifiers).with_registry(&self.registry);
        Ok(self.execute_with_context(line, &mut ctx))
    }

    fn execute_with_context(&self, line: &str, ctx: &mut ShellContext) -> CommandResult {
        let parts = match split_args(line) {
            Ok(parts) => parts,
            Err(e) => return CommandResult::error(e),
        };
        let Some((cmd_name, rest)) = parts.split_first() else {
            return CommandResult::Continue;
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        log::debug!("Executing command: {} with args: {:?}", cmd_name, args);

        let Some(cmd) = self.registry.get(cmd_name) else {
            return CommandResult::error(format!(
                "Unknown command: '{}'\nType 'help' to see available commands.",
                cmd_name
            ));
        };

        let too_many = cmd.max_args().is_some_and(|max| args.len() > max);
        if args.len() < cmd.min_args() || too_many {
            return CommandResult::error(format!("Usage: {}", cmd.usage()));
        }

        let start = std::time::Instant::now();
        let result = cmd.execute(&args, ctx);
        log::debug!("Command '{}' completed in {:?}", cmd.name(), start.elapsed());
        result
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a command line on whitespace, honouring double quotes.
///
/// `""` yields an empty argument, which names the root.
pub fn split_args(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;
    let mut in_quote = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.get_or_insert_with(String::new);
            }
            c if c.is_whitespace() && !in_quote => {
                if let Some(arg) = current.take() {
                    args.push(arg);
                }
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }

    if in_quote {
        return Err("Unterminated quote".to_string());
    }
    args.extend(current);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::test_host;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("ls").unwrap(), vec!["ls"]);
        assert_eq!(
            split_args("get  \"All User.zip\" out.zip").unwrap(),
            vec!["get", "All User.zip", "out.zip"]
        );
        assert_eq!(split_args("info \"\"").unwrap(), vec!["info", ""]);
        assert!(split_args("   ").unwrap().is_empty());
        assert!(split_args("ls \"All").is_err());
    }

    #[test]
    fn test_shell_creation() {
        let shell = Shell::new();
        assert_eq!(shell.registry.len(), 7);
    }

    #[test]
    fn test_execute_line_unknown_command() {
        let shell = Shell::new();
        let host = test_host();
        let result = shell.execute_line("unknown_cmd", &host).unwrap();
        assert!(matches!(result, CommandResult::Error(_)));
    }

    #[test]
    fn test_execute_line_argument_counts() {
        let shell = Shell::new();
        let host = test_host();
        assert!(matches!(
            shell.execute_line("info", &host).unwrap(),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            shell.execute_line("password extra", &host).unwrap(),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_execute_line_help_and_quit() {
        let shell = Shell::new();
        let host = test_host();
        assert!(matches!(
            shell.execute_line("help", &host).unwrap(),
            CommandResult::Success(Some(_))
        ));
        assert!(matches!(shell.execute_line("q", &host).unwrap(), CommandResult::Exit));
    }

    #[test]
    fn test_execute_line_quoted_folder() {
        let shell = Shell::new();
        let host = test_host();
        match shell.execute_line("ls \"All User\"", &host).unwrap() {
            CommandResult::Success(Some(msg)) => assert_eq!(msg.lines().count(), 3),
            _ => panic!("Expected listing"),
        }
        assert!(shell.identifiers.read().unwrap().contains("All User.enc"));
    }

    #[test]
    fn test_init_identifiers() {
        let shell = Shell::new();
        shell.init_identifiers(&test_host());

        let identifiers = shell.identifiers.read().unwrap();
        assert!(identifiers.contains("auth"));
        assert!(identifiers.contains("PIV.zip"));
        assert!(!identifiers.contains(""));
    }
}
