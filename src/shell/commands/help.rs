//! Help command implementation.

use crate::shell::command::{ArgKind, Command, CommandResult, ShellContext};

/// Command to display help information.
pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn aliases(&self) -> &[&str] {
        &["h", "?"]
    }

    fn description(&self) -> &str {
        "Display help information"
    }

    fn usage(&self) -> &str {
        "help [command]"
    }

    fn help(&self) -> &str {
        "Display help information about commands.\n\n\
         Without arguments, lists all available commands.\n\
         With a command name, shows detailed help for that command.\n\n\
         Examples:\n  \
           help\n  \
           help get\n  \
           ? ls"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        let Some(registry) = ctx.registry else {
            return CommandResult::error("Help not available (no registry)");
        };

        let Some(cmd_name) = args.first() else {
            let mut commands: Vec<_> = registry.commands().collect();
            commands.sort_by_key(|c| c.name());

            let mut output = String::from("Available commands:\n\n");
            for cmd in commands {
                let aliases = cmd.aliases();
                let alias_str = if aliases.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", aliases.join(", "))
                };
                output.push_str(&format!(
                    "  {:<26} - {}\n",
                    format!("{}{}", cmd.name(), alias_str),
                    cmd.description()
                ));
            }
            output.push_str("\nType 'help <command>' for detailed help on a specific command.");
            return CommandResult::success(output);
        };

        match registry.get(cmd_name) {
            Some(cmd) => {
                let aliases = cmd.aliases();
                let alias_str = if aliases.is_empty() {
                    String::new()
                } else {
                    format!("\nAliases: {}", aliases.join(", "))
                };
                CommandResult::success(format!(
                    "{}\n\nUsage: {}{}\n\n{}",
                    cmd.name().to_uppercase(),
                    cmd.usage(),
                    alias_str,
                    cmd.help()
                ))
            }
            None => CommandResult::error(format!(
                "Unknown command: '{}'\nType 'help' to see available commands.",
                cmd_name
            )),
        }
    }

    fn arg_kind(&self, arg_index: usize) -> ArgKind {
        if arg_index == 0 {
            ArgKind::Command
        } else {
            ArgKind::None
        }
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
