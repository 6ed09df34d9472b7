//! Attrs command implementation.

use crate::shell::command::{ArgKind, Command, CommandResult, ShellContext};

/// Command to show the stored attributes of an identity.
pub struct AttrsCommand;

impl Command for AttrsCommand {
    fn name(&self) -> &str {
        "attrs"
    }

    fn aliases(&self) -> &[&str] {
        &["attributes", "a"]
    }

    fn description(&self) -> &str {
        "Show the attributes of an identity"
    }

    fn usage(&self) -> &str {
        "attrs <credential-id>"
    }

    fn help(&self) -> &str {
        "Show the attributes stored with an identity as label/value rows.\n\n\
         Attributes that are not recognised are still listed, as\n\
         'Unrecognized Attribute'.\n\n\
         Arguments:\n  \
           <credential-id> - Identity id (a root-level identifier from ls)\n\n\
         Examples:\n  \
           attrs my-key"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        let Some(id) = args.first() else {
            return CommandResult::error(format!(
                "Usage: {}\nMissing credential id",
                self.usage()
            ));
        };

        let rows = match ctx.host.attributes(id) {
            Ok(rows) => rows,
            Err(e) => return CommandResult::error(e.to_string()),
        };
        if rows.is_empty() {
            return CommandResult::success(format!("No attributes stored for '{}'.", id));
        }

        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let output = rows
            .iter()
            .map(|(label, value)| format!("{:<width$}  {}", label, value, width = width))
            .collect::<Vec<_>>()
            .join("\n");
        CommandResult::success(output)
    }

    fn arg_kind(&self, arg_index: usize) -> ArgKind {
        if arg_index == 0 {
            ArgKind::Identifier
        } else {
            ArgKind::None
        }
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
