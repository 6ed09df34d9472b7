//! Password command implementation.

use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to print the shared export password.
pub struct PasswordCommand;

impl Command for PasswordCommand {
    fn name(&self) -> &str {
        "password"
    }

    fn aliases(&self) -> &[&str] {
        &["pw"]
    }

    fn description(&self) -> &str {
        "Show the export password"
    }

    fn usage(&self) -> &str {
        "password"
    }

    fn help(&self) -> &str {
        "Print the password protecting every exported file and bundle.\n\n\
         The password is generated on first use and then kept in the vault."
    }

    fn execute(&self, _args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        log::info!("Export password requested from the shell");
        CommandResult::success(ctx.host.password_service().fetch_password())
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}
