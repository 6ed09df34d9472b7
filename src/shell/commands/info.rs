//! Info command implementation.

use crate::namespace::NodeKind;
use crate::shell::command::{ArgKind, Command, CommandResult, ShellContext};
use crate::shell::commands::list::kind_label;

/// Command to show the metadata of one node.
pub struct InfoCommand;

impl Command for InfoCommand {
    fn name(&self) -> &str {
        "info"
    }

    fn aliases(&self) -> &[&str] {
        &["i", "stat"]
    }

    fn description(&self) -> &str {
        "Show node metadata"
    }

    fn usage(&self) -> &str {
        "info <identifier>"
    }

    fn help(&self) -> &str {
        "Show the metadata of a folder, zip bundle or file.\n\n\
         Arguments:\n  \
           <identifier> - Node identifier as printed by ls\n\n\
         Examples:\n  \
           info PIV.zip\n  \
           info \"All User.my-key\""
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        let Some(identifier) = args.first() else {
            return CommandResult::error(format!(
                "Usage: {}\nMissing identifier",
                self.usage()
            ));
        };

        let node = match ctx.host.item(identifier) {
            Ok(node) => node,
            Err(e) => return CommandResult::error(e.to_string()),
        };

        let parent = node
            .parent
            .as_ref()
            .map_or("-".to_string(), |p| {
                if p.encode().is_empty() {
                    "(root)".to_string()
                } else {
                    p.encode()
                }
            });

        let mut lines = vec![
            format!("Identifier:   {}", node.id()),
            format!("Parent:       {}", parent),
            format!("Name:         {}", node.display_name),
            format!("Kind:         {}", kind_label(&node)),
            format!("Content type: {}", node.content_type),
        ];
        match &node.kind {
            NodeKind::Folder { .. } => {}
            NodeKind::ZipFile { filter, size_bytes } => {
                lines.push(format!("View:         {}", filter));
                lines.push(format!("Size:         {} bytes", size_bytes));
            }
            NodeKind::LeafFile {
                credential_id,
                size_bytes,
                creation_date,
            } => {
                lines.push(format!("Credential:   {}", credential_id));
                lines.push(format!("Size:         {} bytes", size_bytes));
                lines.push(format!("Created:      {}", creation_date.to_rfc3339()));
            }
        }

        if !node.id().is_empty() {
            ctx.remember([node.id()]);
        }
        CommandResult::success(lines.join("\n"))
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
