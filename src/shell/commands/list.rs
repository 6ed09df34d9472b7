//! List command implementation.

use crate::namespace::{NodeKind, VirtualNode};
use crate::shell::command::{ArgKind, Command, CommandResult, ShellContext};

/// Command to list the children of the root or a folder.
pub struct ListCommand;

/// Short kind label used in listings.
pub(crate) fn kind_label(node: &VirtualNode) -> &'static str {
    match node.kind {
        NodeKind::Folder { .. } => "dir",
        NodeKind::ZipFile { .. } => "zip",
        NodeKind::LeafFile { .. } => "file",
    }
}

fn format_row(node: &VirtualNode) -> String {
    let size = node
        .size_bytes()
        .map(|n| format!("{} bytes", n))
        .unwrap_or_default();
    format!(
        "{:<5} {:<40} {:<28} {}",
        kind_label(node),
        node.id(),
        node.display_name,
        size
    )
    .trim_end()
    .to_string()
}

impl Command for ListCommand {
    fn name(&self) -> &str {
        "ls"
    }

    fn aliases(&self) -> &[&str] {
        &["list", "l"]
    }

    fn description(&self) -> &str {
        "List the root or a folder"
    }

    fn usage(&self) -> &str {
        "ls [container]"
    }

    fn help(&self) -> &str {
        "List the nodes under the root or under one folder.\n\n\
         Without arguments the whole root is listed: every identity, each\n\
         folder with its files, then each zip bundle.\n\n\
         Arguments:\n  \
           [container] - A folder name such as PIV or \"All User\"\n\n\
         Examples:\n  \
           ls\n  \
           ls PIV\n  \
           ls \"All User\""
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        let container = args.first().copied().unwrap_or("");
        log::debug!("Listing '{}'", container);

        let nodes = match ctx.host.enumerate(container) {
            Ok(nodes) => nodes,
            Err(e) => return CommandResult::error(e.to_string()),
        };

        ctx.remember(nodes.iter().map(VirtualNode::id));
        if nodes.is_empty() {
            return CommandResult::success("Nothing here.");
        }

        let output = nodes.iter().map(format_row).collect::<Vec<_>>().join("\n");
        log::info!("Listed {} nodes under '{}'", nodes.len(), container);
        CommandResult::success(output)
    }

    fn arg_kind(&self, arg_index: usize) -> ArgKind {
        if arg_index == 0 {
            ArgKind::Identifier
        } else {
            ArgKind::None
        }
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
