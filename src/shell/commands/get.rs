//! Get command implementation.

use std::path::{Path, PathBuf};

use crate::shell::command::{ArgKind, Command, CommandResult, ShellContext};

/// Command to export a zip bundle or file to disk.
pub struct GetCommand;

impl Command for GetCommand {
    fn name(&self) -> &str {
        "get"
    }

    fn aliases(&self) -> &[&str] {
        &["g", "export"]
    }

    fn description(&self) -> &str {
        "Export a zip bundle or file"
    }

    fn usage(&self) -> &str {
        "get <identifier> [output]"
    }

    fn help(&self) -> &str {
        "Build the export bytes for a zip bundle or file and write them to disk.\n\n\
         Files are PKCS #12 containers protected by the shared export password\n\
         (see 'password'). Zip bundles hold one container per selected identity.\n\n\
         Arguments:\n  \
           <identifier> - Zip or file identifier as printed by ls\n  \
           [output]     - Destination path (default: the node's display name)\n\n\
         Examples:\n  \
           get PIV.zip\n  \
           get All.my-key /tmp/my-key.p12"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        let Some(identifier) = args.first().copied() else {
            return CommandResult::error(format!(
                "Usage: {}\nMissing identifier",
                self.usage()
            ));
        };

        log::debug!("Exporting '{}'", identifier);
        let bytes = match ctx.host.resolve(identifier) {
            Ok(bytes) => bytes,
            Err(e) => return CommandResult::error(e.to_string()),
        };

        let output = match args.get(1) {
            Some(path) => PathBuf::from(path),
            None => match ctx.host.item(identifier) {
                Ok(node) => match default_output(&node.display_name) {
                    Some(path) => path,
                    None => {
                        return CommandResult::error(format!(
                            "Cannot derive a file name from '{}'; give an output path",
                            node.display_name
                        ));
                    }
                },
                Err(e) => return CommandResult::error(e.to_string()),
            },
        };

        if let Err(e) = std::fs::write(&output, &bytes) {
            log::warn!("Failed to write '{}' to {}: {}", identifier, output.display(), e);
            return CommandResult::error(format!(
                "Failed to write {}: {}",
                output.display(),
                e
            ));
        }

        ctx.remember([identifier.to_string()]);
        log::info!("Exported '{}' to {}", identifier, output.display());
        CommandResult::success(format!(
            "Wrote {} bytes to {}",
            bytes.len(),
            output.display()
        ))
    }

    fn arg_kind(&self, arg_index: usize) -> ArgKind {
        match arg_index {
            0 => ArgKind::Identifier,
            1 => ArgKind::Path,
            _ => ArgKind::None,
        }
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// Output file when no path is given: the last component of the node's
/// display name, never a path outside the working directory.
fn default_output(display_name: &str) -> Option<PathBuf> {
    Path::new(display_name).file_name().map(PathBuf::from)
}
