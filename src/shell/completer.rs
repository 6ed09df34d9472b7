//! Tab completion for command names, identifiers and output paths.

use rustyline::Context;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::shell::command::{ArgKind, CommandRegistry, complete_prefix};

/// Completer driven by each command's [`ArgKind`]s.
pub struct KeyshareCompleter {
    registry: Arc<CommandRegistry>,
    /// Identifiers seen by earlier commands (updated dynamically).
    identifiers: Arc<RwLock<BTreeSet<String>>>,
    files: FilenameCompleter,
}

/// The word under the cursor.
#[derive(Debug, PartialEq, Eq)]
struct Word {
    /// Words before this one on the line.
    index: usize,
    /// Byte offset where the word starts, including an opening quote.
    start: usize,
    /// Text typed so far, without quotes.
    partial: String,
    /// First word on the line, without quotes.
    command: Option<String>,
}

impl KeyshareCompleter {
    pub fn new(registry: Arc<CommandRegistry>, identifiers: Arc<RwLock<BTreeSet<String>>>) -> Self {
        Self {
            registry,
            identifiers,
            files: FilenameCompleter::new(),
        }
    }

    fn complete_command(&self, partial: &str) -> Vec<Pair> {
        self.registry
            .completions(partial)
            .into_iter()
            .map(|s| Pair {
                display: s.clone(),
                replacement: s,
            })
            .collect()
    }

    fn complete_identifier(&self, partial: &str) -> Vec<Pair> {
        let Ok(identifiers) = self.identifiers.read() else {
            return vec![];
        };
        complete_prefix(&identifiers, partial)
            .into_iter()
            .map(|id| Pair {
                replacement: quote(&id),
                display: id,
            })
            .collect()
    }

    /// Splits `line[..pos]` and locates the word being completed.
    fn current_word(&self, line: &str, pos: usize) -> Word {
        let before = &line[..pos];
        let mut words: Vec<(usize, String)> = Vec::new();
        let mut current: Option<(usize, String)> = None;
        let mut in_quote = false;

        for (i, ch) in before.char_indices() {
            match ch {
                '"' => {
                    in_quote = !in_quote;
                    current.get_or_insert((i, String::new()));
                }
                c if c.is_whitespace() && !in_quote => {
                    if let Some(word) = current.take() {
                        words.push(word);
                    }
                }
                c => current.get_or_insert((i, String::new())).1.push(c),
            }
        }

        let index = words.len();
        let command = words.into_iter().next().map(|(_, w)| w);
        let (start, partial) = current.unwrap_or((pos, String::new()));
        Word {
            index,
            start,
            partial,
            command,
        }
    }
}

fn quote(id: &str) -> String {
    if id.contains(char::is_whitespace) {
        format!("\"{}\"", id)
    } else {
        id.to_string()
    }
}

impl Completer for KeyshareCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = self.current_word(line, pos);

        if word.index == 0 {
            return Ok((word.start, self.complete_command(&word.partial)));
        }

        let kind = word
            .command
            .as_deref()
            .and_then(|name| self.registry.get(name))
            .map_or(ArgKind::None, |cmd| cmd.arg_kind(word.index - 1));

        let candidates = match kind {
            ArgKind::Identifier => self.complete_identifier(&word.partial),
            ArgKind::Command => self.complete_command(&word.partial),
            ArgKind::Path => return self.files.complete(line, pos, ctx),
            ArgKind::None => vec![],
        };
        Ok((word.start, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::register_all;

    fn setup_completer() -> KeyshareCompleter {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);

        let identifiers: BTreeSet<String> = ["All", "All User", "All User.zip", "All.zip", "PIV.auth"]
            .into_iter()
            .map(String::from)
            .collect();

        KeyshareCompleter::new(Arc::new(registry), Arc::new(RwLock::new(identifiers)))
    }

    #[test]
    fn test_complete_command_partial() {
        let completer = setup_completer();
        let completions = completer.complete_command("in");

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].display, "info");
    }

    #[test]
    fn test_complete_identifier_quotes_spaces() {
        let completer = setup_completer();
        let completions = completer.complete_identifier("All ");

        let replacements: Vec<&str> = completions.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(replacements, vec!["\"All User\"", "\"All User.zip\""]);

        let completions = completer.complete_identifier("P");
        assert_eq!(completions[0].replacement, "PIV.auth");
    }

    #[test]
    fn test_current_word_command() {
        let completer = setup_completer();

        let word = completer.current_word("ge", 2);
        assert_eq!(word.index, 0);
        assert_eq!(word.start, 0);
        assert_eq!(word.partial, "ge");
        assert_eq!(word.command, None);

        let word = completer.current_word("", 0);
        assert_eq!(word.index, 0);
        assert_eq!(word.partial, "");
    }

    #[test]
    fn test_current_word_argument() {
        let completer = setup_completer();

        let word = completer.current_word("get PI", 6);
        assert_eq!(word.index, 1);
        assert_eq!(word.start, 4);
        assert_eq!(word.partial, "PI");
        assert_eq!(word.command.as_deref(), Some("get"));

        let word = completer.current_word("get ", 4);
        assert_eq!(word.index, 1);
        assert_eq!(word.start, 4);
        assert_eq!(word.partial, "");
    }

    #[test]
    fn test_current_word_inside_quotes() {
        let completer = setup_completer();

        let word = completer.current_word("ls \"All Us", 10);
        assert_eq!(word.index, 1);
        assert_eq!(word.start, 3);
        assert_eq!(word.partial, "All Us");
        assert_eq!(word.command.as_deref(), Some("ls"));
    }

    #[test]
    fn test_current_word_quoted_multibyte_command() {
        let completer = setup_completer();

        let word = completer.current_word("\"é\" x", 6);
        assert_eq!(word.index, 1);
        assert_eq!(word.start, 5);
        assert_eq!(word.partial, "x");
        assert_eq!(word.command.as_deref(), Some("é"));

        let word = completer.current_word("\"get\" PI", 8);
        assert_eq!(word.command.as_deref(), Some("get"));
        assert_eq!(word.partial, "PI");
    }
}
