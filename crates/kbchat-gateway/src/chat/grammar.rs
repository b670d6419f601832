//! Command grammar for chat messages
//!
//! Patterns are tried in order and the first match wins. `stats` and `help`
//! must match the whole line; the other commands are keyword prefixes.
//! Anything that matches no pattern is a search query.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use kbchat_store::DEFAULT_CATEGORY;

/// A parsed management command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        title: String,
        content: String,
        category: String,
    },
    Delete {
        term: String,
    },
    Update {
        term: String,
        content: String,
    },
    /// `None` lists every category
    List {
        category: Option<String>,
    },
    Stats,
    Help,
    Clear,
}

#[derive(Debug, Clone, Copy)]
enum CommandKind {
    Add,
    Delete,
    Update,
    List,
    Stats,
    Help,
    Clear,
}

lazy_static! {
    static ref GRAMMAR: Vec<(CommandKind, Regex)> = [
        (CommandKind::Add, r"(?i)^add:\s*(.+?)\s*\|\s*(.+?)(?:\s*\|\s*(.+?))?$"),
        (CommandKind::Delete, r"(?i)^delete:\s*(.+)$"),
        (CommandKind::Update, r"(?i)^update:\s*(.+?)\s*\|\s*(.+)$"),
        (CommandKind::List, r"(?i)^list(?:\s+(.+))?$"),
        (CommandKind::Stats, r"(?i)^(?:(?:show\s+)?stats?|database\s+info)$"),
        (CommandKind::Help, r"(?i)^help$"),
        (CommandKind::Clear, r"(?i)^clear(?:\s+(.+))?$"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("command pattern compiles")))
    .collect();
}

fn group(captures: &Captures<'_>, index: usize) -> Option<String> {
    captures
        .get(index)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

impl CommandKind {
    fn build(self, captures: &Captures<'_>) -> Option<Command> {
        let command = match self {
            Self::Add => Command::Add {
                title: group(captures, 1)?,
                content: group(captures, 2)?,
                category: group(captures, 3).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            },
            Self::Delete => Command::Delete {
                term: group(captures, 1)?,
            },
            Self::Update => Command::Update {
                term: group(captures, 1)?,
                content: group(captures, 2)?,
            },
            Self::List => Command::List {
                category: group(captures, 1).filter(|c| !c.eq_ignore_ascii_case("all")),
            },
            Self::Stats => Command::Stats,
            Self::Help => Command::Help,
            Self::Clear => Command::Clear,
        };
        Some(command)
    }
}

/// Classify a trimmed message. Returns `None` for search queries.
pub fn parse(message: &str) -> Option<Command> {
    GRAMMAR.iter().find_map(|(kind, pattern)| {
        pattern
            .captures(message)
            .and_then(|captures| kind.build(&captures))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn add(title: &str, content: &str, category: &str) -> Option<Command> {
        Some(Command::Add {
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
        })
    }

    #[test]
    fn add_with_category() {
        assert_eq!(
            parse("add: Test | Hello World | demo"),
            add("Test", "Hello World", "demo")
        );
    }

    #[test]
    fn add_without_category_defaults_to_general() {
        assert_eq!(
            parse("ADD:HDMI 2.1|Latest standard"),
            add("HDMI 2.1", "Latest standard", "general")
        );
    }

    #[test]
    fn add_requires_content() {
        assert_eq!(parse("add: just a title"), None);
    }

    #[test]
    fn blank_fields_fall_through_to_search() {
        assert_eq!(parse("add:   | content"), None);
        assert_eq!(parse("add: title |   "), None);
        assert_eq!(parse("update:  | new content"), None);
        assert_eq!(
            parse("add: title | content |  "),
            add("title", "content", "general")
        );
    }

    #[test]
    fn delete_and_update_capture_terms() {
        assert_eq!(
            parse("delete: HDMI 2.1"),
            Some(Command::Delete {
                term: "HDMI 2.1".to_string()
            })
        );
        assert_eq!(
            parse("Update: HDMI 2.1 | Supports 8K | and more"),
            Some(Command::Update {
                term: "HDMI 2.1".to_string(),
                content: "Supports 8K | and more".to_string()
            })
        );
    }

    #[test]
    fn list_all_means_no_filter() {
        assert_eq!(parse("list"), Some(Command::List { category: None }));
        assert_eq!(parse("list all"), Some(Command::List { category: None }));
        assert_eq!(parse("LIST ALL"), Some(Command::List { category: None }));
        assert_eq!(
            parse("list technology"),
            Some(Command::List {
                category: Some("technology".to_string())
            })
        );
    }

    #[test]
    fn stats_aliases_are_anchored() {
        for message in ["stats", "stat", "show stats", "Database Info"] {
            assert_eq!(parse(message), Some(Command::Stats), "{message}");
        }
        assert_eq!(parse("stats for hdmi cables"), None);
        assert_eq!(parse("what database info is there"), None);
    }

    #[test]
    fn help_and_clear() {
        assert_eq!(parse("HELP"), Some(Command::Help));
        assert_eq!(parse("help me find hdmi"), None);
        assert_eq!(parse("clear"), Some(Command::Clear));
        assert_eq!(parse("clear cache please"), Some(Command::Clear));
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert_eq!(parse("what is hdmi"), None);
        assert_eq!(parse("listing of cables"), None);
        assert_eq!(parse("added: nothing"), None);
    }

    proptest! {
        #[test]
        fn add_extracts_every_field(
            title in "[A-Za-z0-9]([A-Za-z0-9 .-]{0,20}[A-Za-z0-9])?",
            content in "[A-Za-z0-9]([A-Za-z0-9 .,-]{0,40}[A-Za-z0-9])?",
            category in "[a-z]([a-z-]{0,12}[a-z])?",
        ) {
            let with_category = format!("add: {title} | {content} | {category}");
            prop_assert_eq!(parse(&with_category), add(&title, &content, &category));

            let without_category = format!("add: {title} | {content}");
            prop_assert_eq!(parse(&without_category), add(&title, &content, "general"));
        }

        #[test]
        fn list_passes_literal_category(category in "[a-z]([a-z-]{0,12}[a-z])?") {
            prop_assume!(category != "all");
            prop_assert_eq!(
                parse(&format!("list {category}")),
                Some(Command::List { category: Some(category.clone()) })
            );
        }
    }
}
