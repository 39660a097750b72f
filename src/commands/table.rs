//! The command table.
//!
//! Built once from one or more JSON documents, validated, indexed by
//! normalized input, and read-only afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::intent::{CommandCategory, Intent};
use super::normalize;

/// The command table shipped with the binary.
const BUILTIN_COMMANDS: &str = include_str!("../../data/commands.json");

/// Errors raised while building a command table.
#[derive(Debug, Error)]
pub enum TableError {
    /// A document is not valid JSON, or an entry lacks `input`/`output`.
    #[error("Invalid command document #{document}: {error}")]
    Parse {
        document: usize,
        #[source]
        error: serde_json::Error,
    },

    /// An entry's input is empty after normalization.
    #[error("Command #{index} in document #{document} has an empty input")]
    EmptyInput { document: usize, index: usize },

    /// Two entries share a normalized input under the `reject` policy.
    #[error("Duplicate command '{input}': \"{existing}\" vs \"{duplicate}\"")]
    DuplicateEntry {
        input: String,
        existing: String,
        duplicate: String,
    },

    /// A command file could not be read.
    #[error("Could not read command file {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The process-wide table was already installed.
    #[error("Command table is already installed")]
    AlreadyInstalled,
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// How to reconcile two entries with the same normalized input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail the load with [`TableError::DuplicateEntry`].
    #[default]
    Reject,
    /// Keep the later output, at the earlier entry's position.
    LastWriteWins,
    /// Keep the earlier output and drop the later one.
    FirstWriteWins,
}

/// An entry as it appears in a command document.
#[derive(Debug, Deserialize)]
struct RawEntry {
    input: String,
    output: String,
    #[serde(default)]
    category: Option<CommandCategory>,
}

/// A single trigger phrase and its response template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    /// Normalized trigger phrase, unique within the table.
    pub input: String,
    /// Response template returned or filled in by the dispatcher.
    pub output: String,
    /// Category, explicit or derived from the phrase.
    pub category: CommandCategory,
    /// Routing intent, fixed at load time.
    pub intent: Intent,
}

impl CommandEntry {
    /// Create an entry, normalizing the input and classifying it.
    ///
    /// An explicit category takes precedence over the derived one.
    pub fn new(
        input: &str,
        output: impl Into<String>,
        category: Option<CommandCategory>,
    ) -> Self {
        let input = normalize(input);
        let category = category.unwrap_or_else(|| CommandCategory::classify(&input));
        let intent = Intent::resolve(category, &input);
        Self {
            input,
            output: output.into(),
            category,
            intent,
        }
    }
}

/// An immutable, indexed table of commands.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    /// Entries in insertion order.
    entries: Vec<CommandEntry>,
    /// Normalized input to position in `entries`.
    index: HashMap<String, usize>,
}

impl CommandTable {
    /// Load a table from a single JSON document, rejecting duplicates.
    pub fn load(source: &[u8]) -> Result<Self> {
        Self::load_sources([source], DuplicatePolicy::Reject)
    }

    /// Load a table from several JSON documents merged in order.
    pub fn load_sources<'a, I>(sources: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut builder = TableBuilder::new(policy);
        for (document, source) in sources.into_iter().enumerate() {
            let raw: Vec<RawEntry> = serde_json::from_slice(source)
                .map_err(|error| TableError::Parse { document, error })?;
            debug!(document, entries = raw.len(), "Parsed command document");
            builder.extend(document, raw)?;
        }
        let table = builder.finish();
        info!(entries = table.len(), ?policy, "Command table loaded");
        Ok(table)
    }

    /// Load a table from command files merged in order.
    pub fn load_files<P: AsRef<Path>>(paths: &[P], policy: DuplicatePolicy) -> Result<Self> {
        let documents = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                fs::read(path).map_err(|error| TableError::Io {
                    path: path.to_path_buf(),
                    error,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::load_sources(documents.iter().map(Vec::as_slice), policy)
    }

    /// The table embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::load(BUILTIN_COMMANDS.as_bytes())
    }

    /// Exact lookup of an already normalized input.
    pub fn lookup_exact(&self, normalized: &str) -> Option<&CommandEntry> {
        self.index.get(normalized).map(|&i| &self.entries[i])
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Entries of one category, in insertion order.
    pub fn by_category(&self, category: CommandCategory) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates entries while applying the duplicate policy.
struct TableBuilder {
    policy: DuplicatePolicy,
    table: CommandTable,
}

impl TableBuilder {
    fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            table: CommandTable::default(),
        }
    }

    fn extend(&mut self, document: usize, raw: Vec<RawEntry>) -> Result<()> {
        for (index, raw) in raw.into_iter().enumerate() {
            let entry = CommandEntry::new(&raw.input, raw.output, raw.category);
            if entry.input.is_empty() {
                return Err(TableError::EmptyInput { document, index });
            }
            self.insert(entry)?;
        }
        Ok(())
    }

    fn insert(&mut self, entry: CommandEntry) -> Result<()> {
        let Some(&position) = self.table.index.get(&entry.input) else {
            self.table
                .index
                .insert(entry.input.clone(), self.table.entries.len());
            self.table.entries.push(entry);
            return Ok(());
        };

        let existing = &mut self.table.entries[position];
        warn!(
            input = %entry.input,
            existing = %existing.output,
            duplicate = %entry.output,
            policy = ?self.policy,
            "Duplicate command input"
        );

        match self.policy {
            DuplicatePolicy::Reject => Err(TableError::DuplicateEntry {
                input: entry.input,
                existing: existing.output.clone(),
                duplicate: entry.output,
            }),
            DuplicatePolicy::LastWriteWins => {
                *existing = entry;
                Ok(())
            }
            DuplicatePolicy::FirstWriteWins => Ok(()),
        }
    }

    fn finish(self) -> CommandTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::commands::intent::{LightingRequest, MediaAction};

    const VARIANT_A: &str = r#"[
        {"input": "exit", "output": "Closing assistant... Feel free to tap again when you need help."},
        {"input": "system info", "output": "ARC Hub v0.4.3 | WiFi: Connected | Memory: 65% free"},
        {"input": "test", "output": "System test successful! All functions working."}
    ]"#;

    const VARIANT_B: &str = r#"[
        {"input": "exit", "output": "Goodbye! Tap the screen to wake me."},
        {"input": "System Info", "output": "ARC Hub v0.4.2 | WiFi: Connected"},
        {"input": "test", "output": "Test OK."}
    ]"#;

    #[test]
    fn test_builtin_table_loads() {
        let table = CommandTable::builtin().unwrap();
        assert_eq!(table.len(), 33);
        assert_eq!(
            table.lookup_exact("hello").unwrap().output,
            "Hello! How can I assist you today?"
        );
    }

    #[test]
    fn test_builtin_intents_assigned_at_load() {
        let table = CommandTable::builtin().unwrap();
        assert_eq!(table.lookup_exact("time").unwrap().intent, Intent::Clock);
        assert_eq!(
            table.lookup_exact("what's the weather").unwrap().intent,
            Intent::Weather
        );
        assert_eq!(
            table.lookup_exact("turn off lights").unwrap().intent,
            Intent::Lighting(LightingRequest::off())
        );
        assert_eq!(
            table.lookup_exact("next song").unwrap().intent,
            Intent::Media(MediaAction::Next)
        );
        assert_eq!(table.lookup_exact("lights").unwrap().intent, Intent::Static);
        assert_eq!(
            table.lookup_exact("test").unwrap().category,
            CommandCategory::System
        );
    }

    #[test]
    fn test_load_normalizes_inputs() {
        let table = CommandTable::load(br#"[{"input": "  Turn   ON Lights ", "output": "ok"}]"#)
            .unwrap();
        assert!(table.lookup_exact("turn on lights").is_some());
        assert_eq!(table.entries()[0].input, "turn on lights");
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        // Unescaped quotes inside the output string.
        let source = br#"[{"input": "system info", "output": "ARC Hub "v0.4.3" | WiFi: Connected"}]"#;
        let err = CommandTable::load(source).unwrap_err();
        assert!(matches!(err, TableError::Parse { document: 0, .. }));
    }

    #[test]
    fn test_load_rejects_missing_output() {
        let err = CommandTable::load(br#"[{"input": "hello"}]"#).unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
        assert!(err.to_string().contains("output"));
    }

    #[test]
    fn test_load_rejects_missing_input() {
        let err = CommandTable::load(br#"[{"output": "hi"}]"#).unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
    }

    #[test]
    fn test_load_rejects_empty_input() {
        let err =
            CommandTable::load(br#"[{"input": "a", "output": "b"}, {"input": "   ", "output": "x"}]"#)
                .unwrap_err();
        assert!(matches!(
            err,
            TableError::EmptyInput {
                document: 0,
                index: 1
            }
        ));
    }

    #[test]
    fn test_load_rejects_case_insensitive_duplicates() {
        let err = CommandTable::load(
            br#"[{"input": "Hello", "output": "one"}, {"input": "hello", "output": "two"}]"#,
        )
        .unwrap_err();
        match err {
            TableError::DuplicateEntry {
                input,
                existing,
                duplicate,
            } => {
                assert_eq!(input, "hello");
                assert_eq!(existing, "one");
                assert_eq!(duplicate, "two");
            }
            other => panic!("Expected DuplicateEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_divergent_variants_rejected_by_default() {
        let err = CommandTable::load_sources(
            [VARIANT_A.as_bytes(), VARIANT_B.as_bytes()],
            DuplicatePolicy::Reject,
        )
        .unwrap_err();
        match err {
            TableError::DuplicateEntry { input, .. } => assert_eq!(input, "exit"),
            other => panic!("Expected DuplicateEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_divergent_variants_last_write_wins() {
        let table = CommandTable::load_sources(
            [VARIANT_A.as_bytes(), VARIANT_B.as_bytes()],
            DuplicatePolicy::LastWriteWins,
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.lookup_exact("exit").unwrap().output,
            "Goodbye! Tap the screen to wake me."
        );
        assert_eq!(
            table.lookup_exact("system info").unwrap().output,
            "ARC Hub v0.4.2 | WiFi: Connected"
        );
        assert_eq!(table.lookup_exact("test").unwrap().output, "Test OK.");
        // Position of the first occurrence is kept.
        let inputs: Vec<&str> = table.entries().iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["exit", "system info", "test"]);
    }

    #[test]
    fn test_divergent_variants_first_write_wins() {
        let table = CommandTable::load_sources(
            [VARIANT_A.as_bytes(), VARIANT_B.as_bytes()],
            DuplicatePolicy::FirstWriteWins,
        )
        .unwrap();

        assert_eq!(
            table.lookup_exact("system info").unwrap().output,
            "ARC Hub v0.4.3 | WiFi: Connected | Memory: 65% free"
        );
        assert_eq!(
            table.lookup_exact("test").unwrap().output,
            "System test successful! All functions working."
        );
    }

    #[test]
    fn test_parse_error_reports_document_index() {
        let err = CommandTable::load_sources(
            [VARIANT_A.as_bytes(), b"not json".as_slice()],
            DuplicatePolicy::LastWriteWins,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::Parse { document: 1, .. }));
    }

    #[test]
    fn test_load_files_merges_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::File::create(&first)
            .unwrap()
            .write_all(VARIANT_A.as_bytes())
            .unwrap();
        fs::File::create(&second)
            .unwrap()
            .write_all(VARIANT_B.as_bytes())
            .unwrap();

        let table =
            CommandTable::load_files(&[&first, &second], DuplicatePolicy::LastWriteWins).unwrap();
        assert_eq!(table.lookup_exact("test").unwrap().output, "Test OK.");
    }

    #[test]
    fn test_load_files_missing_file() {
        let err = CommandTable::load_files(&["/nonexistent/commands.json"], DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/commands.json"));
    }

    #[test]
    fn test_by_category() {
        let table = CommandTable::builtin().unwrap();
        let farewells: Vec<&str> = table
            .by_category(CommandCategory::Farewell)
            .map(|e| e.input.as_str())
            .collect();
        assert_eq!(farewells, vec!["goodbye", "bye", "exit"]);
    }
}
