//! The assistant: one utterance in, one reply out.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::capabilities::CapabilitySet;
use crate::commands::{CommandTable, Matcher};
use crate::config::Settings;
use crate::dispatch::{Dispatcher, Response};

/// Minimum score for a near miss to be offered as a hint.
const HINT_MIN_SCORE: f64 = 0.5;

/// Matches utterances against the command table and dispatches them.
///
/// Cheap to clone and safe to share across tasks; the table is read
/// without locking.
#[derive(Debug, Clone)]
pub struct Assistant {
    table: Arc<CommandTable>,
    matcher: Matcher,
    dispatcher: Dispatcher,
}

impl Assistant {
    pub fn new(table: Arc<CommandTable>, matcher: Matcher, dispatcher: Dispatcher) -> Self {
        Self {
            table,
            matcher,
            dispatcher,
        }
    }

    /// Build an assistant from settings and the available capabilities.
    pub fn from_settings(
        table: Arc<CommandTable>,
        settings: &Settings,
        capabilities: CapabilitySet,
    ) -> Self {
        info!(
            entries = table.len(),
            threshold = settings.match_threshold,
            ?capabilities,
            "Assistant ready"
        );
        Self::new(
            table,
            Matcher::new(settings.match_threshold),
            Dispatcher::from_settings(capabilities, settings),
        )
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Reply to one utterance.
    ///
    /// Never fails: unmatched input and capability failures both produce a
    /// normal reply.
    #[instrument(skip(self))]
    pub async fn handle(&self, utterance: &str) -> Response {
        let result = self.matcher.match_input(&self.table, utterance);

        let Some(entry) = result.entry else {
            debug!(confidence = result.confidence, "No command matched");
            return Response::no_match(self.no_match_text(utterance), result.confidence);
        };

        let mut response = self.dispatcher.dispatch(entry).await;
        response.confidence = result.confidence;
        response
    }

    /// The "didn't understand" reply, with a hint when something was close.
    fn no_match_text(&self, utterance: &str) -> String {
        let base = &self.dispatcher.fallbacks().no_match;
        match self.matcher.suggest(&self.table, utterance, 1).first() {
            Some(hint) if hint.score >= HINT_MIN_SCORE => {
                format!("{} Did you mean \"{}\"?", base, hint.entry.input)
            }
            _ => base.clone(),
        }
    }
}
