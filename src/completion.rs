use std::collections::BTreeMap;
use std::rc::Rc;

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::flags::SUGGESTIONS_ANNOTATION;
use crate::session::Session;

/// A completion suggestion
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    /// The actual value to insert
    pub value: String,

    /// Optional description for tooltips/help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Completion {
    /// Create a simple completion with just a value
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    /// Create a completion with a description
    pub fn with_description(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: Some(description.into()),
        }
    }
}

/// Suggestions for `line` given the commands of the active scope.
///
/// `word` is the raw word being typed and `args` the words typed so far,
/// command word included. Until the line names a command, every name and
/// alias is offered in sorted order; afterwards the matching command's
/// argument suggestions and visible flags are offered.
pub fn suggestions(
    session: &Session,
    line: &str,
    commands: &BTreeMap<String, Rc<Command>>,
    word: &str,
    args: &[String],
) -> Vec<Completion> {
    let line = line.trim_start();

    if let Some(command) = commands
        .iter()
        .find(|(key, _)| names_command(line, key))
        .map(|(_, command)| command)
    {
        let args = args.get(1..).unwrap_or(&[]);
        return argument_suggestions(session, command, word, args);
    }

    commands
        .iter()
        .map(|(key, command)| {
            if key == command.name() {
                Completion::with_description(key, command.summary())
            } else {
                Completion::with_description(
                    key,
                    format!("Alias for `{}`. {}", command.name(), command.summary()),
                )
            }
        })
        .collect()
}

/// `line` starts with `key` as a whole word
fn names_command(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn argument_suggestions(session: &Session, command: &Command, word: &str, args: &[String]) -> Vec<Completion> {
    let mut found = Vec::new();

    if !word.is_empty() || command.has_eager_suggestions() {
        found.extend(command.suggestions(session, args).into_iter().map(Completion::simple));
    }

    let flags = command.flags();
    found.extend(
        flags
            .visible()
            .map(|flag| Completion::with_description(format!("--{}", flag.name()), flag.usage())),
    );

    // `--name=` completes the values annotated on that flag
    if word.starts_with('-') && word.ends_with('=') {
        let name = word.trim_start_matches('-').trim_end_matches('=');
        if let Some(values) = flags
            .lookup(name)
            .and_then(|flag| flag.annotation(SUGGESTIONS_ANNOTATION))
        {
            found.extend(values.iter().map(Completion::simple));
        }
    }

    found
}

/// Fuzzy-rank completions against `term`, dropping those that do not match.
/// An empty term keeps everything in its original order.
pub fn rank(completions: Vec<Completion>, term: &str) -> Vec<Completion> {
    if term.is_empty() {
        return completions;
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(term, CaseMatching::Ignore, Normalization::Smart);

    let mut scored: Vec<(u32, Completion)> = completions
        .into_iter()
        .filter_map(|completion| {
            let mut buf = Vec::new();
            pattern
                .score(Utf32Str::new(&completion.value, &mut buf), &mut matcher)
                .map(|score| (score, completion))
        })
        .collect();

    // Stable, so equal scores keep the engine's order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, completion)| completion).collect()
}
