//! Typed command flags parsed with `clap`.
//!
//! A [`FlagSet`] lives as long as its command and is reused by every
//! invocation, so each [`FlagSet::parse`] starts by restoring defaults and
//! clearing the "changed" markers left by the previous run.

use std::collections::BTreeMap;
use std::fmt;

use clap::builder::BoolishValueParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction};

use crate::error::ShellError;

/// Name of the hidden flag injected into every command
pub const HELP_FLAG: &str = "help";

/// Annotation key holding completion values for a flag
pub const SUGGESTIONS_ANNOTATION: &str = "suggestions";

const POSITIONAL: &str = "__positional";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    String,
    Int,
    Float,
    StringList,
}

impl FlagKind {
    fn type_name(self) -> &'static str {
        match self {
            FlagKind::Bool => "",
            FlagKind::String => "string",
            FlagKind::Int => "int",
            FlagKind::Float => "float",
            FlagKind::StringList => "strings",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    Float(f64),
    List(Vec<String>),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Bool(_) => FlagKind::Bool,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Int(_) => FlagKind::Int,
            FlagValue::Float(_) => FlagKind::Float,
            FlagValue::List(_) => FlagKind::StringList,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            FlagValue::Bool(b) => !b,
            FlagValue::String(s) => s.is_empty(),
            FlagValue::Int(i) => *i == 0,
            FlagValue::Float(f) => *f == 0.0,
            FlagValue::List(l) => l.is_empty(),
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::String(s) => write!(f, "{}", s),
            FlagValue::Int(i) => write!(f, "{}", i),
            FlagValue::Float(x) => write!(f, "{}", x),
            FlagValue::List(l) => write!(f, "[{}]", l.join(",")),
        }
    }
}

/// A single named flag with its default, current value and metadata
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    shorthand: Option<char>,
    usage: String,
    default: FlagValue,
    value: FlagValue,
    hidden: bool,
    changed: bool,
    annotations: BTreeMap<String, Vec<String>>,
}

impl Flag {
    pub fn new(name: impl Into<String>, default: FlagValue, usage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shorthand: None,
            usage: usage.into(),
            value: default.clone(),
            default,
            hidden: false,
            changed: false,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_shorthand(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    /// Hidden flags parse normally but are left out of usage text and completion
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.annotations.insert(key.into(), values);
        self
    }

    /// Shorthand for the `suggestions` annotation used by value completion
    pub fn with_suggestions<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_annotation(SUGGESTIONS_ANNOTATION, values.into_iter().map(Into::into).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn kind(&self) -> FlagKind {
        self.default.kind()
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the last parse set this flag on the command line
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn annotation(&self, key: &str) -> Option<&[String]> {
        self.annotations.get(key).map(|v| v.as_slice())
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).long(self.name.clone());
        if let Some(short) = self.shorthand {
            arg = arg.short(short);
        }

        match self.kind() {
            FlagKind::Bool => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            FlagKind::String => arg
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(String)),
            FlagKind::Int => arg
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(i64)),
            FlagKind::Float => arg
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(f64)),
            FlagKind::StringList => arg
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(clap::value_parser!(String)),
        }
    }

    fn read_value(&self, matches: &clap::ArgMatches) -> FlagValue {
        let id = self.name.as_str();
        match self.kind() {
            FlagKind::Bool => FlagValue::Bool(matches.get_one::<bool>(id).copied().unwrap_or(true)),
            FlagKind::String => FlagValue::String(matches.get_one::<String>(id).cloned().unwrap_or_default()),
            FlagKind::Int => FlagValue::Int(matches.get_one::<i64>(id).copied().unwrap_or_default()),
            FlagKind::Float => FlagValue::Float(matches.get_one::<f64>(id).copied().unwrap_or_default()),
            FlagKind::StringList => FlagValue::List(
                matches
                    .get_many::<String>(id)
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            ),
        }
    }
}

/// The flags owned by one command, plus the positional arguments left
/// over from the last parse
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: String,
    flags: BTreeMap<String, Flag>,
    args: Vec<String>,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: BTreeMap::new(),
            args: Vec::new(),
        }
    }

    /// Register a flag. Redefining a name or shorthand is ignored.
    pub fn add(&mut self, flag: Flag) -> &mut Self {
        if self.flags.contains_key(&flag.name) {
            tracing::warn!(flag_set = %self.name, flag = %flag.name, "flag redefined, ignoring");
            return self;
        }
        if let Some(short) = flag.shorthand {
            if self.flags.values().any(|f| f.shorthand == Some(short)) {
                tracing::warn!(flag_set = %self.name, flag = %flag.name, %short, "shorthand already in use, ignoring");
                return self;
            }
        }
        self.flags.insert(flag.name.clone(), flag);
        self
    }

    pub fn bool(&mut self, name: &str, shorthand: Option<char>, default: bool, usage: &str) -> &mut Self {
        self.add(with_short(Flag::new(name, FlagValue::Bool(default), usage), shorthand))
    }

    pub fn string(&mut self, name: &str, shorthand: Option<char>, default: &str, usage: &str) -> &mut Self {
        self.add(with_short(Flag::new(name, FlagValue::String(default.to_string()), usage), shorthand))
    }

    pub fn int(&mut self, name: &str, shorthand: Option<char>, default: i64, usage: &str) -> &mut Self {
        self.add(with_short(Flag::new(name, FlagValue::Int(default), usage), shorthand))
    }

    pub fn float(&mut self, name: &str, shorthand: Option<char>, default: f64, usage: &str) -> &mut Self {
        self.add(with_short(Flag::new(name, FlagValue::Float(default), usage), shorthand))
    }

    pub fn string_list(&mut self, name: &str, shorthand: Option<char>, default: &[&str], usage: &str) -> &mut Self {
        let default = default.iter().map(|s| s.to_string()).collect();
        self.add(with_short(Flag::new(name, FlagValue::List(default), usage), shorthand))
    }

    /// Attach an annotation to an already registered flag
    pub fn annotate(&mut self, name: &str, key: &str, values: Vec<String>) -> bool {
        match self.flags.get_mut(name) {
            Some(flag) => {
                flag.annotations.insert(key.to_string(), values);
                true
            }
            None => false,
        }
    }

    pub fn set_hidden(&mut self, name: &str, hidden: bool) -> bool {
        match self.flags.get_mut(name) {
            Some(flag) => {
                flag.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    /// All flags, sorted by name
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values().filter(|f| !f.hidden)
    }

    /// Flags set on the command line during the last parse
    pub fn changed(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values().filter(|f| f.changed)
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(|f| f.changed)
    }

    /// Positional arguments left after flag removal
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Clear every changed marker and restore default values
    pub fn reset(&mut self) {
        for flag in self.flags.values_mut() {
            flag.changed = false;
            flag.value = flag.default.clone();
        }
        self.args.clear();
    }

    /// Parse raw arguments, marking the flags that were set
    pub fn parse(&mut self, args: &[String]) -> Result<(), ShellError> {
        self.reset();

        let matches = self
            .to_command()
            .try_get_matches_from(args.iter())
            .map_err(|e| ShellError::Parse(clap_message(&e)))?;

        for flag in self.flags.values_mut() {
            if matches.value_source(&flag.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            flag.value = flag.read_value(&matches);
            flag.changed = true;
        }

        self.args = matches
            .get_many::<String>(POSITIONAL)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        Ok(())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.lookup(name)?.value() {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.lookup(name)?.value() {
            FlagValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.lookup(name)?.value() {
            FlagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.lookup(name)?.value() {
            FlagValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        match self.lookup(name)?.value() {
            FlagValue::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Render every visible flag, one per line, aligned on the usage column
    pub fn defaults_usage(&self) -> String {
        let rows: Vec<(String, String)> = self
            .visible()
            .map(|flag| {
                let mut left = match flag.shorthand {
                    Some(short) => format!("  -{}, --{}", short, flag.name),
                    None => format!("      --{}", flag.name),
                };
                let type_name = flag.kind().type_name();
                if !type_name.is_empty() {
                    left.push(' ');
                    left.push_str(type_name);
                }

                let mut right = flag.usage.clone();
                if !flag.default.is_zero() {
                    match &flag.default {
                        FlagValue::String(s) => right.push_str(&format!(" (default \"{}\")", s)),
                        other => right.push_str(&format!(" (default {})", other)),
                    }
                }
                (left, right)
            })
            .collect();

        let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
        rows.iter()
            .map(|(left, right)| format!("{:<width$}   {}\n", left, right, width = width))
            .collect()
    }

    /// Add the hidden help flag unless one already exists
    pub(crate) fn ensure_help(&mut self) {
        if self.flags.contains_key(HELP_FLAG) {
            return;
        }
        let mut help = Flag::new(HELP_FLAG, FlagValue::Bool(false), "Prints this help").with_hidden(true);
        if !self.flags.values().any(|f| f.shorthand == Some('h')) {
            help = help.with_shorthand('h');
        }
        self.flags.insert(HELP_FLAG.to_string(), help);
    }

    fn to_command(&self) -> clap::Command {
        let positional = Arg::new(POSITIONAL)
            .action(ArgAction::Append)
            .num_args(1..)
            .allow_negative_numbers(true)
            .value_parser(clap::value_parser!(String));

        self.flags.values().fold(
            clap::Command::new(self.name.clone())
                .no_binary_name(true)
                .disable_help_flag(true)
                .disable_version_flag(true)
                .args_override_self(true)
                .arg(positional),
            |cmd, flag| cmd.arg(flag.to_arg()),
        )
    }
}

fn with_short(flag: Flag, shorthand: Option<char>) -> Flag {
    match shorthand {
        Some(short) => flag.with_shorthand(short),
        None => flag,
    }
}

/// First line of a clap error, without its `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
