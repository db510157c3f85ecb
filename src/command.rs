use std::cell::{Ref, RefCell};
use std::fmt;

use crate::error::ShellError;
use crate::flags::{Flag, FlagSet, HELP_FLAG};
use crate::session::Session;
use crate::validation::Validator;

/// Behavior of a command: receives the session, the command itself (for flag
/// lookups) and the positional arguments left after flag parsing
pub type RunFn = Box<dyn Fn(&mut Session, &Command, &[String]) -> anyhow::Result<()>>;

/// Produces argument completions from the arguments typed so far
pub type SuggestFn = Box<dyn Fn(&Session, &[String]) -> Vec<String>>;

/// Result of a successful execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The run function was invoked and succeeded
    Completed,

    /// `--help` was given; usage was printed and run was skipped
    HelpShown,

    /// The input line held no words
    Empty,
}

/// A named unit of behavior.
///
/// Commands are registered behind an `Rc` and the same instance is shared by
/// every name, alias and scope it is reachable from. Only the flag state
/// changes after registration.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    summary: String,
    description: String,
    required_flags: Vec<String>,
    validator: Option<Validator>,
    run: Option<RunFn>,
    suggest: Option<SuggestFn>,
    eager_suggestions: bool,
    builtin: bool,
    propagate: bool,
    flags: RefCell<FlagSet>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let flags = FlagSet::new(name.clone());

        Self {
            name,
            aliases: Vec::new(),
            summary: String::new(),
            description: String::new(),
            required_flags: Vec::new(),
            validator: None,
            run: None,
            suggest: None,
            eager_suggestions: false,
            builtin: false,
            propagate: false,
            flags: RefCell::new(flags),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One-line description shown in listings and completions
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Longer description shown only in the command's usage
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flags(mut self, configure: impl FnOnce(&mut FlagSet)) -> Self {
        configure(self.flags.get_mut());
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.get_mut().add(flag);
        self
    }

    /// Fail validation unless `--name` is given on every invocation
    pub fn with_required_flag(mut self, name: impl Into<String>) -> Self {
        self.required_flags.push(name.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&mut Session, &Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.run = Some(Box::new(run));
        self
    }

    pub fn with_suggestions<F>(mut self, suggest: F) -> Self
    where
        F: Fn(&Session, &[String]) -> Vec<String> + 'static,
    {
        self.suggest = Some(Box::new(suggest));
        self
    }

    /// Offer argument suggestions before anything has been typed
    pub fn with_eager_suggestions(mut self, eager: bool) -> Self {
        self.eager_suggestions = eager;
        self
    }

    pub fn with_builtin(mut self, builtin: bool) -> Self {
        self.builtin = builtin;
        self
    }

    /// Make the command present in every current and future descendant
    /// of the scope it is added to
    pub fn with_propagation(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_flags(&self) -> &[String] {
        &self.required_flags
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn propagates(&self) -> bool {
        self.propagate
    }

    pub fn has_eager_suggestions(&self) -> bool {
        self.eager_suggestions
    }

    /// Flags with the values from the most recent invocation
    pub fn flags(&self) -> Ref<'_, FlagSet> {
        self.flags.borrow()
    }

    /// Registration hook: adds the hidden help flag once the user's flags
    /// are in place, so a user `-h` shorthand keeps precedence
    pub(crate) fn prepare(&self) {
        self.flags.borrow_mut().ensure_help();
    }

    /// Argument suggestions; commands without a provider suggest nothing
    pub fn suggestions(&self, session: &Session, args: &[String]) -> Vec<String> {
        self.suggest
            .as_ref()
            .map(|suggest| suggest(session, args))
            .unwrap_or_default()
    }

    /// Parse flags, short-circuit on `--help`, validate, then run.
    pub fn execute(&self, session: &mut Session, args: &[String]) -> Result<Outcome, ShellError> {
        tracing::debug!(command = %self.name, ?args, "executing command");

        // `parse` resets changed markers and values left by the previous call
        let positional = {
            let mut flags = self.flags.borrow_mut();
            flags.ensure_help();
            flags.parse(args)?;

            if flags.is_changed(HELP_FLAG) {
                None
            } else {
                if let Some(missing) = self.required_flags.iter().find(|name| !flags.is_changed(name)) {
                    return Err(ShellError::Validation(format!("required flag --{} not set", missing)));
                }
                Some(flags.args().to_vec())
            }
        };

        let Some(positional) = positional else {
            writeln!(session.out(), "{}", self.usage())?;
            return Ok(Outcome::HelpShown);
        };

        if let Some(validate) = &self.validator {
            validate(&positional).map_err(ShellError::Validation)?;
        }

        let run = self
            .run
            .as_ref()
            .ok_or_else(|| ShellError::Configuration(format!("'{}' command has no run function", self.name)))?;
        run(session, self, &positional)?;
        Ok(Outcome::Completed)
    }

    /// Human readable usage: descriptions, synopsis, flags and aliases
    pub fn usage(&self) -> String {
        let mut buf = format!("\n{}\n", self.summary);
        if !self.description.is_empty() {
            buf.push_str(&format!("{}\n", self.description));
        }
        buf.push_str(&format!("\nUsage:\n  {} [flags] [args...]\n", self.name));
        buf.push_str("\nFlags:\n");
        buf.push_str(&self.flags().defaults_usage());

        if !self.aliases.is_empty() {
            buf.push_str(&format!("\nAliases:\n  {}\n", self.aliases.join(", ")));
        }
        buf
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("builtin", &self.builtin)
            .field("propagate", &self.propagate)
            .finish_non_exhaustive()
    }
}
