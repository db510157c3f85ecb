use std::io::{self, Write};

use config::Configuration;
use crossterm::style::Stylize;

use crate::command::Outcome;
use crate::completion::{self, Completion};
use crate::error::ShellError;
use crate::scope::Scope;
use crate::token_stream::TokenStream;

/// Separator between scope names in the prompt label
pub const SCOPE_SEPARATOR: &str = ":";

/// The live path of scopes from the root to the current one, plus the
/// configuration store and output shared by every command.
///
/// The root scope is held apart from the pushed scopes, so the path can
/// never become empty.
pub struct Session {
    prefix: String,
    root: Scope,
    stack: Vec<Scope>,
    configuration: Configuration,
    out: Box<dyn Write>,
    exit_requested: bool,
}

impl Session {
    /// Create a session rooted at `root`, running its initialize hook
    pub fn new(prefix: impl Into<String>, root: Scope) -> Self {
        let mut session = Self {
            prefix: prefix.into(),
            root: root.clone(),
            stack: Vec::new(),
            configuration: Configuration::new(),
            out: Box::new(io::stdout()),
            exit_requested: false,
        };
        if let Some(initialize) = root.initializer() {
            initialize(&mut session);
        }
        session
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Send command output somewhere other than stdout
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Run the scope's initialize hook, then make it current
    pub fn push(&mut self, scope: Scope) {
        if let Some(initialize) = scope.initializer() {
            initialize(self);
        }
        tracing::debug!(scope = %scope.name(), depth = self.depth() + 1, "pushed scope");
        self.stack.push(scope);
    }

    /// Remove and return the current scope. At the root nothing is removed;
    /// termination is requested instead and `None` is returned.
    pub fn pop(&mut self) -> Option<Scope> {
        match self.stack.pop() {
            Some(scope) => {
                tracing::debug!(scope = %scope.name(), depth = self.depth(), "popped scope");
                Some(scope)
            }
            None => {
                self.request_exit();
                None
            }
        }
    }

    /// Ask the loop driving this session to stop after the current line
    pub fn request_exit(&mut self) {
        tracing::debug!("exit requested");
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Number of scopes on the path, root included; always at least 1
    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    pub fn current_scope(&self) -> &Scope {
        self.stack.last().unwrap_or(&self.root)
    }

    /// Scopes from the root to the current one
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        std::iter::once(&self.root).chain(self.stack.iter())
    }

    /// Prompt label: every scope name joined, followed by the prefix
    pub fn live_prefix(&self) -> String {
        let names: Vec<&str> = self.scopes().map(|s| s.name()).collect();
        format!("{}{}", names.join(SCOPE_SEPARATOR), self.prefix)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    /// Where commands write their output
    pub fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    /// Tokenize `line` and run it in the current scope
    pub fn dispatch(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let tokens = TokenStream::parse(line)?;
        self.dispatch_tokens(tokens.tokens())
    }

    fn dispatch_tokens(&mut self, tokens: &[String]) -> Result<Outcome, ShellError> {
        if tokens.is_empty() {
            return Ok(Outcome::Empty);
        }
        let scope = self.current_scope().clone();
        scope.execute(self, tokens)
    }

    /// Executor callback for one submitted line. Never fails: bad quoting
    /// is reported as a warning, command errors are printed.
    pub fn execute(&mut self, line: &str) {
        let tokens = match TokenStream::parse(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!(%line, error = %err, "discarding line");
                self.report(&err.to_string().yellow().to_string());
                return;
            }
        };

        if let Err(err) = self.dispatch_tokens(tokens.tokens()) {
            tracing::debug!(%line, error = %err, "command failed");
            self.report(&err.to_string().red().to_string());
        }
    }

    /// Unranked suggestions for the text before `cursor`.
    /// Lines that cannot be tokenized yield nothing.
    pub fn suggest(&self, line: &str, cursor: usize) -> Vec<Completion> {
        let Ok(stream) = TokenStream::before_cursor(line, cursor) else {
            return Vec::new();
        };
        let commands = self.current_scope().commands();
        completion::suggestions(self, stream.input(), &commands, stream.partial(), stream.tokens())
    }

    fn report(&mut self, message: &str) {
        if let Err(err) = writeln!(self.out, "{}", message) {
            tracing::error!(error = %err, "failed to write to session output");
        }
    }
}
