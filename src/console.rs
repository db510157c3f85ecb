//! Interactive front end: a `rustyline` editor driving a [`Session`].

use std::borrow::Cow;
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crossterm::terminal::SetTitle;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    At, Cmd, CompletionType, Config, Context, EditMode, Editor, Helper, KeyCode, KeyEvent, Modifiers, Movement,
    Word,
};

use crate::builtins;
use crate::colors::ColorScheme;
use crate::command::Command;
use crate::completion_helper::CompletionHelper;
use crate::scope::Scope;
use crate::session::Session;

/// Settings for the interactive console
pub struct ConsoleConfig {
    pub title: String,
    pub prefix: String,
    pub max_suggestions: usize,
    pub color_scheme: ColorScheme,
    pub title_screen: Box<dyn Fn()>,
    pub history: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            title: "console".to_string(),
            prefix: "> ".to_string(),
            max_suggestions: 8,
            color_scheme: ColorScheme::default(),
            title_screen: Box::new(|| {}),
            history: None,
        }
    }
}

impl ConsoleConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn with_color_scheme(mut self, colors: ColorScheme) -> Self {
        self.color_scheme = colors;
        self
    }

    /// Printed once before the first prompt
    pub fn with_title_screen(mut self, screen: impl Fn() + 'static) -> Self {
        self.title_screen = Box::new(screen);
        self
    }

    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history = Some(path.into());
        self
    }
}

pub struct Console {
    config: ConsoleConfig,
    root: Scope,
    session: Rc<RefCell<Session>>,
}

impl Console {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ConsoleConfig::default())
    }

    /// Root scope `name` carrying the propagating built-ins
    pub fn with_config(name: impl Into<String>, config: ConsoleConfig) -> Self {
        let root = Scope::new(name, "");
        for command in builtins::console_builtins() {
            root.add_command(command);
        }
        let session = Session::new(config.prefix.clone(), root.clone());

        Self {
            config,
            root,
            session: Rc::new(RefCell::new(session)),
        }
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn add_scope(&self, scope: Scope) {
        self.root.add_sub_scope(scope);
    }

    pub fn add_command(&self, command: impl Into<Rc<Command>>) {
        self.root.add_command(command);
    }

    pub fn session(&self) -> &Rc<RefCell<Session>> {
        &self.session
    }

    /// Read and execute lines until the session asks to stop
    pub fn run(&mut self) -> anyhow::Result<()> {
        (self.config.title_screen)();
        let mut stdout = io::stdout();
        if let Err(err) = crossterm::execute!(stdout, SetTitle(&self.config.title)) {
            tracing::warn!(error = %err, "failed to set terminal title");
        }

        let mut editor = self.editor()?;
        if let Some(path) = &self.config.history
            && let Err(err) = editor.load_history(path)
        {
            tracing::debug!(path = %path.display(), error = %err, "no history loaded");
        }

        tracing::info!(title = %self.config.title, "console started");
        while !self.session.borrow().exit_requested() {
            let prompt = self.session.borrow().live_prefix();
            match editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }
                    self.session.borrow_mut().execute(&line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    self.session.borrow_mut().pop();
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(path) = &self.config.history
            && let Err(err) = editor.save_history(path)
        {
            tracing::warn!(path = %path.display(), error = %err, "failed to save history");
        }
        tracing::info!("console stopped");
        Ok(())
    }

    fn editor(&self) -> anyhow::Result<Editor<ConsoleHelper, DefaultHistory>> {
        let config = Config::builder()
            .edit_mode(EditMode::Emacs)
            .completion_type(CompletionType::List)
            .completion_prompt_limit(self.config.max_suggestions)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ConsoleHelper {
            session: Rc::clone(&self.session),
            colors: self.config.color_scheme,
            max_suggestions: self.config.max_suggestions,
        }));

        editor.bind_sequence(
            KeyEvent(KeyCode::Backspace, Modifiers::ALT),
            Cmd::Kill(Movement::BackwardWord(1, Word::Emacs)),
        );
        editor.bind_sequence(KeyEvent::alt('b'), Cmd::Move(Movement::BackwardWord(1, Word::Emacs)));
        editor.bind_sequence(
            KeyEvent::alt('f'),
            Cmd::Move(Movement::ForwardWord(1, At::AfterEnd, Word::Emacs)),
        );
        Ok(editor)
    }
}

struct ConsoleHelper {
    session: Rc<RefCell<Session>>,
    colors: ColorScheme,
    max_suggestions: usize,
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Ok(session) = self.session.try_borrow() else {
            return Ok((pos, Vec::new()));
        };
        let (start, completions) = CompletionHelper::new(&session, self.max_suggestions).complete(line, pos);

        let width = completions.iter().map(|c| c.value.len()).max().unwrap_or(0);
        let pairs = completions
            .into_iter()
            .map(|c| {
                let display = match c.description.as_deref() {
                    Some(description) if !description.is_empty() => format!(
                        "{}  {}",
                        self.colors.paint_suggestion(&format!("{:<width$}", c.value, width = width)),
                        self.colors.paint_description(description)
                    ),
                    _ => self.colors.paint_suggestion(&c.value),
                };
                Pair {
                    display,
                    replacement: c.value,
                }
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;

    /// Rest of the best suggestion when it extends the word being typed
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let session = self.session.try_borrow().ok()?;
        let (start, completions) = CompletionHelper::new(&session, 1).complete(line, pos);
        let typed = line.get(start..pos)?;
        if typed.is_empty() {
            return None;
        }
        let best = completions.into_iter().next()?;
        best.value
            .strip_prefix(typed)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

impl Highlighter for ConsoleHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.colors.paint_input(line))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, _default: bool) -> Cow<'b, str> {
        Cow::Owned(self.colors.paint_prefix(prompt))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(self.colors.paint_hint(hint))
    }
}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_root_has_builtins() {
        let console = Console::new("mercator");
        let commands = console.root().available_commands();
        for name in ["env", "exit", "get", "help", "pop", "quit", "set", "use"] {
            assert!(commands.contains(&name.to_string()), "missing {}", name);
        }
    }

    #[test]
    fn test_builtins_reach_added_scopes() {
        let console = Console::new("mercator");
        let child = Scope::new("binance", "");
        console.add_scope(child.clone());
        assert!(child.command("quit").is_some());
        assert!(child.command("pop").is_some());
    }

    #[test]
    fn test_config_builders() {
        let config = ConsoleConfig::default()
            .with_title("mercator")
            .with_prefix("$ ")
            .with_max_suggestions(3)
            .with_history("/tmp/history.txt");
        assert_eq!(config.title, "mercator");
        assert_eq!(config.prefix, "$ ");
        assert_eq!(config.max_suggestions, 3);
        assert_eq!(config.history, Some(PathBuf::from("/tmp/history.txt")));

        let console = Console::with_config("root", config);
        assert_eq!(console.session().borrow().live_prefix(), "root$ ");
    }
}
