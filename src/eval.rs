//! Nested prompt forwarding each line to an embedded expression evaluator.

use std::cell::RefCell;

use crossterm::style::Stylize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::command::Command;
use crate::session::{SCOPE_SEPARATOR, Session};
use crate::validation::no_args;

/// Printed instead of leaving when `exit` or `pop` is typed in the sub-shell
pub const EXIT_HINT: &str = "Press Ctrl-D to exit";

/// An embedded interpreter. State may persist between calls.
pub trait Evaluator {
    fn eval(&mut self, source: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalReply {
    Blank,
    Hint,
    Value(String),
    Error(String),
}

/// Line handling of the sub-shell, separate from the terminal
pub struct EvalShell<E> {
    evaluator: E,
}

impl<E: Evaluator> EvalShell<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn handle_line(&mut self, line: &str) -> EvalReply {
        match line.trim() {
            "" => EvalReply::Blank,
            "exit" | "pop" => EvalReply::Hint,
            source => match self.evaluator.eval(source) {
                Ok(value) => EvalReply::Value(value),
                Err(err) => EvalReply::Error(format!("{:#}", err)),
            },
        }
    }
}

/// Prompt label of the sub-shell: the session's scopes, then `eval`
pub fn eval_prefix(session: &Session) -> String {
    let mut names: Vec<&str> = session.scopes().map(|s| s.name()).collect();
    names.push("eval");
    format!("{}{}", names.join(SCOPE_SEPARATOR), session.prefix())
}

/// Built-in `eval` command running the sub-shell until Ctrl-D or Ctrl-C
pub fn eval_command<E: Evaluator + 'static>(evaluator: E) -> Command {
    let shell = RefCell::new(EvalShell::new(evaluator));

    Command::new("eval")
        .with_summary("Launch expression interpreter")
        .with_validator(no_args())
        .with_eager_suggestions(true)
        .with_run(move |session, _, _| {
            let prompt = eval_prefix(session);
            let mut editor = DefaultEditor::new()?;
            tracing::debug!(%prompt, "entering eval sub-shell");

            loop {
                let line = match editor.readline(&prompt) {
                    Ok(line) => line,
                    Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
                    Err(err) => return Err(err.into()),
                };
                editor.add_history_entry(line.as_str())?;

                match shell.borrow_mut().handle_line(&line) {
                    EvalReply::Blank => {}
                    EvalReply::Hint => writeln!(session.out(), "{}", EXIT_HINT)?,
                    EvalReply::Value(value) => writeln!(session.out(), "{}", value)?,
                    EvalReply::Error(err) => writeln!(session.out(), "{} {}", "error:".red(), err)?,
                }
            }

            tracing::debug!("leaving eval sub-shell");
            Ok(())
        })
        .with_builtin(true)
}
