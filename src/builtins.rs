//! Commands every scope or console gets for free.


use anyhow::anyhow;

use crate::command::Command;
use crate::error::ShellError;
use crate::scope::{Scope, WeakScope};
use crate::validation::{exact_args, maximum_args};

/// Seed `use` and `help`, which both act on the scope that owns them
pub(crate) fn install_scope_builtins(scope: &Scope) {
    scope.add_command(use_command(scope.downgrade()));
    scope.add_command(help_command(scope.downgrade()));
}

/// Propagating built-ins installed on a console's root scope
pub fn console_builtins() -> Vec<Command> {
    vec![exit_command(), quit_command(), env_command(), get_command(), set_command()]
}

fn owner(scope: &WeakScope) -> anyhow::Result<Scope> {
    scope.upgrade().ok_or_else(|| anyhow!("scope no longer exists"))
}

fn use_command(scope: WeakScope) -> Command {
    let suggest_scope = scope.clone();
    Command::new("use")
        .with_summary("Use pushes a new scope onto the environment")
        .with_validator(exact_args(1))
        .with_eager_suggestions(true)
        .with_suggestions(move |_, _| {
            suggest_scope
                .upgrade()
                .map(|s| s.available_scopes())
                .unwrap_or_default()
        })
        .with_run(move |session, _, args| {
            let name = &args[0];
            let child = owner(&scope)?
                .sub_scope(name)
                .ok_or_else(|| ShellError::UnknownScope(name.clone()))?;
            session.push(child);
            Ok(())
        })
        .with_builtin(true)
}

fn help_command(scope: WeakScope) -> Command {
    let suggest_scope = scope.clone();
    Command::new("help")
        .with_summary("Prints help info")
        .with_validator(maximum_args(1))
        .with_eager_suggestions(true)
        .with_suggestions(move |_, _| {
            let Some(scope) = suggest_scope.upgrade() else {
                return Vec::new();
            };
            let mut names = scope.available_commands();
            names.extend(scope.available_scopes());
            names
        })
        .with_run(move |session, _, args| {
            let scope = owner(&scope)?;
            let text = match args.first() {
                None => scope.usage(),
                Some(name) => {
                    if let Some(command) = scope.command(name) {
                        command.usage()
                    } else if let Some(child) = scope.sub_scope(name) {
                        child.usage()
                    } else {
                        return Err(ShellError::Validation(format!("unknown argument '{}'", name)).into());
                    }
                }
            };
            writeln!(session.out(), "{}", text)?;
            Ok(())
        })
        .with_builtin(true)
}

fn exit_command() -> Command {
    Command::new("exit")
        .with_alias("pop")
        .with_summary("Exit pops a scope from the environment. Exits console if at the root scope.")
        .with_run(|session, _, _| {
            session.pop();
            Ok(())
        })
        .with_builtin(true)
        .with_propagation(true)
}

fn quit_command() -> Command {
    Command::new("quit")
        .with_summary("Exits the console regardless of scope")
        .with_run(|session, _, _| {
            session.request_exit();
            Ok(())
        })
        .with_builtin(true)
        .with_propagation(true)
}

fn env_command() -> Command {
    Command::new("env")
        .with_summary("env lists all the environment variables for the commands")
        .with_run(|session, _, _| {
            let config = session.configuration();
            let keys = config.all_keys();
            let width = keys.iter().map(|k| k.len()).max().unwrap_or(0);
            let listing: String = keys
                .iter()
                .map(|key| {
                    let value = config.display(key).unwrap_or_default();
                    format!("{:<width$}   {}\n", key, value, width = width)
                })
                .collect();
            write!(session.out(), "{}", listing)?;
            Ok(())
        })
        .with_builtin(true)
        .with_propagation(true)
}

fn get_command() -> Command {
    Command::new("get")
        .with_summary("Gets a current env var")
        .with_validator(exact_args(1))
        .with_eager_suggestions(true)
        .with_suggestions(|session, args| {
            if args.len() < 2 {
                session.configuration().all_keys()
            } else {
                Vec::new()
            }
        })
        .with_run(|session, _, args| {
            let value = session
                .configuration()
                .display(&args[0])
                .unwrap_or_else(|| "<unset>".to_string());
            writeln!(session.out(), "{}   {}", args[0], value)?;
            Ok(())
        })
        .with_builtin(true)
        .with_propagation(true)
}

fn set_command() -> Command {
    Command::new("set")
        .with_summary("Sets an env var")
        .with_validator(exact_args(2))
        .with_eager_suggestions(true)
        .with_suggestions(|session, args| {
            if args.len() < 2 {
                session.configuration().all_keys()
            } else {
                Vec::new()
            }
        })
        .with_run(|session, _, args| {
            session.configuration_mut().set_str(&args[0], &args[1]);
            Ok(())
        })
        .with_builtin(true)
        .with_propagation(true)
}
