use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use scopeshell::builtins::console_builtins;
use scopeshell::{Command, Outcome, Scope, Session, ShellError};

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// mercator -> binance -> account, with the console built-ins on the root
fn mercator() -> (Session, SharedBuf) {
    let root = Scope::new("mercator", "");
    for command in console_builtins() {
        root.add_command(command);
    }
    let binance = Scope::new("binance", "Utilities for accessing the Binance crypto exchange");
    binance.add_command(Command::new("risk").with_run(|session, _, _| {
        writeln!(session.out(), "risk computed")?;
        Ok(())
    }));
    binance.add_sub_scope(Scope::new("account", "Access account info"));
    root.add_sub_scope(binance);

    let buf = SharedBuf::default();
    let session = Session::new("> ", root).with_output(buf.clone());
    (session, buf)
}

#[test]
fn test_starts_at_root() {
    let (session, _) = mercator();
    assert_eq!(session.depth(), 1);
    assert_eq!(session.current_scope().name(), "mercator");
    assert_eq!(session.live_prefix(), "mercator> ");
}

#[test]
fn test_use_pushes_and_exit_pops() {
    let (mut session, _) = mercator();

    session.dispatch("use binance").unwrap();
    assert_eq!(session.live_prefix(), "mercator:binance> ");

    session.dispatch("use account").unwrap();
    assert_eq!(session.live_prefix(), "mercator:binance:account> ");
    assert_eq!(session.depth(), 3);

    session.dispatch("exit").unwrap();
    assert_eq!(session.live_prefix(), "mercator:binance> ");

    session.dispatch("pop").unwrap();
    assert_eq!(session.live_prefix(), "mercator> ");
    assert!(!session.exit_requested());
}

#[test]
fn test_pop_at_root_requests_exit() {
    let (mut session, _) = mercator();
    assert!(session.pop().is_none());
    assert!(session.exit_requested());
    assert_eq!(session.depth(), 1);
}

#[test]
fn test_exit_at_root_requests_exit() {
    let (mut session, _) = mercator();
    session.dispatch("exit").unwrap();
    assert!(session.exit_requested());
}

#[test]
fn test_quit_from_nested_scope() {
    let (mut session, _) = mercator();
    session.dispatch("use binance").unwrap();
    session.dispatch("use account").unwrap();
    session.dispatch("quit").unwrap();
    assert!(session.exit_requested());
}

#[test]
fn test_use_unknown_scope() {
    let (mut session, _) = mercator();
    let err = session.dispatch("use kraken").unwrap_err();
    assert!(matches!(err, ShellError::UnknownScope(ref name) if name == "kraken"));
    assert_eq!(session.depth(), 1);
}

#[test]
fn test_commands_resolve_in_current_scope_only() {
    let (mut session, buf) = mercator();

    let err = session.dispatch("risk").unwrap_err();
    assert!(matches!(err, ShellError::UnknownCommand(ref name) if name == "risk"));

    session.dispatch("use binance").unwrap();
    session.dispatch("risk").unwrap();
    assert_eq!(buf.contents(), "risk computed\n");
}

#[test]
fn test_empty_line() {
    let (mut session, buf) = mercator();
    assert_eq!(session.dispatch("   ").unwrap(), Outcome::Empty);
    session.execute("");
    assert!(buf.contents().is_empty());
}

#[test]
fn test_execute_reports_errors_and_continues() {
    let (mut session, buf) = mercator();

    session.execute("frobnicate");
    assert!(buf.contents().contains("Unknown command: frobnicate"));

    buf.clear();
    session.execute("use 'binance");
    assert!(buf.contents().contains("Unterminated quoted string"));
    assert_eq!(session.depth(), 1);

    session.execute("use binance");
    assert_eq!(session.depth(), 2);
}

#[test]
fn test_unbalanced_quote_is_parse_error() {
    let (mut session, _) = mercator();
    let err = session.dispatch("set name \"open").unwrap_err();
    assert!(matches!(err, ShellError::Parse(_)));
}

#[test]
fn test_initializer_runs_on_push() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "").with_initializer(|session| {
        session.configuration_mut().set_str("entered", "true");
    });
    root.add_sub_scope(child);
    let mut session = Session::new("> ", root).with_output(SharedBuf::default());

    assert!(!session.configuration().contains("entered"));
    session.dispatch("use child").unwrap();
    assert_eq!(session.configuration().display("entered").as_deref(), Some("true"));
}

#[test]
fn test_root_initializer_runs_at_start() {
    let root = Scope::new("root", "").with_initializer(|session| {
        session.configuration_mut().set_str("booted", "1");
    });
    let session = Session::new("> ", root);
    assert!(session.configuration().contains("booted"));
}

#[test]
fn test_set_get_env() {
    let (mut session, buf) = mercator();
    session.dispatch("use binance").unwrap();

    session.dispatch("set Leverage 3").unwrap();
    session.dispatch("set exchange binance").unwrap();
    assert_eq!(
        session.configuration().get("leverage"),
        Some(&toml::Value::Integer(3))
    );

    session.dispatch("get leverage").unwrap();
    assert!(buf.contents().contains("leverage   3"));

    buf.clear();
    session.dispatch("get missing").unwrap();
    assert!(buf.contents().contains("<unset>"));

    buf.clear();
    session.dispatch("env").unwrap();
    let out = buf.contents();
    let exchange = out.find("exchange").unwrap();
    let leverage = out.find("leverage").unwrap();
    assert!(exchange < leverage);
    assert!(out.contains("binance"));
}

#[test]
fn test_set_requires_two_args() {
    let (mut session, _) = mercator();
    assert!(matches!(session.dispatch("set lonely"), Err(ShellError::Validation(_))));
}

#[test]
fn test_help_lists_scope_and_commands() {
    let (mut session, buf) = mercator();
    session.dispatch("help").unwrap();
    let out = buf.contents();
    assert!(out.contains("Built-in Commands:"));
    assert!(out.contains("Sub-scopes:"));
    assert!(out.contains("binance"));

    buf.clear();
    session.dispatch("help binance").unwrap();
    assert!(buf.contents().starts_with("Utilities for accessing the Binance crypto exchange"));

    buf.clear();
    session.dispatch("help quit").unwrap();
    assert!(buf.contents().contains("Exits the console regardless of scope"));

    assert!(matches!(session.dispatch("help nothing"), Err(ShellError::Validation(_))));
}
