use std::rc::Rc;

use scopeshell::{Command, Scope};

fn propagating(name: &str) -> Command {
    Command::new(name)
        .with_summary(format!("{} everywhere", name))
        .with_run(|_, _, _| Ok(()))
        .with_propagation(true)
}

#[test]
fn test_new_scope_has_use_and_help() {
    let scope = Scope::new("binance", "Exchange utilities");
    assert_eq!(scope.available_commands(), vec!["help", "use"]);
    assert!(scope.command("use").is_some_and(|c| c.is_builtin()));
    assert!(scope.sub_scopes().is_empty());
}

#[test]
fn test_propagation_command_added_before_child() {
    let root = Scope::new("root", "");
    root.add_command(propagating("quit"));

    let child = Scope::new("child", "");
    root.add_sub_scope(child.clone());

    let grandchild = Scope::new("grandchild", "");
    child.add_sub_scope(grandchild.clone());

    assert!(child.command("quit").is_some());
    assert!(grandchild.command("quit").is_some());
}

#[test]
fn test_propagation_command_added_after_child() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    let grandchild = Scope::new("grandchild", "");
    child.add_sub_scope(grandchild.clone());
    root.add_sub_scope(child.clone());

    root.add_command(propagating("quit"));

    assert!(child.command("quit").is_some());
    assert!(grandchild.command("quit").is_some());
}

#[test]
fn test_propagated_command_shares_identity() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    root.add_sub_scope(child.clone());
    root.add_command(propagating("env"));

    let ours = root.command("env").unwrap();
    let theirs = child.command("env").unwrap();
    assert!(Rc::ptr_eq(&ours, &theirs));
}

#[test]
fn test_propagation_is_idempotent() {
    let root = Scope::new("root", "");
    root.add_command(propagating("quit"));
    let child = Scope::new("child", "");
    assert!(root.add_sub_scope(child.clone()));
    // Linking again re-injects the same commands
    assert!(root.add_sub_scope(child.clone()));

    assert_eq!(child.available_commands(), vec!["help", "quit", "use"]);
    assert_eq!(root.available_scopes(), vec!["child"]);
}

#[test]
fn test_linking_an_ancestor_is_refused() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    assert!(root.add_sub_scope(child.clone()));

    assert!(!child.add_sub_scope(root.clone()));
    assert!(child.sub_scopes().is_empty());
    assert!(root.parent().is_none());

    // Propagation still terminates after the refused link
    root.add_command(propagating("quit"));
    assert!(child.command("quit").is_some());
}

#[test]
fn test_linking_into_itself_is_refused() {
    let scope = Scope::new("loop", "");
    assert!(!scope.add_sub_scope(scope.clone()));
    assert!(scope.sub_scopes().is_empty());

    scope.add_command(propagating("quit"));
    assert!(scope.command("quit").is_some());
}

#[test]
fn test_deep_cycle_is_refused() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    let grandchild = Scope::new("grandchild", "");
    root.add_sub_scope(child.clone());
    child.add_sub_scope(grandchild.clone());

    assert!(!grandchild.add_sub_scope(root.clone()));
    assert!(grandchild.sub_scopes().is_empty());

    root.add_command(propagating("env"));
    assert!(grandchild.command("env").is_some());
}

#[test]
fn test_second_parent_is_refused() {
    let first = Scope::new("first", "");
    let second = Scope::new("second", "");
    let child = Scope::new("child", "");
    second.add_command(propagating("quit"));

    assert!(first.add_sub_scope(child.clone()));
    assert!(!second.add_sub_scope(child.clone()));

    assert!(child.parent().is_some_and(|parent| parent.ptr_eq(&first)));
    assert!(second.sub_scopes().is_empty());
    assert!(child.command("quit").is_none());
}

#[test]
fn test_non_propagating_stays_local() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    root.add_sub_scope(child.clone());
    root.add_command(Command::new("risk").with_run(|_, _, _| Ok(())));

    assert!(root.command("risk").is_some());
    assert!(child.command("risk").is_none());
}

#[test]
fn test_use_and_help_do_not_leak_into_children() {
    let root = Scope::new("root", "");
    let child = Scope::new("child", "");
    root.add_sub_scope(child.clone());

    let root_use = root.command("use").unwrap();
    let child_use = child.command("use").unwrap();
    assert!(!Rc::ptr_eq(&root_use, &child_use));
}

#[test]
fn test_alias_resolves_to_same_command() {
    let scope = Scope::new("root", "");
    scope.add_command(
        Command::new("status")
            .with_alias("st")
            .with_run(|_, _, _| Ok(())),
    );

    let by_name = scope.command("status").unwrap();
    let by_alias = scope.command("st").unwrap();
    assert!(Rc::ptr_eq(&by_name, &by_alias));
    assert_eq!(scope.available_commands(), vec!["help", "st", "status", "use"]);
}

#[test]
fn test_later_registration_replaces_earlier() {
    let scope = Scope::new("root", "");
    scope.add_command(Command::new("risk").with_summary("first"));
    scope.add_command(Command::new("risk").with_summary("second"));
    assert_eq!(scope.command("risk").unwrap().summary(), "second");
}

#[test]
fn test_sub_scope_lookup() {
    let root = Scope::new("root", "");
    root.add_sub_scope(Scope::new("binance", "Exchange"));
    root.add_sub_scope(Scope::new("account", "Account"));

    assert_eq!(root.available_scopes(), vec!["account", "binance"]);
    assert_eq!(root.sub_scope("binance").unwrap().description(), "Exchange");
    assert!(root.sub_scope("kraken").is_none());
}

#[test]
fn test_usage_sections() {
    let root = Scope::new("binance", "Utilities for accessing the Binance crypto exchange");
    root.add_command(Command::new("risk").with_summary("risk calculates an investment risk"));
    root.add_command(
        Command::new("exit")
            .with_alias("pop")
            .with_summary("Exit pops a scope")
            .with_builtin(true),
    );
    root.add_sub_scope(Scope::new("account", "Access account info"));

    let usage = root.usage();
    assert!(usage.starts_with("Utilities for accessing the Binance crypto exchange\n"));

    let user = usage.find("User Commands:").unwrap();
    let builtin = usage.find("Built-in Commands:").unwrap();
    let scopes = usage.find("Sub-scopes:").unwrap();
    assert!(user < builtin && builtin < scopes);

    assert!(usage[user..builtin].contains("risk calculates an investment risk"));
    assert!(usage[builtin..scopes].contains("Alias for 'exit' command"));
    assert!(usage[builtin..scopes].contains("Prints help info"));
    assert!(usage[scopes..].contains("account"));
    assert!(usage[scopes..].contains("Access account info"));
}

#[test]
fn test_usage_without_children_has_no_sub_scopes() {
    let scope = Scope::new("leaf", "A leaf");
    assert!(!scope.usage().contains("Sub-scopes:"));
}
