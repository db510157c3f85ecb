use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::builtins;
use crate::command::{Command, Outcome};
use crate::error::ShellError;
use crate::session::Session;

/// Hook run every time a scope is pushed onto a session
pub type InitializeFn = Rc<dyn Fn(&mut Session)>;

/// A named namespace node owning a command registry and child scopes.
///
/// `Scope` is a cheap handle; clones refer to the same node. Commands and
/// children can be added at any time, including after the scope has been
/// linked into a tree or pushed onto a session.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    name: String,
    description: String,
    initialize: RefCell<Option<InitializeFn>>,
    commands: RefCell<BTreeMap<String, Rc<Command>>>,
    children: RefCell<BTreeMap<String, Scope>>,
    parent: RefCell<Weak<ScopeInner>>,
}

impl Scope {
    /// Create a scope seeded with the `use` and `help` built-ins
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let scope = Self {
            inner: Rc::new(ScopeInner {
                name: name.into(),
                description: description.into(),
                initialize: RefCell::new(None),
                commands: RefCell::new(BTreeMap::new()),
                children: RefCell::new(BTreeMap::new()),
                parent: RefCell::new(Weak::new()),
            }),
        };
        builtins::install_scope_builtins(&scope);
        scope
    }

    /// Run `hook` whenever this scope is pushed. The hook may touch the
    /// session's configuration but must not push or pop scopes.
    pub fn with_initializer(self, hook: impl Fn(&mut Session) + 'static) -> Self {
        *self.inner.initialize.borrow_mut() = Some(Rc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    pub(crate) fn initializer(&self) -> Option<InitializeFn> {
        self.inner.initialize.borrow().clone()
    }

    /// Register a command under its name and every alias.
    ///
    /// A later registration for the same key replaces the earlier one.
    /// Propagating commands are also added to every existing child, and
    /// from there to their children.
    pub fn add_command(&self, command: impl Into<Rc<Command>>) {
        let command = command.into();
        command.prepare();

        {
            let mut commands = self.inner.commands.borrow_mut();
            commands.insert(command.name().to_string(), command.clone());
            for alias in command.aliases() {
                commands.insert(alias.clone(), command.clone());
            }
        }
        tracing::debug!(scope = %self.name(), command = %command.name(), "registered command");

        if command.propagates() {
            for child in self.sub_scopes() {
                inject_propagating(&child, std::slice::from_ref(&command));
            }
        }
    }

    /// Link `child` under its name, first copying in every propagating
    /// command this scope already holds.
    ///
    /// A scope has at most one parent and the tree never loops. Linking a
    /// child that belongs to another scope, or that is this scope or one of
    /// its ancestors, is refused and returns `false`. Linking the same child
    /// again only re-injects the propagating commands.
    pub fn add_sub_scope(&self, child: Scope) -> bool {
        if let Some(parent) = child.parent()
            && !parent.ptr_eq(self)
        {
            tracing::warn!(scope = %self.name(), child = %child.name(), parent = %parent.name(), "sub-scope already has a parent, ignoring");
            return false;
        }
        if self.ancestors().any(|scope| scope.ptr_eq(&child)) {
            tracing::warn!(scope = %self.name(), child = %child.name(), "linking sub-scope would form a cycle, ignoring");
            return false;
        }

        inject_propagating(&child, &self.propagating_commands());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        tracing::debug!(scope = %self.name(), child = %child.name(), "linked sub-scope");
        self.inner
            .children
            .borrow_mut()
            .insert(child.name().to_string(), child);
        true
    }

    pub fn parent(&self) -> Option<Scope> {
        self.inner.parent.borrow().upgrade().map(|inner| Scope { inner })
    }

    /// This scope, then its parent, up to the root
    fn ancestors(&self) -> impl Iterator<Item = Scope> {
        std::iter::successors(Some(self.clone()), Scope::parent)
    }

    /// Look up a command by name or alias
    pub fn command(&self, name: &str) -> Option<Rc<Command>> {
        self.inner.commands.borrow().get(name).cloned()
    }

    /// Snapshot of the registry, keyed by name and alias
    pub fn commands(&self) -> BTreeMap<String, Rc<Command>> {
        self.inner.commands.borrow().clone()
    }

    pub fn sub_scope(&self, name: &str) -> Option<Scope> {
        self.inner.children.borrow().get(name).cloned()
    }

    /// Children sorted by name
    pub fn sub_scopes(&self) -> Vec<Scope> {
        self.inner.children.borrow().values().cloned().collect()
    }

    /// Sorted command names and aliases
    pub fn available_commands(&self) -> Vec<String> {
        self.inner.commands.borrow().keys().cloned().collect()
    }

    /// Sorted child scope names
    pub fn available_scopes(&self) -> Vec<String> {
        self.inner.children.borrow().keys().cloned().collect()
    }

    /// Resolve `args[0]` in this scope only and run it with the rest
    pub fn execute(&self, session: &mut Session, args: &[String]) -> Result<Outcome, ShellError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Outcome::Empty);
        };
        let command = self
            .command(name)
            .ok_or_else(|| ShellError::UnknownCommand(name.clone()))?;
        command.execute(session, rest)
    }

    /// Human readable usage listing user commands, built-ins and sub-scopes
    pub fn usage(&self) -> String {
        let commands = self.commands();
        let width = commands.keys().map(|k| k.len()).max().unwrap_or(0);

        let line = |key: &str, command: &Command| {
            let text = if command.name() == key {
                command.summary().to_string()
            } else {
                format!("Alias for '{}' command", command.name())
            };
            format!("  {:<width$}    {}\n", key, text, width = width)
        };

        let mut buf = format!("{}\n", self.description());

        buf.push_str("\nUser Commands:\n");
        for (key, command) in commands.iter().filter(|(_, c)| !c.is_builtin()) {
            buf.push_str(&line(key.as_str(), command.as_ref()));
        }

        buf.push_str("\nBuilt-in Commands:\n");
        for (key, command) in commands.iter().filter(|(_, c)| c.is_builtin()) {
            buf.push_str(&line(key.as_str(), command.as_ref()));
        }

        let children = self.sub_scopes();
        if !children.is_empty() {
            buf.push_str("\nSub-scopes:\n");
            let width = children.iter().map(|s| s.name().len()).max().unwrap_or(0);
            for child in &children {
                buf.push_str(&format!("  {:<width$}    {}\n", child.name(), child.description(), width = width));
            }
        }
        buf
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakScope {
        WeakScope(Rc::downgrade(&self.inner))
    }

    fn propagating_commands(&self) -> Vec<Rc<Command>> {
        let mut found: Vec<Rc<Command>> = Vec::new();
        for command in self.inner.commands.borrow().values() {
            if command.propagates() && !found.iter().any(|c| Rc::ptr_eq(c, command)) {
                found.push(command.clone());
            }
        }
        found
    }
}

/// Shared by both propagation paths. Re-adding the same `Rc` is harmless,
/// so injecting twice leaves the registry unchanged.
fn inject_propagating(target: &Scope, commands: &[Rc<Command>]) {
    for command in commands {
        target.add_command(command.clone());
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name())
            .field("commands", &self.available_commands())
            .field("sub_scopes", &self.available_scopes())
            .finish()
    }
}

/// Non-owning handle used by built-ins that refer back to their own scope
#[derive(Clone)]
pub(crate) struct WeakScope(Weak<ScopeInner>);

impl WeakScope {
    pub(crate) fn upgrade(&self) -> Option<Scope> {
        self.0.upgrade().map(|inner| Scope { inner })
    }
}
