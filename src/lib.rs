//! Nested interactive command shells: a tree of scopes holding commands,
//! a session walking that tree, and a line-editing console on top.

pub mod builtins;
pub mod colors;
pub mod command;
pub mod completion;
pub mod completion_helper;
pub mod console;
pub mod error;
pub mod eval;
pub mod flags;
pub mod scope;
pub mod session;
pub mod token_stream;
pub mod validation;

pub use colors::{ColorScheme, print_info};
pub use command::{Command, Outcome};
pub use completion::Completion;
pub use completion_helper::CompletionHelper;
pub use console::{Console, ConsoleConfig};
pub use error::{ShellError, TokenizeError};
pub use eval::{Evaluator, eval_command};
pub use flags::{Flag, FlagKind, FlagSet, FlagValue};
pub use scope::Scope;
pub use session::Session;
pub use token_stream::TokenStream;
