use crate::completion::{self, Completion};
use crate::session::Session;
use crate::token_stream::TokenStream;

/// Turns the text before the cursor into a ranked, bounded list of
/// completions and the byte offset they replace from
pub struct CompletionHelper<'a> {
    session: &'a Session,
    max_suggestions: usize,
}

impl<'a> CompletionHelper<'a> {
    pub fn new(session: &'a Session, max_suggestions: usize) -> Self {
        Self {
            session,
            max_suggestions,
        }
    }

    /// Completions for `line` with the cursor at byte `pos`
    pub fn complete(&self, line: &str, pos: usize) -> (usize, Vec<Completion>) {
        let Ok(stream) = TokenStream::before_cursor(line, pos) else {
            return (pos, Vec::new());
        };
        let typed = stream.input();
        let word = stream.partial();
        let word_start = typed.len() - word.len();

        // While typing `--flag=va`, the engine sees `--flag=` and only the
        // part after `=` is ranked and replaced
        let (engine_word, term, start, value_mode) = match split_flag_value(word) {
            Some((flag, value)) => (flag, value, word_start + flag.len(), true),
            None => (word, word, word_start, false),
        };

        let commands = self.session.current_scope().commands();
        let mut found = completion::suggestions(self.session, typed, &commands, engine_word, stream.tokens());
        if value_mode {
            found.retain(|c| !c.value.starts_with('-'));
        }

        let mut ranked = completion::rank(found, term);
        ranked.truncate(self.max_suggestions);
        (start, ranked)
    }
}

fn split_flag_value(word: &str) -> Option<(&str, &str)> {
    if !word.starts_with('-') {
        return None;
    }
    let idx = word.find('=')?;
    Some((&word[..=idx], &word[idx + 1..]))
}
