use crate::error::TokenizeError;

/// Words of an input line split with shell-style quoting rules
#[derive(Clone, Debug)]
pub struct TokenStream {
    /// Original input string (up to the cursor)
    input: String,

    /// Parsed tokens
    tokens: Vec<String>,
}

impl TokenStream {
    /// Tokenize a full input line
    pub fn parse(input: impl Into<String>) -> Result<Self, TokenizeError> {
        let input = input.into();
        let tokens = split(&input)?;
        Ok(Self { input, tokens })
    }

    /// Tokenize only the text before the cursor (for completion)
    pub fn before_cursor(input: &str, cursor: usize) -> Result<Self, TokenizeError> {
        let text = input.get(..cursor).unwrap_or(input);
        Self::parse(text)
    }

    /// Get token at index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|s| s.as_str())
    }

    /// The command word, if any
    pub fn command_name(&self) -> Option<&str> {
        self.get(0)
    }

    /// Everything after the command word
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    /// All tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Raw text of the word being typed: everything after the last
    /// whitespace, or empty when the input ends in whitespace.
    pub fn partial(&self) -> &str {
        word_before(&self.input)
    }

    /// Get the original input string
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Raw word immediately before the end of `text`
pub fn word_before(text: &str) -> &str {
    match text.rfind(char::is_whitespace) {
        Some(idx) => {
            let ws_len = text[idx..].chars().next().map_or(1, char::len_utf8);
            &text[idx + ws_len..]
        }
        None => text,
    }
}

fn split(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes an empty quoted word ("") from no word at all
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    tokens.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(next) => current.push(next),
                    None => return Err(TokenizeError::TrailingEscape),
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('$' | '`' | '"' | '\\')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            _ => {
                in_word = true;
                current.push(ch);
            }
        }
    }

    if in_word {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        TokenStream::parse(input).unwrap().into_tokens()
    }

    #[test]
    fn test_parse_simple_args() {
        assert_eq!(words("foo bar  baz"), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_parse_quoted_args() {
        assert_eq!(words(r#"foo "hello world" 'a b' bar"#), vec!["foo", "hello world", "a b", "bar"]);
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(words(r#""hello \"world\"""#), vec![r#"hello "world""#]);
        assert_eq!(words(r"one\ word"), vec!["one word"]);
        assert_eq!(words(r#""keep \n""#), vec![r"keep \n"]);
        assert_eq!(words(r"'no \ escapes'"), vec![r"no \ escapes"]);
    }

    #[test]
    fn test_empty_quotes_make_a_word() {
        assert_eq!(words(r#"set key """#), vec!["set", "key", ""]);
    }

    #[test]
    fn test_unbalanced_quotes_fail() {
        assert_eq!(
            TokenStream::parse("say \"hi").unwrap_err(),
            TokenizeError::UnterminatedQuote('"')
        );
        assert_eq!(
            TokenStream::parse("say 'hi").unwrap_err(),
            TokenizeError::UnterminatedQuote('\'')
        );
        assert_eq!(TokenStream::parse("oops\\").unwrap_err(), TokenizeError::TrailingEscape);
    }

    #[test]
    fn test_partial_word() {
        let stream = TokenStream::parse("risk --auth").unwrap();
        assert_eq!(stream.partial(), "--auth");
        assert_eq!(stream.command_name(), Some("risk"));
        assert_eq!(stream.args(), ["--auth".to_string()]);

        let stream = TokenStream::parse("risk ").unwrap();
        assert_eq!(stream.partial(), "");
    }

    #[test]
    fn test_before_cursor() {
        let stream = TokenStream::before_cursor("use binance extra", 11).unwrap();
        assert_eq!(stream.tokens(), ["use".to_string(), "binance".to_string()]);
        assert_eq!(stream.partial(), "binance");
    }
}
