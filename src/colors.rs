use crossterm::style::{Color, Stylize};

/// Named color slots handed to the line editor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    pub scrollbar_thumb: Color,
    pub scrollbar_bg: Color,
    pub prefix_text: Color,
    pub input_text: Color,
    pub description_bg: Color,
    pub description_text: Color,
    pub suggestion_bg: Color,
    pub suggestion_text: Color,
    pub selected_suggestion_bg: Color,
    pub selected_suggestion_text: Color,
    pub selected_description_bg: Color,
    pub selected_description_text: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            scrollbar_thumb: Color::Red,
            scrollbar_bg: Color::White,
            prefix_text: Color::Red,
            input_text: Color::White,
            description_bg: Color::White,
            description_text: Color::DarkGrey,
            suggestion_bg: Color::DarkGrey,
            suggestion_text: Color::White,
            selected_suggestion_bg: Color::White,
            selected_suggestion_text: Color::DarkGrey,
            selected_description_bg: Color::DarkGrey,
            selected_description_text: Color::White,
        }
    }
}

impl ColorScheme {
    pub fn paint_prefix(&self, prefix: &str) -> String {
        prefix.with(self.prefix_text).to_string()
    }

    pub fn paint_input(&self, input: &str) -> String {
        input.with(self.input_text).to_string()
    }

    pub fn paint_suggestion(&self, value: &str) -> String {
        value.with(self.suggestion_text).on(self.suggestion_bg).to_string()
    }

    pub fn paint_description(&self, description: &str) -> String {
        description.with(self.description_text).on(self.description_bg).to_string()
    }

    /// Inline hint for the best suggestion
    pub fn paint_hint(&self, hint: &str) -> String {
        hint.with(self.selected_suggestion_text).to_string()
    }
}

/// Print `value` behind a green label
pub fn print_info(label: &str, value: impl std::fmt::Display) {
    println!("{}: {}", label.green(), value);
}
