//! Interactive guess prompt.
//!
//! Generic over the reader and writer so tests can drive it with in-memory
//! buffers instead of the terminal.

use std::io::{self, BufRead, Write};

/// One line typed at the guess prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Guess(i64),
    ShowHistory,
    Invalid(String),
}

pub fn parse_prompt_input(line: &str) -> PromptInput {
    let line = line.trim();
    if line.eq_ignore_ascii_case("h") {
        return PromptInput::ShowHistory;
    }
    match line.parse() {
        Ok(value) => PromptInput::Guess(value),
        Err(_) => PromptInput::Invalid(line.to_string()),
    }
}

/// Renders the guess history as a single line.
pub fn format_history(history: &[i64]) -> String {
    if history.is_empty() {
        return "no guesses yet".to_string();
    }
    let guesses: Vec<String> = history.iter().map(i64::to_string).collect();
    format!("your guesses: {}", guesses.join(", "))
}

/// Asks for a number until one is entered.
///
/// Typing `h` prints `history` and asks again.  Returns `Ok(None)` when the
/// input ends.
pub fn prompt_guess<R, W>(input: &mut R, output: &mut W, history: &[i64]) -> io::Result<Option<i64>>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "Your guess (h for history): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match parse_prompt_input(&line) {
            PromptInput::Guess(value) => return Ok(Some(value)),
            PromptInput::ShowHistory => writeln!(output, "{}", format_history(history))?,
            PromptInput::Invalid(text) => writeln!(output, "`{text}` is not a whole number")?,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_prompt_input_variants() {
        assert_eq!(parse_prompt_input("42\n"), PromptInput::Guess(42));
        assert_eq!(parse_prompt_input(" -3 "), PromptInput::Guess(-3));
        assert_eq!(parse_prompt_input("H"), PromptInput::ShowHistory);
        assert_eq!(
            parse_prompt_input("forty"),
            PromptInput::Invalid("forty".to_string())
        );
    }

    #[test]
    fn test_format_history() {
        assert_eq!(format_history(&[]), "no guesses yet");
        assert_eq!(format_history(&[5, -1, 12]), "your guesses: 5, -1, 12");
    }

    #[test]
    fn test_prompt_guess_skips_history_and_invalid_lines() {
        // Arrange
        let mut input = Cursor::new("h\nabc\n17\n");
        let mut output = Vec::new();

        // Act
        let guess = prompt_guess(&mut input, &mut output, &[3, 9]).unwrap();

        // Assert
        assert_eq!(guess, Some(17));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("your guesses: 3, 9"));
        assert!(shown.contains("`abc` is not a whole number"));
        assert_eq!(shown.matches("Your guess").count(), 3);
    }

    #[test]
    fn test_prompt_guess_returns_none_at_end_of_input() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        assert_eq!(prompt_guess(&mut input, &mut output, &[]).unwrap(), None);
    }
}
