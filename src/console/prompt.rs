use crate::{ConsoleError, Result};
use std::io::{self, BufRead, Write};

/// Operator input. Menu dispatch and the restore flow only talk to this trait.
pub trait Prompter {
    /// Pick a number in `0..=max`. Re-asks until the answer is valid.
    fn choose(&self, message: &str, max: usize) -> Result<usize>;

    /// Yes/no question; an empty answer takes `default`.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Free text; an empty answer takes `default` when one is given.
    fn ask(&self, message: &str, default: Option<&str>) -> Result<String>;
}

/// Reads answers from standard input. End of input is `InputClosed`.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        let read = io::stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Err(ConsoleError::InputClosed);
        }
        Ok(input.trim().to_string())
    }
}

/// Parse a menu answer, accepting only `0..=max`.
pub fn parse_choice(answer: &str, max: usize) -> Option<usize> {
    answer.trim().parse().ok().filter(|n| *n <= max)
}

/// Parse a yes/no answer. Empty means "use the default".
pub fn parse_confirm(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Prompter for StdinPrompter {
    fn choose(&self, message: &str, max: usize) -> Result<usize> {
        loop {
            let answer = self.read_line(&format!("{} [0-{}]: ", message, max))?;
            match parse_choice(&answer, max) {
                Some(choice) => return Ok(choice),
                None => println!("Please select one of the available options"),
            }
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_line(&format!("{} {}: ", message, hint))?;
            match parse_confirm(&answer, default) {
                Some(value) => return Ok(value),
                None => println!("Please enter y or n"),
            }
        }
    }

    fn ask(&self, message: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(default) => format!("{} ({}): ", message, default),
            None => format!("{}: ", message),
        };

        loop {
            let answer = self.read_line(&prompt)?;
            match (answer.is_empty(), default) {
                (true, Some(default)) => return Ok(default.to_string()),
                (true, None) => continue,
                (false, _) => return Ok(answer),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_choice, parse_confirm};

    #[test]
    fn test_parse_choice_bounds() {
        assert_eq!(parse_choice("0", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(3));
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("-1", 3), None);
        assert_eq!(parse_choice("two", 3), None);
    }

    #[test]
    fn test_parse_confirm() {
        assert_eq!(parse_confirm("", false), Some(false));
        assert_eq!(parse_confirm("", true), Some(true));
        assert_eq!(parse_confirm("Y", false), Some(true));
        assert_eq!(parse_confirm("no", true), Some(false));
        assert_eq!(parse_confirm("maybe", true), None);
    }
}
