//! Interactive answers from the terminal or piped standard input

use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::Input;
use kafka_provision::InputSource;

/// Reads answers from standard input
///
/// A terminal gets a dialoguer prompt; anything else (pipes, files) is read
/// line by line, and end of input ends the prompt.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if io::stdin().is_terminal() {
            return read_interactive(prompt);
        }
        print!("{prompt}: ");
        io::stdout().flush()?;
        read_answer(&mut io::stdin().lock())
    }
}

fn read_interactive(prompt: &str) -> io::Result<Option<String>> {
    match Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
    {
        Ok(line) => Ok(Some(line)),
        Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(dialoguer::Error::IO(e)) => Err(e),
    }
}

/// One answer from a line reader; `None` once the input is exhausted
fn read_answer(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_piped_answers_are_read_in_order() {
        let mut input = Cursor::new("3\n\nabc\r\n");

        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("3"));
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some(""));
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("abc"));
        assert_eq!(read_answer(&mut input).unwrap(), None);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut input = Cursor::new("7");

        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("7"));
        assert_eq!(read_answer(&mut input).unwrap(), None);
    }

    #[test]
    fn test_empty_input_ends_prompt() {
        assert_eq!(read_answer(&mut Cursor::new("")).unwrap(), None);
    }
}
