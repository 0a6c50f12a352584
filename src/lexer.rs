//! Splitting of a raw input line into an argument vector.
//!
//! Only blanks and quotes are understood: there is no expansion and no operator
//! splitting, so `&`, `|` and `>` have to be written as separate words to be
//! recognized by [`classify`](crate::command::classify).

/// Errors that can occur while splitting a line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unfinished quote")]
    UnfinishedQuote,
    /// A quoted word was empty, e.g. `''`.
    #[error("empty argument at column {0}")]
    EmptyToken(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    word_start: usize,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            word_start: 0,
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole line and returns the words found.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_quoted(ch, '\''),
                LexingState::ReadingDoubleQuote => self.handle_quoted(ch, '"'),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                Err(LexingError::UnfinishedQuote)
            }
            LexingState::ReadingWord => {
                self.finish_word(&mut out)?;
                Ok(out)
            }
            LexingState::Start => Ok(out),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        if is_blank(ch) {
            return;
        }
        self.word_start = self.pos - 1;
        self.state = LexingState::ReadingWord;
        self.push_word_char(ch);
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), LexingError> {
        if is_blank(ch) {
            self.finish_word(out)?;
            self.state = LexingState::Start;
        } else {
            self.push_word_char(ch);
        }
        Ok(())
    }

    fn push_word_char(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char, quote: char) {
        if ch == quote {
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }

    fn finish_word(&mut self, out: &mut Vec<String>) -> Result<(), LexingError> {
        if self.buffer.is_empty() {
            return Err(LexingError::EmptyToken(self.word_start + 1));
        }
        out.push(std::mem::take(&mut self.buffer));
        Ok(())
    }
}

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Split `line` into words on blanks, keeping quoted blanks inside a word.
///
/// Quotes are removed from the result: `echo "a b"'c'` gives `["echo", "a bc"]`.
pub fn split_line(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blanks() {
        assert_eq!(
            split_line("  ls \t-l   /tmp ").unwrap(),
            vec!["ls", "-l", "/tmp"]
        );
    }

    #[test]
    fn blank_line_has_no_words() {
        assert!(split_line("").unwrap().is_empty());
        assert!(split_line(" \t ").unwrap().is_empty());
    }

    #[test]
    fn quotes_keep_blanks_together() {
        assert_eq!(
            split_line(r#"echo "a b" 'c  d'"#).unwrap(),
            vec!["echo", "a b", "c  d"]
        );
    }

    #[test]
    fn quotes_glue_to_neighbouring_text() {
        assert_eq!(
            split_line(r#"echo pre"mid"'post'"#).unwrap(),
            vec!["echo", "premidpost"]
        );
    }

    #[test]
    fn operators_are_left_as_words() {
        assert_eq!(
            split_line("ls | wc -l > out.txt &").unwrap(),
            vec!["ls", "|", "wc", "-l", ">", "out.txt", "&"]
        );
        assert_eq!(split_line("echo a|b").unwrap(), vec!["echo", "a|b"]);
        // a quoted marker is still the same token
        assert_eq!(split_line("echo '|'").unwrap(), vec!["echo", "|"]);
    }

    #[test]
    fn unfinished_quote_is_an_error() {
        assert_eq!(split_line("echo 'abc"), Err(LexingError::UnfinishedQuote));
        assert_eq!(split_line("echo \"abc"), Err(LexingError::UnfinishedQuote));
    }

    #[test]
    fn empty_quoted_word_is_an_error() {
        assert_eq!(split_line("echo '' x"), Err(LexingError::EmptyToken(6)));
        assert_eq!(split_line("echo \"\""), Err(LexingError::EmptyToken(6)));
    }
}
