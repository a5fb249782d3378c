//! Indentation-aware tokenizer for Mython source.
//!
//! The indentation unit is two spaces. After every `Newline` the lexer
//! measures the next non-blank line, queues the level delta, and hands out
//! one `Indent` or `Dedent` per `next()` call before resuming content
//! tokens. A final line without a trailing newline still gets one, and the
//! end of input closes any open indentation before `Eof`.

pub mod token;

use thiserror::Error;

pub use token::Token;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexerError {
    #[error("Unterminated string literal at position {position}")]
    UnterminatedString { position: usize },
    #[error("Invalid number literal '{literal}' at position {position}")]
    MalformedNumber { literal: String, position: usize },
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
}

pub type LexResult<T> = Result<T, LexerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    LineBegin,
    Content,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    state: LexerState,
    current: Token,
    // Signed level delta still owed to the caller, one token per call.
    pending_indent: i32,
    // Level of the previously measured line.
    indent_level: usize,
    line_has_content: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> LexResult<Self> {
        let mut lexer = Self {
            input,
            pos: 0,
            state: LexerState::LineBegin,
            current: Token::Eof,
            pending_indent: 0,
            indent_level: 0,
            line_has_content: false,
        };
        lexer.next()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Advances to the next token and returns it.
    pub fn next(&mut self) -> LexResult<Token> {
        let token = self.read_token()?;
        self.current = token.clone();
        Ok(token)
    }

    fn read_token(&mut self) -> LexResult<Token> {
        if let Some(step) = self.take_indent_step() {
            return Ok(step);
        }

        if self.state == LexerState::LineBegin {
            self.measure_indentation();
            self.state = LexerState::Content;
            if let Some(step) = self.take_indent_step() {
                return Ok(step);
            }
        }

        self.scan_token()
    }

    // Hands out one queued Indent/Dedent per call.
    fn take_indent_step(&mut self) -> Option<Token> {
        if self.pending_indent > 0 {
            self.pending_indent -= 1;
            return Some(Token::Indent);
        }
        if self.pending_indent < 0 {
            self.pending_indent += 1;
            return Some(Token::Dedent);
        }
        None
    }

    // Measures the level of the next line that carries content and queues
    // the delta against the previously measured level. Blank lines and
    // comment-only lines are skipped here and never affect the level; the
    // end of input measures as level zero.
    fn measure_indentation(&mut self) {
        let level = loop {
            let spaces = self.consume_while(|c| c == ' ');
            match self.peek() {
                Option::None => break 0,
                Some('\n') => {
                    self.bump();
                }
                Some('#') => {
                    self.consume_while(|c| c != '\n');
                }
                Some(_) => break spaces / 2,
            }
        };
        self.pending_indent = level as i32 - self.indent_level as i32;
        self.indent_level = level;
    }

    fn scan_token(&mut self) -> LexResult<Token> {
        loop {
            self.consume_while(|c| c == ' ');
            let start = self.pos;

            let Some(ch) = self.peek() else {
                // A final line without a trailing newline still terminates
                // its statement.
                if self.line_has_content {
                    self.line_has_content = false;
                    self.state = LexerState::LineBegin;
                    return Ok(Token::Newline);
                }
                return Ok(Token::Eof);
            };

            match ch {
                '\n' => {
                    self.bump();
                    self.line_has_content = false;
                    self.state = LexerState::LineBegin;
                    return Ok(Token::Newline);
                }
                '#' => {
                    // Trailing comment; the newline itself is still emitted.
                    self.consume_while(|c| c != '\n');
                }
                _ => {
                    self.line_has_content = true;
                    return self.read_lexeme(ch, start);
                }
            }
        }
    }

    fn read_lexeme(&mut self, ch: char, start: usize) -> LexResult<Token> {
        match ch {
            '"' | '\'' => self.read_string(ch, start),
            '<' | '>' | '!' | '=' => Ok(self.read_comparison(ch)),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(start)),
            c if c.is_ascii_punctuation() => {
                self.bump();
                Ok(Token::Char(c))
            }
            c => Err(LexerError::UnexpectedCharacter {
                character: c,
                position: start,
            }),
        }
    }

    fn read_comparison(&mut self, first: char) -> Token {
        self.bump();
        if self.peek() == Some('=') {
            self.bump();
            return match first {
                '<' => Token::LessOrEq,
                '>' => Token::GreaterOrEq,
                '!' => Token::NotEq,
                _ => Token::Eq,
            };
        }
        Token::Char(first)
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        self.consume_while(is_identifier_continuation);
        let word = &self.input[start..self.pos];
        keyword(word).unwrap_or_else(|| Token::Id(word.to_string()))
    }

    fn read_number(&mut self, start: usize) -> LexResult<Token> {
        self.consume_while(|c| c.is_ascii_digit());
        let literal = &self.input[start..self.pos];
        let value = literal
            .parse::<i32>()
            .map_err(|_| LexerError::MalformedNumber {
                literal: literal.to_string(),
                position: start,
            })?;
        Ok(Token::Number(value))
    }

    fn read_string(&mut self, quote: char, start: usize) -> LexResult<Token> {
        self.bump();
        let mut value = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(LexerError::UnterminatedString { position: start });
            };
            if ch == quote {
                return Ok(Token::String(value));
            }
            if ch == '\\' {
                let Some(escaped) = self.bump() else {
                    return Err(LexerError::UnterminatedString { position: start });
                };
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    other => {
                        // Unknown escapes keep the backslash.
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(ch);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn consume_while<P>(&mut self, keep: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.bump();
        }
        self.pos - start
    }
}

fn is_identifier_continuation(c: char) -> bool {
    c == '_' || !(c.is_whitespace() || c.is_control() || c.is_ascii_punctuation())
}

// The reserved-word table.
fn keyword(word: &str) -> Option<Token> {
    let token = match word {
        "class" => Token::Class,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "def" => Token::Def,
        "print" => Token::Print,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "None" => Token::None,
        "True" => Token::True,
        "False" => Token::False,
        _ => return Option::None,
    };
    Some(token)
}

/// Collects the full token stream of `input`, ending with `Eof`.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input)?;
    let mut tokens = vec![lexer.current().clone()];
    while !matches!(tokens.last(), Some(Token::Eof)) {
        tokens.push(lexer.next()?);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn id(name: &str) -> Token {
        Token::Id(name.to_string())
    }

    #[test]
    fn lexes_a_simple_program() {
        let input = indoc! {r#"
            x = 4 + 4
            print x, "done"
        "#};
        let tokens = tokenize(input).expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                id("x"),
                Token::Char('='),
                Token::Number(4),
                Token::Char('+'),
                Token::Number(4),
                Token::Newline,
                Token::Print,
                id("x"),
                Token::Char(','),
                Token::String("done".to_string()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn emits_one_indent_or_dedent_per_level_step() {
        let input = indoc! {"
            if x:
              if y:
                print 1
            print 2
        "};
        let tokens = tokenize(input).expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                Token::If,
                id("x"),
                Token::Char(':'),
                Token::Newline,
                Token::Indent,
                Token::If,
                id("y"),
                Token::Char(':'),
                Token::Newline,
                Token::Indent,
                Token::Print,
                Token::Number(1),
                Token::Newline,
                Token::Dedent,
                Token::Dedent,
                Token::Print,
                Token::Number(2),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn recognizes_keywords_and_comparison_operators() {
        let input = "class return if else def print and or not None True False == != <= >= < > ! =\n";
        let tokens = tokenize(input).expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                Token::Class,
                Token::Return,
                Token::If,
                Token::Else,
                Token::Def,
                Token::Print,
                Token::And,
                Token::Or,
                Token::Not,
                Token::None,
                Token::True,
                Token::False,
                Token::Eq,
                Token::NotEq,
                Token::LessOrEq,
                Token::GreaterOrEq,
                Token::Char('<'),
                Token::Char('>'),
                Token::Char('!'),
                Token::Char('='),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_identifiers_from_keywords() {
        let tokens = tokenize("classes _klass printx x1\n").expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                id("classes"),
                id("_klass"),
                id("printx"),
                id("x1"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_blank_lines_and_comment_lines() {
        let input = indoc! {"
            x = 1

            # a comment line
              # an indented comment

            y = 2  # trailing comment
        "};
        let tokens = tokenize(input).expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                id("x"),
                Token::Char('='),
                Token::Number(1),
                Token::Newline,
                id("y"),
                Token::Char('='),
                Token::Number(2),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn terminates_a_final_line_without_trailing_newline() {
        let tokens = tokenize("print 1").expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![Token::Print, Token::Number(1), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn closes_open_indentation_before_eof() {
        let tokens = tokenize("if x:\n  print 1").expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                Token::If,
                id("x"),
                Token::Char(':'),
                Token::Newline,
                Token::Indent,
                Token::Print,
                Token::Number(1),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn current_tracks_next_and_eof_is_idempotent() {
        let mut lexer = Lexer::new("x\n").expect("construction should lex the first token");
        assert_eq!(*lexer.current(), id("x"));
        assert_eq!(lexer.next().expect("next"), Token::Newline);
        assert_eq!(*lexer.current(), Token::Newline);
        assert_eq!(lexer.next().expect("next"), Token::Eof);
        assert_eq!(lexer.next().expect("next"), Token::Eof);
        assert_eq!(*lexer.current(), Token::Eof);
    }

    #[test]
    fn lexes_string_literals_with_escapes() {
        let tokens = tokenize(r#"x = "a\tb\n\"c\" \q" + 'd'"#).expect("tokenize should succeed");
        assert_eq!(
            tokens,
            vec![
                id("x"),
                Token::Char('='),
                Token::String("a\tb\n\"c\" \\q".to_string()),
                Token::Char('+'),
                Token::String("d".to_string()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = tokenize("x = \"abc").expect_err("expected lexing failure");
        assert_eq!(err, LexerError::UnterminatedString { position: 4 });
    }

    #[test]
    fn errors_on_number_overflow() {
        let err = tokenize("x = 99999999999\n").expect_err("expected overflow failure");
        assert_eq!(
            err,
            LexerError::MalformedNumber {
                literal: "99999999999".to_string(),
                position: 4,
            }
        );
    }

    #[test]
    fn errors_on_a_character_that_starts_no_lexeme() {
        let err = tokenize("x = 1 \t 2\n").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexerError::UnexpectedCharacter {
                character: '\t',
                position: 6,
            }
        );
    }

    #[test]
    fn indent_and_dedent_tokens_stay_balanced() {
        let input = indoc! {"
            class A:
              def f():
                if x:
                  return 1
                return 2
            print 1
        "};
        let tokens = tokenize(input).expect("tokenize should succeed");
        let mut depth = 0i32;
        for token in &tokens {
            match token {
                Token::Indent => depth += 1,
                Token::Dedent => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "dedent below the top level");
        }
        assert_eq!(depth, 0);
    }
}
