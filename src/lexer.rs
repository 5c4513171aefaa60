use crate::ast::{Token, TokenKind};

/// Single left-to-right pass over the query text, no backtracking.
///
/// The lexer never fails: input it cannot classify (including an
/// unterminated string) becomes an `Unknown` token and is dealt with at
/// parse time.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Lex the whole input. The result always ends in exactly one Eof.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Read a string delimited by `quote`. An unterminated string yields an
    /// Unknown token carrying the partial text.
    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Token {
        let mut result = String::new();
        self.advance(); // consume opening quote

        while let Some(ch) = self.current_char() {
            if ch == quote {
                self.advance();
                return Token::new(TokenKind::String, result, line, column);
            }
            result.push(ch);
            self.advance();
        }

        Token::new(TokenKind::Unknown, result, line, column)
    }

    fn read_number(&mut self, line: usize, column: usize) -> Token {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, number, line, column)
    }

    fn read_comment(&mut self, line: usize, column: usize) -> Token {
        let mut text = String::new();
        self.advance();
        self.advance(); // consume "//"
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        Token::new(TokenKind::Comment, text, line, column)
    }

    fn keyword_kind(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "USE" => TokenKind::Use,
            "QUERY" => TokenKind::Query,
            "SELECT" => TokenKind::Select,
            "WHERE" => TokenKind::Where,
            "RETURN" => TokenKind::Return,
            "EACH" => TokenKind::Each,
            "COUNT" => TokenKind::Count,
            "SUM" => TokenKind::Sum,
            "DIVIDE" => TokenKind::Divide,
            "MULTIPLY" => TokenKind::Multiply,
            "SUBTRACT" => TokenKind::Subtract,
            "AVERAGE" => TokenKind::Average,
            "MEDIAN" => TokenKind::Median,
            "MIN" => TokenKind::Min,
            "MAX" => TokenKind::Max,
            "PERCENT_OF" => TokenKind::PercentOf,
            "MOST_FREQUENT" => TokenKind::MostFrequent,
            "LEAST_FREQUENT" => TokenKind::LeastFrequent,
            "UNIQUE" => TokenKind::Unique,
            "STANDARD_DEVIATION" => TokenKind::StandardDeviation,
            "VARIANCE" => TokenKind::Variance,
            "RANGE" => TokenKind::Range,
            "CONTAINS" => TokenKind::Contains,
            "NOT_CONTAINS" => TokenKind::NotContains,
            _ => return None,
        };
        Some(kind)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        let single = |lexer: &mut Lexer, kind: TokenKind, lexeme: &str| {
            lexer.advance();
            Token::new(kind, lexeme, line, column)
        };

        match self.current_char() {
            None => Token::new(TokenKind::Eof, "", line, column),
            Some('/') if self.peek_char(1) == Some('/') => self.read_comment(line, column),
            Some('$') => {
                if self
                    .peek_char(1)
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
                {
                    self.advance();
                    let name = self.read_identifier();
                    Token::new(TokenKind::Variable, format!("${}", name), line, column)
                } else {
                    single(self, TokenKind::Unknown, "$")
                }
            }
            Some('(') => single(self, TokenKind::LParen, "("),
            Some(')') => single(self, TokenKind::RParen, ")"),
            Some('[') => single(self, TokenKind::LBracket, "["),
            Some(']') => single(self, TokenKind::RBracket, "]"),
            Some(',') => single(self, TokenKind::Comma, ","),
            Some('.') => single(self, TokenKind::Dot, "."),
            Some('*') => single(self, TokenKind::Star, "*"),
            Some('&') => single(self, TokenKind::Ampersand, "&"),
            Some('|') => single(self, TokenKind::Pipe, "|"),
            Some('=') => single(self, TokenKind::Eq, "="),
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::NotEq, "!=", line, column)
                } else {
                    single(self, TokenKind::Bang, "!")
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::GtEq, ">=", line, column)
                } else {
                    single(self, TokenKind::Gt, ">")
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::LtEq, "<=", line, column)
                } else {
                    single(self, TokenKind::Lt, "<")
                }
            }
            Some('"') => self.read_string('"', line, column),
            Some('\'') => self.read_string('\'', line, column),
            Some(ch) if ch.is_ascii_digit() => self.read_number(line, column),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "true" | "false" => Token::new(TokenKind::Boolean, ident, line, column),
                    "null" => Token::new(TokenKind::Null, ident, line, column),
                    _ => match Self::keyword_kind(&ident) {
                        Some(kind) => Token::new(kind, ident, line, column),
                        None => Token::new(TokenKind::Identifier, ident, line, column),
                    },
                }
            }
            Some(ch) => single(self, TokenKind::Unknown, &ch.to_string()),
        }
    }
}

#[test]
fn test_keywords_and_literals() {
    let mut lexer = Lexer::new("USE QUERY SELECT true false null");
    assert_eq!(lexer.next_token().kind, TokenKind::Use);
    assert_eq!(lexer.next_token().kind, TokenKind::Query);
    assert_eq!(lexer.next_token().kind, TokenKind::Select);
    assert_eq!(lexer.next_token().kind, TokenKind::Boolean);
    assert_eq!(lexer.next_token().kind, TokenKind::Boolean);
    assert_eq!(lexer.next_token().kind, TokenKind::Null);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_variable_sigil_retained() {
    let mut lexer = Lexer::new("$total SUM");
    let var = lexer.next_token();
    assert_eq!(var.kind, TokenKind::Variable);
    assert_eq!(var.lexeme, "$total");
    assert_eq!(lexer.next_token().kind, TokenKind::Sum);
}
