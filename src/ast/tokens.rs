/// The kind of a lexical token.
///
/// Keyword recognition is case-sensitive: `SELECT` is a keyword, `select` is
/// an identifier. `true`, `false` and `null` lex as literals, never as
/// identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Use,
    Query,
    Select,
    Where,
    Return,
    Each,

    // Operator keywords
    Count,
    Sum,
    Divide,
    Multiply,
    Subtract,
    Average,
    Median,
    Min,
    Max,
    PercentOf,
    MostFrequent,
    LeastFrequent,
    Unique,
    StandardDeviation,
    Variance,
    Range,
    Contains,
    NotContains,

    // Literals
    /// String literal; the lexeme holds the unquoted contents.
    ///
    /// # Examples
    /// ```text
    /// "pass"
    /// 'pass'
    /// ```
    String,

    /// Number literal; digits with an optional fraction, no exponent.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// ```
    Number,

    /// `true` or `false`
    Boolean,

    /// `null`
    Null,

    /// Variable reference; the lexeme retains the `$` sigil.
    ///
    /// # Examples
    /// ```text
    /// $total
    /// $n
    /// ```
    Variable,

    /// Field or path name
    Identifier,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Star,
    Ampersand,
    Pipe,
    Bang,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,

    /// `//` line comment; tokenized so the parser can skip it explicitly.
    Comment,

    /// Anything the lexer cannot classify, including an unterminated
    /// string literal (the lexeme carries the partial text). The lexer
    /// never fails; malformed input surfaces at parse time.
    Unknown,

    /// End of input; every token stream ends in exactly one of these.
    Eof,
}

/// One lexical token with its source position. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based column of the token's first character.
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}
