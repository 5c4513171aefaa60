use crate::{
    ast::{
        CompareOp, CompareValue, Condition, FieldSpec, Operation, Program, QueryBlock, Segment,
        Select, Token, TokenKind, UsePath,
    },
    value::Value,
};

/// Structural syntax error. Carries the source line of the offending token.
/// Fatal to [`Parser::parse_program`]: no partial AST is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Syntax error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser with one token of lookahead.
///
/// Structural violations (a missing expected token) fail fast through
/// [`Parser::consume`]; everything else is parsed permissively - tokens
/// that fit nothing at the top level or between operations are skipped
/// silently, comments included.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut parser = Parser {
            tokens,
            position: 0,
        };
        parser.skip_comments();
        parser
    }

    fn peek(&self) -> &Token {
        // The stream always ends in Eof, so last() is always present.
        self.tokens
            .get(self.position)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends in Eof"))
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        self.skip_comments();
        token
    }

    fn skip_comments(&mut self) {
        while self.peek().kind == TokenKind::Comment {
            self.position += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// The single fail-fast point: the expected token is either here or the
    /// whole parse aborts.
    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError {
                line: self.peek().line,
                message: format!("{}, found '{}'", message, self.describe_current()),
            })
        }
    }

    fn describe_current(&self) -> String {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            token.lexeme.clone()
        }
    }

    /// Parse a whole program: USE declarations and query blocks in any
    /// order, unrecognized top-level tokens skipped.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();

        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Use => program.uses.push(self.parse_use()?),
                TokenKind::Query => program.queries.push(self.parse_query_block()?),
                _ => {
                    self.advance();
                }
            }
        }

        Ok(program)
    }

    fn parse_use(&mut self) -> Result<UsePath, ParseError> {
        self.consume(TokenKind::Use, "Expected USE")?;

        let mut segments = vec![self.parse_segment()?];
        while self.check(TokenKind::Dot) {
            self.advance();
            segments.push(self.parse_segment()?);
        }

        // A bracketed list in the final position is a field set, not a
        // path segment, as long as a real segment precedes it.
        let mut fields = None;
        if segments.len() > 1 && segments.last().is_some_and(|(_, bracketed)| *bracketed) {
            let (last, _) = segments.pop().expect("at least two segments");
            fields = Some(last.alternatives);
        }

        Ok(UsePath {
            segments: segments.into_iter().map(|(seg, _)| seg).collect(),
            fields,
        })
    }

    fn parse_segment(&mut self) -> Result<(Segment, bool), ParseError> {
        if self.check(TokenKind::LBracket) {
            self.advance();
            let mut alternatives =
                vec![self.consume(TokenKind::Identifier, "Expected name in path")?.lexeme];
            while self.check(TokenKind::Comma) {
                self.advance();
                alternatives
                    .push(self.consume(TokenKind::Identifier, "Expected name in path")?.lexeme);
            }
            self.consume(TokenKind::RBracket, "Expected ']' in path")?;
            Ok((Segment { alternatives }, true))
        } else {
            let name = self.consume(TokenKind::Identifier, "Expected path segment")?;
            Ok((Segment::single(name.lexeme), false))
        }
    }

    fn parse_query_block(&mut self) -> Result<QueryBlock, ParseError> {
        self.consume(TokenKind::Query, "Expected QUERY")?;
        let name = self.consume(TokenKind::Identifier, "Expected query name")?;

        let mut operations = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Return => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.consume(TokenKind::Return, "Expected RETURN to close query block")?;
                }
                TokenKind::Variable => {
                    let variable = self.advance().lexeme;
                    let operation = self.parse_operation()?;
                    operations.push(Operation::Assign {
                        variable,
                        operation: Box::new(operation),
                    });
                }
                kind if is_operation_keyword(kind) => {
                    operations.push(self.parse_operation()?);
                }
                _ => {
                    // Permissive: unrecognized tokens inside a block are
                    // skipped rather than raised.
                    self.advance();
                }
            }
        }

        Ok(QueryBlock {
            name: name.lexeme,
            operations,
        })
    }

    fn parse_operation(&mut self) -> Result<Operation, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Select => Ok(Operation::Select(self.parse_select()?)),
            TokenKind::Count => {
                self.advance();
                Ok(Operation::Count(self.parse_select()?))
            }
            TokenKind::PercentOf => {
                self.advance();
                self.parse_percent_of()
            }
            TokenKind::Sum => {
                self.advance();
                Ok(Operation::Sum)
            }
            TokenKind::Average => {
                self.advance();
                Ok(Operation::Average)
            }
            TokenKind::Median => {
                self.advance();
                Ok(Operation::Median)
            }
            TokenKind::Min => {
                self.advance();
                Ok(Operation::Min)
            }
            TokenKind::Max => {
                self.advance();
                Ok(Operation::Max)
            }
            TokenKind::Variance => {
                self.advance();
                Ok(Operation::Variance)
            }
            TokenKind::StandardDeviation => {
                self.advance();
                Ok(Operation::StandardDeviation)
            }
            TokenKind::Range => {
                self.advance();
                Ok(Operation::Range)
            }
            TokenKind::Unique => {
                self.advance();
                Ok(Operation::Unique)
            }
            TokenKind::MostFrequent => {
                self.advance();
                Ok(Operation::MostFrequent)
            }
            TokenKind::LeastFrequent => {
                self.advance();
                Ok(Operation::LeastFrequent)
            }
            TokenKind::Divide => {
                self.advance();
                let (a, b) = self.parse_variable_pair()?;
                Ok(Operation::Divide {
                    dividend: a,
                    divisor: b,
                })
            }
            TokenKind::Multiply => {
                self.advance();
                let (a, b) = self.parse_variable_pair()?;
                Ok(Operation::Multiply {
                    factor1: a,
                    factor2: b,
                })
            }
            TokenKind::Subtract => {
                self.advance();
                let (a, b) = self.parse_variable_pair()?;
                Ok(Operation::Subtract {
                    minuend: a,
                    subtrahend: b,
                })
            }
            _ => Err(ParseError {
                line: token.line,
                message: format!("Expected operation, found '{}'", self.describe_current()),
            }),
        }
    }

    /// DIVIDE / MULTIPLY / SUBTRACT take exactly two variable references,
    /// never literals.
    fn parse_variable_pair(&mut self) -> Result<(String, String), ParseError> {
        let first = self.consume(TokenKind::Variable, "Expected variable operand")?;
        if self.check(TokenKind::Comma) {
            self.advance();
        }
        let second = self.consume(TokenKind::Variable, "Expected variable operand")?;
        Ok((first.lexeme, second.lexeme))
    }

    fn parse_select(&mut self) -> Result<Select, ParseError> {
        self.consume(TokenKind::Select, "Expected SELECT")?;
        self.parse_select_body()
    }

    fn parse_select_body(&mut self) -> Result<Select, ParseError> {
        let each = if self.check(TokenKind::Each) {
            self.advance();
            true
        } else {
            false
        };

        let fields = if self.check(TokenKind::Star) {
            self.advance();
            FieldSpec::All
        } else if self.check(TokenKind::LBracket) {
            self.advance();
            let mut names =
                vec![self.consume(TokenKind::Identifier, "Expected field name")?.lexeme];
            while self.check(TokenKind::Comma) {
                self.advance();
                names.push(self.consume(TokenKind::Identifier, "Expected field name")?.lexeme);
            }
            self.consume(TokenKind::RBracket, "Expected ']' after field list")?;
            FieldSpec::Multiple(names)
        } else {
            let name = self.consume(TokenKind::Identifier, "Expected field specification")?;
            FieldSpec::Single(name.lexeme)
        };

        let condition = if self.check(TokenKind::Where) {
            self.advance();
            self.consume(TokenKind::LParen, "Expected '(' after WHERE")?;
            let condition = self.parse_condition()?;
            self.consume(TokenKind::RParen, "Expected ')' after WHERE condition")?;
            Some(condition)
        } else {
            None
        };

        Ok(Select {
            fields,
            condition,
            each,
        })
    }

    /// PERCENT_OF greedily takes one SELECT as numerator, then an optional
    /// comma and second SELECT as denominator. A missing denominator
    /// defaults to all records at the current context.
    fn parse_percent_of(&mut self) -> Result<Operation, ParseError> {
        let numerator = if self.check(TokenKind::Select) {
            self.parse_select()?
        } else {
            self.parse_select_body()?
        };

        if self.check(TokenKind::Comma) {
            self.advance();
        }

        let denominator = if self.check(TokenKind::Select) {
            self.parse_select()?
        } else {
            Select::all()
        };

        Ok(Operation::PercentOf {
            numerator,
            denominator,
        })
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Pipe) {
            self.advance();
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_unary()?;
        while self.check(TokenKind::Ampersand) {
            self.advance();
            let right = self.parse_unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Condition, ParseError> {
        if self.check(TokenKind::Bang) {
            self.advance();
            let inner = self.parse_unary()?;
            Ok(Condition::Not(Box::new(inner)))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Condition, ParseError> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let condition = self.parse_condition()?;
            self.consume(TokenKind::RParen, "Expected ')' in condition")?;
            return Ok(condition);
        }

        let field = self.consume(TokenKind::Identifier, "Expected field name in condition")?;
        let op = self.parse_compare_op()?;
        let value = self.parse_compare_value()?;

        Ok(Condition::Compare {
            field: field.lexeme,
            op,
            value,
        })
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Contains => CompareOp::Contains,
            TokenKind::NotContains => CompareOp::NotContains,
            _ => {
                return Err(ParseError {
                    line: self.peek().line,
                    message: format!(
                        "Expected comparison operator, found '{}'",
                        self.describe_current()
                    ),
                });
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_compare_value(&mut self) -> Result<CompareValue, ParseError> {
        let token = self.peek().clone();
        let value = match token.kind {
            TokenKind::String => CompareValue::Literal(Value::String(token.lexeme)),
            TokenKind::Number => CompareValue::Literal(parse_number(&token.lexeme)),
            TokenKind::Boolean => CompareValue::Literal(Value::Boolean(token.lexeme == "true")),
            TokenKind::Null => CompareValue::Literal(Value::Null),
            TokenKind::Variable => CompareValue::Variable(token.lexeme),
            _ => {
                return Err(ParseError {
                    line: token.line,
                    message: format!(
                        "Expected comparison value, found '{}'",
                        self.describe_current()
                    ),
                });
            }
        };
        self.advance();
        Ok(value)
    }
}

fn is_operation_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Select
            | TokenKind::Count
            | TokenKind::Sum
            | TokenKind::Divide
            | TokenKind::Multiply
            | TokenKind::Subtract
            | TokenKind::Average
            | TokenKind::Median
            | TokenKind::Min
            | TokenKind::Max
            | TokenKind::PercentOf
            | TokenKind::MostFrequent
            | TokenKind::LeastFrequent
            | TokenKind::Unique
            | TokenKind::StandardDeviation
            | TokenKind::Variance
            | TokenKind::Range
    )
}

fn parse_number(lexeme: &str) -> Value {
    if lexeme.contains('.') {
        Value::Float(lexeme.parse::<f64>().unwrap_or(0.0))
    } else {
        Value::Integer(lexeme.parse::<i64>().unwrap_or(0))
    }
}
