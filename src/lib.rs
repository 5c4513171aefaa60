pub mod ast;
pub mod conditions;
pub mod executor;
pub mod lexer;
pub mod ops;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

use std::collections::HashMap;

pub use ast::{Condition, FieldSpec, Operation, Program, QueryBlock, Token, TokenKind, UsePath};
pub use executor::{EvalError, Executor};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use value::Value;

/// Compile a query program. Fails with a [`ParseError`] on structural
/// grammar violations; a partial AST is never returned.
///
/// # Examples
///
/// ```
/// use tally_lang::{parse, Value};
/// use std::collections::HashMap;
///
/// let compiled = parse(
///     "USE products
///      QUERY total
///          SELECT price
///          SUM
///      RETURN",
/// )
/// .unwrap();
/// assert_eq!(compiled.expected_paths(), vec!["products"]);
///
/// let data = Value::Object(HashMap::from([(
///     "products".to_string(),
///     Value::Array(vec![Value::Object(HashMap::from([(
///         "price".to_string(),
///         Value::Integer(10),
///     )]))]),
/// )]));
/// let results = compiled.execute(&data).unwrap();
/// assert_eq!(results["total"], Value::Integer(10));
/// ```
pub fn parse(query: &str) -> Result<CompiledQuery, ParseError> {
    let tokens = Lexer::new(query).tokenize();
    let program = Parser::new(tokens).parse_program()?;
    Ok(CompiledQuery { program })
}

/// A parsed program, ready to run against any number of data trees.
///
/// Parsing is idempotent and the compiled program is immutable, so one
/// `CompiledQuery` may be cached and reused; each [`execute`] call owns a
/// fresh variable store.
///
/// [`execute`]: CompiledQuery::execute
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    program: Program,
}

impl CompiledQuery {
    /// The dotted path text of every USE declaration in source order,
    /// alternatives rendered verbatim. Hosts use this to pre-fetch or
    /// validate the data the program will ask for.
    pub fn expected_paths(&self) -> Vec<String> {
        self.program.uses.iter().map(UsePath::render).collect()
    }

    /// Run every query block against the data tree and return the
    /// name-to-result map. The data is never mutated.
    pub fn execute(&self, data: &Value) -> Result<HashMap<String, Value>, EvalError> {
        Executor::new().execute(&self.program, data)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}
