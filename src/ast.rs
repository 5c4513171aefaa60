//! # Tally Query Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the tally query
//! language, a SQL-like language for asking analytical questions over nested
//! record trees (the shape produced by parsing a JSON document).
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[program]** - Program root, USE path templates, and query blocks
//! - **[operations]** - The operation nodes executed inside a query block
//! - **[conditions]** - WHERE condition trees and comparison operators
//!
//! ## Quick Start
//!
//! ```text
//! USE products
//!
//! QUERY average_price
//!     SELECT price WHERE (category = "tools")
//!     AVERAGE
//! RETURN
//! ```
//!
//! This program pulls in the `products` array, filters it down to tool
//! prices, and reports the average under the name `average_price`.
//!
//! ## Core Concepts
//!
//! ### USE declarations
//!
//! A USE declaration names a dotted path into the data tree. A path segment
//! may list several alternatives in brackets, in which case the engine runs
//! every query once per alternative and reports results keyed by it:
//!
//! ```text
//! USE y2024.[week1,week2].plays
//! ```
//!
//! A bracketed list in the final position is a field set instead - it
//! restricts which fields of the target records are pulled in.
//!
//! ### Query blocks
//!
//! A QUERY block is a named, ordered pipeline of operations terminated by
//! RETURN. Each SELECT replaces the working set; aggregate operations reduce
//! whatever the last SELECT produced. The value of the final operation
//! becomes the block's result.
//!
//! ### Variables
//!
//! Any operation may be prefixed with `$name` to store its result. Variables
//! share one global namespace across all query blocks:
//!
//! ```text
//! QUERY mean
//!     SELECT price
//!     $total SUM
//!     $n COUNT SELECT price
//!     DIVIDE $total $n
//! RETURN
//! ```

pub mod conditions;
pub mod operations;
pub mod program;
pub mod tokens;

pub use conditions::{CompareOp, CompareValue, Condition};
pub use operations::{FieldSpec, Operation, Select};
pub use program::{Program, QueryBlock, Segment, UsePath};
pub use tokens::{Token, TokenKind};
