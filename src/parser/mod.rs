//! C++ subset parser
//!
//! This module transforms source text into a scope-resolved Abstract Syntax Tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, recovery and entry point (tokens → AST)
//! - [`ast`]: AST node definitions
//! - [`errors`]: Diagnostics shared by lexer and parser
//!
//! # Supported C++ Subset
//!
//! - Types: `int`, `float`, `double`, `char`, `string`, `bool`, `long`, `void`,
//!   classes/structs, pointers, one- and two-dimensional arrays
//! - Declarations: variable lists, free functions, `main`, classes with access
//!   specifiers, constructors, destructors, member functions and prototypes
//! - Statements: assignments, compound assignments, calls, `new`/`delete`,
//!   `if`/`else`, `while`, `return`
//! - `#include` lines and `using namespace std;` are skipped
//! - No templates, inheritance, references, `for` loops or operator overloading
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
pub mod errors;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
