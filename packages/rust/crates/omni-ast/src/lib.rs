//! omni-ast - Python syntax services on tree-sitter
//!
//! Answers the structural questions a source rewriter has to ask about a
//! Python module without ever executing it.
//!
//! ## Architecture
//!
//! ```text
//! omni-ast/src/
//! ├── lib.rs           # Re-exports (entry point)
//! ├── parser.rs        # PythonParser and node helpers
//! ├── syntax.rs        # Parse check with fault location
//! ├── structure.rs     # Function/class definition counts
//! ├── imports.rs       # Top-level import bindings and insertion anchor
//! └── calls.rs         # Statement-level method calls
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use omni_ast::{check_syntax, StructureSummary};
//!
//! let code = "def hello():\n    pass\n";
//! assert!(check_syntax(code).unwrap().is_valid());
//! assert_eq!(StructureSummary::of(code).unwrap().functions, 1);
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod calls;
mod imports;
mod parser;
mod structure;
mod syntax;

// ============================================================================
// Re-exports
// ============================================================================

pub use calls::{CallArgument, StatementCall, find_statement_calls};
pub use imports::{ImportBinding, collect_imports, import_insertion_offset};
pub use parser::PythonParser;
pub use structure::StructureSummary;
pub use syntax::{SyntaxCheck, SyntaxFault, check_syntax};
