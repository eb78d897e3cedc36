//! Error types for the *recoverable* failure modes spec.md §7 lists:
//! parse failure and backend/code-generation failure. Precondition
//! violations and allocation failure are not represented here; per spec.md
//! §7 they are unrecoverable and surface as `panic!`/`debug_assert!` at the
//! call site instead, matching how `cranelift-codegen` itself distinguishes
//! `CodegenResult` (recoverable) from `debug_assert!`/`panic!` (programmer
//! bugs) elsewhere in the crate.

use failure_derive::Fail;
use std::fmt;

/// The location of a diagnostic within a source file.
///
/// Grounded on `cranelift-reader::error::Location`: line 0 is reserved for
/// command-line arguments, source file lines start from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Line number, or 0 for command-line arguments.
    pub line_number: usize,
}

/// A parse error, as would be produced by the (out-of-scope, external)
/// textual-format parser described in spec.md §6.
///
/// This type exists so that [`FirError::Parse`] has something concrete to
/// carry; this crate does not implement the parser itself.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Where the error occurred.
    pub location: Location,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.location.line_number == 0 {
            write!(f, "command-line arguments: {}", self.message)
        } else {
            write!(f, "{}: {}", self.location.line_number, self.message)
        }
    }
}

/// Errors the core surfaces to a caller as a `Result` rather than a panic.
#[derive(Debug, Fail)]
pub enum FirError {
    /// A code generator's `run` failed; the message is backend-specific.
    #[fail(display = "code generation failed: {}", _0)]
    Codegen(String),

    /// The external textual-format parser reported an error.
    #[fail(display = "parse error: {}", _0)]
    Parse(ParseError),
}

/// The result type used at the core's recoverable-failure boundaries.
pub type FirResult<T> = Result<T, FirError>;
