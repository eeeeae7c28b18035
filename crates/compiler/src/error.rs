//! Compile errors. All of them reject the whole expression.

/// Result alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Why an expression could not be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// Unbalanced parentheses
    #[error("expression is not valid. number of brackets doesn't match")]
    Brackets,

    /// A character outside digits, `.`, whitespace, operators and parentheses
    #[error("expression is not valid. only numbers and ( ) + - * / allowed, found {found:?} at {position}")]
    Allowed {
        /// Offending character
        found: char,
        /// Byte offset in the input
        position: usize,
    },

    /// An operator without two operands, or operands left without an operator
    #[error("expression is not valid. not enough values")]
    Values,

    /// A digit/decimal run that is not a number, such as `1.2.3`
    #[error("expression is not valid. malformed number {0:?}")]
    Number(String),
}
