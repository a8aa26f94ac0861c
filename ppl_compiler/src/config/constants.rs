//! Compile-time limits and fixed values for the translation engine.

/// Base number of fixpoint passes granted regardless of input length.
pub const FIXPOINT_BASE_PASSES: usize = 16;

/// Maximum include nesting before further `#include`s are refused.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Default indentation width for reformatted output, overridable with
/// `#pragma mode( indentation(n) )`.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Decimal precision used before trailing zeros are trimmed when no
/// explicit scale is requested.
pub const EVAL_AUTO_PRECISION: usize = 10;

/// Euler's number at the evaluator's working precision.
pub const EULER: &str = "2.71828182845904523536028747135266250";

/// Pi at the evaluator's working precision.
pub const PI: &str = "3.14159265358979323846264338327950288";

/// Digits used for base-32 synthetic name suffixes.
pub const BASE32_DIGITS: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNabcdefgh";

/// Extension of pattern-macro library files.
pub const LIBRARY_EXTENSION: &str = "re";

/// Library file loaded ahead of all others.
pub const BASE_LIBRARY_NAME: &str = ".base.re";

/// Version value bound to the predefined `__VERSION` macro.
pub const NUMERIC_VERSION: u32 = 100;

/// Build value bound to the predefined `__NUMERIC_BUILD` macro.
pub const NUMERIC_BUILD: u32 = 10000;
