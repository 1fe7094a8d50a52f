//! Option records passed explicitly to parse, calculate, and print.

/// Controls how source text is read.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Unknown identifiers become fresh unknown variables instead of errors.
    pub unknowns_as_variables: bool,
    /// Allow `10m` style number-identifier juxtaposition as multiplication.
    pub implicit_multiplication: bool,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            unknowns_as_variables: true,
            implicit_multiplication: true,
        }
    }
}

/// Controls the evaluation engine.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    /// Upper bound on evaluation steps; `None` is unbounded.
    pub max_steps: Option<u64>,
}

/// Controls the infix printer.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Rendered between multiplication operands.
    pub multiplication_sign: String,
    /// Decimal places for float values; `None` uses the calculator's
    /// precision.
    pub precision: Option<usize>,
}

impl Default for PrintOptions {
    fn default() -> PrintOptions {
        PrintOptions {
            multiplication_sign: " * ".to_string(),
            precision: None,
        }
    }
}
