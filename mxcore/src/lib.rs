//! mxcore: the calculator context and façade for the mx engine.
//!
//! The crate exposes a small surface: construct a [`calculator::Calculator`],
//! load the global definition tables you need, then `parse`, `calculate`, and
//! `print`. Calculators are explicit, isolated instances; nothing here is a
//! process-wide singleton.

pub mod calculator;
pub mod engine;
pub mod error;
pub mod message;
pub mod options;
pub mod parser;
pub mod print;

pub use calculator::Calculator;
pub use error::{CalcError, CalcResult};
pub use message::{Message, MessageKind};
pub use options::{EvaluationOptions, ParseOptions, PrintOptions};
pub use print::{DEFAULT_PRINT_OPTIONS, print_node};
