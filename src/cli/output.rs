//! Result rendering and colored terminal helpers.
//!
//! stdout carries exactly the result (JSON object or text lines);
//! warnings and errors go to stderr.

use console::style;

use crate::cli::OutputFormat;
use crate::operation::OperationResult;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print the operation result in the requested format.
pub fn emit(result: &OperationResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", result.to_json()),
        OutputFormat::Text => {
            if result.failed {
                error(&result.message);
                return;
            }
            success(&result.message);
            if let Some(password) = result.password() {
                println!("{password}");
            }
        }
    }
}
