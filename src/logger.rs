//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` macro for formatted terminal output. Every line
//! is prefixed with a bracketed module name so interleaved output from
//! concurrent request workers stays attributable.
//!
//! # Example
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! log!("pages"; "created {}", slug);
//! ```

use colored::{ColoredString, Colorize};

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print a prefixed log line to stdout.
pub fn log(module: &str, message: &str) {
    println!("{} {message}", prefix(module));
}

/// Build the colored `[module]` prefix.
///
/// Modules keep a stable color so their lines are easy to pick out of
/// mixed output.
fn prefix(module: &str) -> ColoredString {
    let text = format!("[{module}]");
    match module {
        "serve" => text.green().bold(),
        "init" => text.yellow().bold(),
        "templates" => text.blue().bold(),
        "pages" => text.magenta().bold(),
        _ => text.cyan().bold(),
    }
}
