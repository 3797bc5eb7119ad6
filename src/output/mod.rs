//! Output cleanup for chat replies.
//!
//! Captured bytes are kept verbatim in [`ExecutionResult`]; the host layer
//! runs them through [`OutputSanitizer`] before rendering a reply so that
//! colour codes and carriage-return progress bars do not end up in chat.
//!
//! # Example
//!
//! ```
//! use shell_exec::output::OutputSanitizer;
//!
//! let raw = b"\x1b[32mok\x1b[0m\r\n";
//! assert_eq!(OutputSanitizer::to_plain_text(raw), "ok\n");
//! ```
//!
//! [`ExecutionResult`]: crate::execution::ExecutionResult

mod sanitizer;

pub use sanitizer::OutputSanitizer;
