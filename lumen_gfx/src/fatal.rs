//! Top-level policy for unrecoverable errors
//!
//! The frame driver's public operations never hand a device failure back to
//! the caller: they log it with its call site and terminate the process.
//! Embedders that want their own policy call the `try_*` twins instead.

use std::panic::Location;
use crate::error::Result;
use crate::log::{self, LogSeverity};

/// Exit status used when the process is terminated by [`crash`]
pub const FATAL_EXIT_CODE: i32 = 1;

/// Log `message` at error level (with the caller's location) and terminate the process.
#[track_caller]
pub fn crash(source: &str, message: &str) -> ! {
    let location = Location::caller();
    log::emit_detailed(
        LogSeverity::Error,
        source,
        format!("Fatal: {}", message),
        location.file(),
        location.line(),
    );
    std::process::exit(FATAL_EXIT_CODE)
}

/// Turns any `Result` into its value, or crashes the process with context.
pub trait OrCrash<T> {
    fn or_crash(self, source: &str, context: &str) -> T;
}

impl<T> OrCrash<T> for Result<T> {
    #[track_caller]
    fn or_crash(self, source: &str, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => crash(source, &format!("{}: {}", context, err)),
        }
    }
}
