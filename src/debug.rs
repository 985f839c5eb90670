//! Macros for last-resort debugging.
//!
//! Error reporting of the value codec is deliberately terse: a caller gets
//! a symbolic code, not a trace of where inside the dispatch it was raised.
//! To help with debugging, the `xerr!()` macro wraps every expression that
//! first produces an error. With the `extra-debug` feature enabled it
//! prints a backtrace at that point before resolving into the enclosed
//! expression; without the feature it resolves into the expression
//! unchanged.
//!
//! ```rust,ignore
//! if looks_wrong {
//!     xerr!(return Err(Error::ValueNotValid))
//! }
//! ```

#[cfg(feature = "extra-debug")]
pub use backtrace::Backtrace;

#[cfg(feature = "extra-debug")]
#[macro_export]
macro_rules! xerr {
    ($test:expr) => {{
        eprintln!(
            "--- EXTRA DEBUG ---\n{:?}\n--- EXTRA DEBUG ---",
            $crate::debug::Backtrace::new()
        );
        $test
    }}
}

#[cfg(not(feature = "extra-debug"))]
#[macro_export]
macro_rules! xerr {
    ($test:expr) => { $test };
}
