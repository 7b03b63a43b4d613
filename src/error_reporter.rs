//! Side channel for failures that must not escape a logging call.
//!
//! Handlers never return delivery failures to the code that logged the
//! record. They pass them to an [`ErrorReporter`] instead; the default
//! [`LogErrorReporter`] writes them to the `log` facade.

use std::io::{self, Write};

use crate::handler::HandlerError;
use crate::log_compat;

/// Receives errors a handler swallowed.
pub trait ErrorReporter: Send + Sync {
    /// Report `error`, raised by the handler called `source`.
    fn report(&self, source: &str, error: &HandlerError);
}

/// Reports errors with `log::error!`.
///
/// When the failure happens while [`FemtoLogAdapter`] is dispatching on the
/// same thread the `log` record would be dropped, so the report goes to
/// stderr instead.
///
/// [`FemtoLogAdapter`]: crate::log_compat::FemtoLogAdapter
#[derive(Clone, Copy, Debug, Default)]
pub struct LogErrorReporter;

impl LogErrorReporter {
    fn report_to(source: &str, error: &HandlerError, fallback: &mut impl Write) {
        if log_compat::is_dispatching() {
            // Nowhere left to report a failed write.
            let _ = writeln!(fallback, "femtomail: {source}: {error}");
        } else {
            log::error!("{source}: {error}");
        }
    }
}

impl ErrorReporter for LogErrorReporter {
    fn report(&self, source: &str, error: &HandlerError) {
        Self::report_to(source, error, &mut io::stderr().lock());
    }
}
