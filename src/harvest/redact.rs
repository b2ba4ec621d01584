//! Redaction mode: GitHub Actions log masking for kernel names.
//!
//! When enabled, every kernel reference, title, and folder name is announced
//! as `::add-mask::<value>` before it can show up in a log line, and kernel
//! warnings name no kernel at all.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::api::KernelSummary;

/// Placeholder logged instead of a kernel name in redaction mode.
pub const HIDDEN_KERNEL_NAME: &str = "hidden kernel name";

const MASK_PREFIX: &str = "::add-mask::";

type MaskSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Emits mask directives and picks log-safe kernel names.
///
/// Redaction is on exactly when the redactor has somewhere to write the
/// directives.
#[derive(Clone, Default)]
pub struct Redactor {
    sink: Option<MaskSink>,
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl Redactor {
    /// Redaction off: nothing is printed, names are logged as-is.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Redaction on, mask directives go to stdout where the CI runner reads
    /// them.
    #[must_use]
    pub fn stdout() -> Self {
        Self::to_writer(io::stdout())
    }

    /// Redaction on, mask directives go to `writer`, one per line.
    #[must_use]
    pub fn to_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    /// Announces `value` as secret. Empty values are skipped.
    pub fn mask(&self, value: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if value.is_empty() {
            return;
        }
        let Ok(mut writer) = sink.lock() else {
            return;
        };
        if let Err(error) = writeln!(writer, "{MASK_PREFIX}{value}").and_then(|()| writer.flush())
        {
            warn!(error = %error, "Could not write mask directive");
        }
    }

    /// Masks a kernel's reference and title.
    pub fn mask_kernel(&self, kernel: &KernelSummary) {
        self.mask(&kernel.kernel_ref);
        self.mask(&kernel.title);
    }

    /// Name to use for `kernel` in log lines.
    #[must_use]
    pub fn display_name<'a>(&self, kernel: &'a KernelSummary) -> &'a str {
        if self.sink.is_some() {
            HIDDEN_KERNEL_NAME
        } else {
            kernel.reference()
        }
    }
}
