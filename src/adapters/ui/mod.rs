//! Console output: startup banner and fetch progress.

pub mod banner;
pub mod progress;

/// Prints the welcome banner. Call once at startup (e.g. in main after tracing init).
pub fn init_ui() {
    banner::print_welcome();
}
