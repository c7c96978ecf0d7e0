use snafu::Snafu;
use std::path::PathBuf;

/// Usage errors surfaced synchronously to callers. Producer calls (`log`,
/// `set_thread_name`, ...) are always infallible — only configuration and
/// lifecycle calls can fail this way.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SslogError {
    #[snafu(display("invalid formatter pattern: unknown directive '%{directive}'"))]
    InvalidFormatterDirective { directive: char },

    #[snafu(display("failed to create storage directory {}: {source}", path.display()))]
    CreateStorageDir { path: PathBuf, source: std::io::Error },

    #[snafu(display("collector is already stopped"))]
    AlreadyStopped,
}
