pub mod error;
pub mod identity;
pub mod launcher;
pub mod output;
pub mod shutdown;

pub use error::CommandError;
pub use identity::Identity;
pub use launcher::{ExporterCommand, ExporterExecutable, LaunchedProcess};
pub use output::{CaptureBuffer, LogSink};
pub use shutdown::ProcessTerminator;
