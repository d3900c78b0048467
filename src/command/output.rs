use std::{
    fs::OpenOptions,
    io::{self, BufRead, BufReader, Read, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::JoinHandle,
};

use tracing::{error, trace};

use super::error::CommandError;
use crate::readiness::OutputCapture;
use crate::utils::threads::spawn_named_thread;

/// Destination of the exporter's combined stdout and stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogSink {
    /// The bootstrap's own standard output.
    #[default]
    Stdout,
    /// A file, created if missing and appended to.
    File(PathBuf),
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

impl LogSink {
    pub(crate) fn open(&self) -> Result<SharedWriter, CommandError> {
        let writer: Box<dyn Write + Send> = match self {
            Self::Stdout => Box::new(io::stdout()),
            Self::File(path) => Box::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| CommandError::LogSink {
                        path: path.clone(),
                        source,
                    })?,
            ),
        };
        Ok(Arc::new(Mutex::new(writer)))
    }
}

/// In-memory copy of what the exporter printed, shared between the reader threads
/// (writers) and the readiness monitor (reader).
///
/// Only needed until readiness is decided: once [`CaptureBuffer::stop`] is called new lines
/// are no longer kept, the sink keeps receiving them.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    lines: Arc<RwLock<String>>,
    stopped: Arc<AtomicBool>,
}

impl CaptureBuffer {
    pub(crate) fn push_line(&self, line: &str) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let mut buffer = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        buffer.push_str(line);
        buffer.push('\n');
    }

    /// Stops capturing. What was captured so far is kept.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

impl OutputCapture for CaptureBuffer {
    fn contents(&self) -> String {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Forwards every line read from `handle` to the sink and the capture buffer until the
/// stream is closed.
pub(crate) fn spawn_logger<R>(
    handle: R,
    stream: &'static str,
    sink: SharedWriter,
    capture: CaptureBuffer,
) -> Result<JoinHandle<()>, CommandError>
where
    R: Read + Send + 'static,
{
    let thread = spawn_named_thread(format!("exporter {stream} logger"), move || {
        let mut reader = BufReader::new(handle);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim_end_matches(['\n', '\r']);
                    trace!(stream, "{}", line);
                    capture.push_line(line);
                    let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
                        error!(stream, "could not write exporter output: {e}");
                    }
                }
                Err(e) => {
                    error!(stream, "could not read exporter output: {e}");
                    break;
                }
            }
        }
    })?;
    Ok(thread)
}
