//! Size-rotating file writer used by the file layer

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::{FileConfig, RotationConfig};
use crate::logger::error::{LoggerError, Result};

/// File writer that rotates `app.log` into `app.log.1 .. app.log.N`
/// once the active file grows past `max_size`.
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

struct WriterState {
    file: BufWriter<File>,
    current_size: u64,
    rotation: RotationConfig,
    /// Set after a failed write; further output goes to stderr
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                current_size,
                rotation: config.rotation.clone(),
                fallback_mode: false,
            })),
            path: config.path.clone(),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        self.state.lock().map(|s| s.fallback_mode).unwrap_or(false)
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.clone(),
            path: self.path.clone(),
        }
    }
}

pub struct RotatingWriterGuard {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        let projected = state.current_size + buf.len() as u64;
        if state.current_size > 0 && projected > state.rotation.max_size {
            if let Err(e) = rotate(&mut state, &self.path) {
                return fall_back(&mut state, buf, &e.to_string());
            }
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => fall_back(&mut state, buf, &e.to_string()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl Drop for RotatingWriterGuard {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            let _ = state.file.flush();
        }
    }
}

fn fall_back(state: &mut WriterState, buf: &[u8], reason: &str) -> io::Result<usize> {
    state.fallback_mode = true;
    eprintln!("[logger] file write failed, falling back to stderr: {reason}");
    io::stderr().write(buf)
}

fn rotate(state: &mut WriterState, path: &Path) -> Result<()> {
    state.file.flush()?;
    shift_rotated_files(path, state.rotation.max_files)?;
    state.file = open_log_file(path, false)?;
    state.current_size = 0;
    Ok(())
}

/// Shift `path.N-1 -> path.N` down to `path -> path.1`, dropping the oldest.
pub(crate) fn shift_rotated_files(path: &Path, max_files: usize) -> Result<()> {
    let oldest = rotated_name(path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for index in (1..max_files).rev() {
        let from = rotated_name(path, index);
        if from.exists() {
            fs::rename(&from, rotated_name(path, index + 1))?;
        }
    }

    if path.exists() {
        fs::rename(path, rotated_name(path, 1)).map_err(|e| {
            LoggerError::rotation(format!("failed to rotate {}: {e}", path.display()))
        })?;
    }
    Ok(())
}

pub(crate) fn rotated_name(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    Ok(BufWriter::new(file))
}
