use std::any::Any;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};

use super::line_prefix;
use crate::{
    Backend, ConfigurableBackend, LogConsumer, LogRecord, NonReentrantMutex, Severity,
    SeverityFilter,
};

const UNPRINTABLE_MARKER: &str = " (* Message contained unprintable (?) characters *)";

/// Backend writing formatted records to a file, opened lazily in append mode
/// on the first accepted write. Open and write failures drop the record
/// silently; logging is best effort and never fails its caller.
pub struct FileBackend {
    inner: NonReentrantMutex<FileBackendState>,
}

struct FileBackendState {
    filter: SeverityFilter,
    path: PathBuf,
    stream: Option<File>,
    /// Grows by one per rotation; shown in the header from the second file.
    running_number: u32,
    proc_start: DateTime<Utc>,
    log_all_characters: bool,
}

impl FileBackend {
    /// An unconfigured backend; not initialized until a `PATH` property
    /// arrives.
    pub fn new() -> Self {
        Self::with_path(PathBuf::new())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        FileBackend {
            inner: NonReentrantMutex::new(FileBackendState {
                filter: SeverityFilter::new(),
                path: path.into(),
                stream: None,
                running_number: 1,
                proc_start: Utc::now(),
                log_all_characters: false,
            }),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        FileBackend::new()
    }
}

impl FileBackendState {
    /// The write step behind the filter. Opens the target lazily and writes
    /// the header block once per open; on failure the record is dropped and
    /// no retry is attempted.
    fn write_item(&mut self, record: &LogRecord) {
        if self.stream.is_none() {
            let mut file = match OpenOptions::new().append(true).create(true).open(&self.path) {
                Ok(file) => file,
                Err(_) => return,
            };
            if write_header(&mut file, self.running_number, self.proc_start).is_err() {
                return;
            }
            self.stream = Some(file);
        }

        let (message, had_unprintable) = sanitize(record.message(), self.log_all_characters);
        let marker = if had_unprintable { UNPRINTABLE_MARKER } else { "" };
        if let Some(stream) = self.stream.as_mut() {
            let _ = writeln!(stream, "{}{}{}", line_prefix(record), message, marker);
        }
    }
}

impl LogConsumer for FileBackend {
    fn log_item(&self, record: &LogRecord) {
        let mut state = self.inner.lock();
        if state.filter.is_loggable(record) {
            state.write_item(record);
        }
    }

    fn effective_severity(&self, module: &str) -> Severity {
        self.inner.lock().filter.severity_threshold(module)
    }

    /// Close the current file and start the next one. The confirmation
    /// record goes through the write path directly so the reopened file
    /// always carries the fresh header plus that one line.
    fn handle_log_rotate(&self) {
        let mut state = self.inner.lock();
        state.running_number += 1;
        state.stream = None;
        let record = LogRecord::new(
            "agent.logger",
            Severity::Info,
            "Log rotation complete",
            file!(),
            line!(),
        );
        state.write_item(&record);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableBackend for FileBackend {
    fn set_property(&self, key: &str, value: &str) {
        let mut state = self.inner.lock();
        match key {
            "PATH" => state.path = PathBuf::from(value),
            "LOGALLCHARACTERS" => state.log_all_characters = true,
            _ => {}
        }
    }

    fn is_initialized(&self) -> bool {
        !self.inner.lock().path.as_os_str().is_empty()
    }
}

impl Backend for FileBackend {
    fn set_severity_threshold(&self, module: &str, severity: Severity) -> bool {
        self.inner.lock().filter.set_severity_threshold(module, severity)
    }

    fn clear_severity_threshold(&self, module: &str) -> bool {
        self.inner.lock().filter.clear_severity_threshold(module)
    }

    fn min_active_severity_threshold(&self) -> Severity {
        self.inner.lock().filter.min_active_severity_threshold()
    }
}

fn write_header(
    file: &mut File,
    running_number: u32,
    proc_start: DateTime<Utc>,
) -> std::io::Result<()> {
    writeln!(file, "*")?;
    writeln!(file, "* Monitoring Agent Log")?;
    writeln!(file, "* Build number: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "* Process id: {}", std::process::id())?;
    writeln!(
        file,
        "* Process started: {}",
        proc_start.to_rfc3339_opts(SecondsFormat::Micros, true)
    )?;
    if running_number > 1 {
        writeln!(file, "* Log file number: {}", running_number)?;
    }
    writeln!(file, "*")?;
    writeln!(
        file,
        "* Log format: <date> <severity>     [<code module>:<line number>:<process id>:<thread id>] <message>"
    )?;
    writeln!(file, "*")?;
    Ok(())
}

/// Replace characters outside the printable range with `[0xHHH]` escapes.
/// The default range is printable ASCII (32..=126); `LOGALLCHARACTERS`
/// widens it to everything below 256. Returns the sanitized message and
/// whether anything was escaped.
fn sanitize(message: &str, log_all_characters: bool) -> (String, bool) {
    let mut out = String::with_capacity(message.len());
    let mut had_unprintable = false;
    for c in message.chars() {
        let code = c as u32;
        let printable = if log_all_characters {
            code <= 0xff
        } else {
            (32..=126).contains(&code)
        };
        if printable {
            out.push(c);
        } else {
            out.push_str(&format!("[0x{:03x}]", code));
            had_unprintable = true;
        }
    }
    (out, had_unprintable)
}
