//! Log writer module
//!
//! Thread-safe, bucket-addressed log writing. Each bucket appends to its own
//! file and rotates it once the configured size threshold is reached.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;

use crate::config::LoggingConfig;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// A single bucket sink: one log file, serialized writes
struct BucketSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl BucketSink {
    fn open(path: &str) -> io::Result<Self> {
        Ok(Self {
            path: PathBuf::from(path),
            file: Mutex::new(open_log_file(path)?),
        })
    }

    /// Append one line, rotating the file first if it has grown past `max_filesize`
    fn append(&self, line: &str, max_filesize: u64) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };

        let needs_rotation = file
            .metadata()
            .map(|meta| meta.len() >= max_filesize)
            .unwrap_or(false);

        if needs_rotation {
            let stamp = Local::now().format("%Y%m%d%H%M%S%3f%z");
            let rotated = format!("{}.{stamp}", self.path.display());
            if let Err(e) = std::fs::rename(&self.path, &rotated) {
                eprintln!("[WARN] Failed to rotate log file {}: {e}", self.path.display());
            }
            match open_log_file(&self.path.display().to_string()) {
                Ok(fresh) => *file = fresh,
                Err(e) => {
                    eprintln!("[WARN] Failed to reopen log file {}: {e}", self.path.display());
                    return;
                }
            }
        }

        let _ = writeln!(*file, "{line}");
    }
}

/// Thread-safe bucket-addressed log writer
pub struct LogWriter {
    buckets: HashMap<String, BucketSink>,
    max_filesize: u64,
    debug_mode: bool,
}

impl LogWriter {
    /// Create a writer with one sink per configured bucket
    pub fn new(config: &LoggingConfig) -> io::Result<Self> {
        let mut buckets = HashMap::new();
        for (name, path) in &config.buckets {
            buckets.insert(name.to_lowercase(), BucketSink::open(path)?);
        }

        Ok(Self {
            buckets,
            max_filesize: config.max_filesize,
            debug_mode: config.debug_mode,
        })
    }

    /// Write a formatted line to the named bucket
    ///
    /// `None` addresses the general `all` bucket. A bucket missing from the
    /// configuration drops the message with a complaint on stderr.
    pub fn write(&self, bucket: Option<&str>, level: &str, message: &str) {
        let bucket_name = bucket.map_or_else(|| "all".to_string(), str::to_lowercase);
        let Some(sink) = self.buckets.get(&bucket_name) else {
            eprintln!("[WARN] The bucket {bucket_name} is not set up in the configuration");
            return;
        };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f %z");
        let line = format!("[{timestamp}] [{}] {message}", level.to_uppercase());

        sink.append(&line, self.max_filesize);

        if level.eq_ignore_ascii_case("critical") || self.debug_mode {
            println!("{line}");
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let writer = LogWriter::new(config)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config(dir: &Path, max_filesize: u64) -> LoggingConfig {
        let mut buckets = HashMap::new();
        buckets.insert(
            "all".to_string(),
            dir.join("general.log").display().to_string(),
        );
        buckets.insert(
            "audit".to_string(),
            dir.join("audit.log").display().to_string(),
        );
        LoggingConfig {
            buckets,
            max_filesize,
            debug_mode: false,
        }
    }

    #[test]
    fn test_writes_to_bucket_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(&test_config(dir.path(), 10_485_760)).unwrap();

        writer.write(Some("audit"), "REQUEST_BEGIN", "hello");
        writer.write(None, "INFO", "general line");

        let audit = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(audit.contains("[REQUEST_BEGIN] hello"));

        let general = std::fs::read_to_string(dir.path().join("general.log")).unwrap();
        assert!(general.contains("[INFO] general line"));
    }

    #[test]
    fn test_unknown_bucket_drops_message() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(&test_config(dir.path(), 10_485_760)).unwrap();

        writer.write(Some("missing"), "INFO", "dropped");

        let general = std::fs::read_to_string(dir.path().join("general.log")).unwrap();
        assert!(!general.contains("dropped"));
    }

    #[test]
    fn test_rotation_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(&test_config(dir.path(), 64)).unwrap();

        // Push the file past the threshold, then write once more to trigger rotation
        for i in 0..10 {
            writer.write(None, "INFO", &format!("line number {i}"));
        }

        let rotated = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("general.log.")
            })
            .count();
        assert!(rotated >= 1, "expected at least one rotated general.log.*");
    }
}
