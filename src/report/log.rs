use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Serializes appends from every writer in the process
static APPEND_LOCK: Mutex<()> = Mutex::new(());

/// Append-only report log. Each render lands as one contiguous block.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, rendered: &str) -> Result<()> {
        let _guard = APPEND_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        let mut block = rendered.to_string();
        if !block.ends_with('\n') {
            block.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to open log file {}", self.path.display()))?;
        file.write_all(block.as_bytes())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write log file {}", self.path.display()))?;

        debug!("Appended {} bytes to {}", block.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(LogWriter::new(&dir.path().join("context.log")));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    let block = format!("{}\n", n.to_string().repeat(4096));
                    writer.append(&block).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let logged = fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        assert_eq!(lines.len(), 8);
        for line in lines {
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first));
            assert_eq!(line.len(), 4096);
        }
    }

    #[test]
    fn test_missing_newline_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(&dir.path().join("context.log"));
        writer.append("one").unwrap();
        writer.append("two\n").unwrap();
        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "one\ntwo\n");
    }
}
