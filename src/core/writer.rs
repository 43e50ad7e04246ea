use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{MockerError, Result};

/// Destination for the generated document. The file variant creates
/// missing parent directories on write.
#[derive(Debug, Clone)]
pub enum OutputSink {
    Stdout,
    File(PathBuf),
}

impl OutputSink {
    pub fn write(&self, contents: &[u8]) -> Result<()> {
        match self {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(contents)
                    .and_then(|_| stdout.flush())
                    .map_err(|e| MockerError::Sink(e.to_string()))
            }
            OutputSink::File(path) => {
                if let Some(dir) = path.parent() {
                    if !dir.as_os_str().is_empty() {
                        fs::create_dir_all(dir).map_err(|e| {
                            MockerError::Sink(format!("{}: {}", dir.display(), e))
                        })?;
                    }
                }
                fs::write(path, contents)
                    .map_err(|e| MockerError::Sink(format!("{}: {}", path.display(), e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deeply/nested/out.go");

        OutputSink::File(path.clone()).write(b"package x\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "package x\n");
    }

    #[test]
    fn unwritable_destination_is_a_sink_failure() {
        let tmp = tempfile::tempdir().unwrap();
        // A file where a directory is needed.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let err = OutputSink::File(blocker.join("out.go")).write(b"x");
        assert!(matches!(err, Err(MockerError::Sink(_))));
    }
}
