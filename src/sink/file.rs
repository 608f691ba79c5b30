// src/sink/file.rs
// =============================================================================
// Appends records to a local file.
//
// The file is opened once at startup in append/create mode. All fetch tasks
// share the same handle, so writes go through an async mutex: one record is
// written and flushed completely before the next task gets the file.
//
// A write that dies part way leaves a torn record behind. It is closed off
// with a newline (best effort) so the following record still starts on its
// own line.
// =============================================================================

use super::{Sink, SinkError};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens (creating if needed) `path` for appending.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(FileSink {
            path: path.to_path_buf(),
            file: Mutex::new(File::from_std(file)),
        })
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            target: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&self, record: &[u8]) -> Result<usize, SinkError> {
        let mut file = self.file.lock().await;
        append_record(&mut *file, record)
            .await
            .map_err(|e| self.io_error(e))?;

        Ok(record.len())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// Writes all of `record`, then flushes. tokio's File hands writes to a
// blocking thread; flush waits for them to land.
async fn append_record<W>(out: &mut W, record: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while written < record.len() {
        let step = match out.write(&record[written..]).await {
            Ok(0) => Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e),
        };

        match step {
            Ok(n) => written += n,
            Err(e) => {
                if written > 0 {
                    let _ = out.write_all(b"\n").await;
                    let _ = out.flush().await;
                }
                return Err(e);
            }
        }
    }

    out.flush().await
}
