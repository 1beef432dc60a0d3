//! Plaintext token file
//!
//! Fallback for headless machines, CI runners and containers without an OS
//! secret service. Owner-only permissions on the file (0600) and its
//! directory (0700) are the only confidentiality control.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use common::Secret;
use tracing::debug;

use crate::error::{Error, Result};
use crate::probe::{Probe, Removal, Token, TokenLocation, TokenSource};

/// Reads and writes the single token file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or blank file is `NotFound`; an unreadable file is `Error`.
    pub async fn probe(&self) -> Probe {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let contents = Secret::new(contents);
                let trimmed = contents.expose().trim();
                if trimmed.is_empty() {
                    debug!(path = %self.path.display(), "token file is empty");
                    Probe::NotFound
                } else {
                    Probe::Found(Secret::new(trimmed.to_owned()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Probe::NotFound,
            Err(e) => Probe::Error(format!("reading {}: {e}", self.path.display())),
        }
    }

    /// The stored token, or `None` when it is missing, unreadable or blank.
    pub async fn read(&self) -> Option<Token> {
        self.probe().await.into_token()
    }

    /// Write the token followed by a newline, replacing any existing file.
    ///
    /// Goes through a temp file in the same directory and a rename, so a
    /// crash never leaves a truncated token behind.
    pub async fn write(&self, token: &str) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Config("token path has no parent directory".into()))?;
        ensure_private_dir(dir).await?;

        let tmp_path = dir.join(format!(".token.tmp.{}", std::process::id()));
        let contents = Secret::new(format!("{token}\n"));
        if let Err(e) = write_private(&tmp_path, contents.expose().as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::Io(format!("renaming temp token file: {e}")));
        }

        debug!(path = %self.path.display(), "wrote token file");
        Ok(())
    }

    /// Remove the file. A file that is already gone counts as success.
    pub async fn delete(&self) -> Result<Removal> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed token file");
                Ok(Removal::Removed)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::Absent),
            Err(e) => Err(Error::Io(format!(
                "removing {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl TokenSource for FileStore {
    fn location(&self) -> TokenLocation {
        TokenLocation::File
    }

    fn probe(&self) -> Pin<Box<dyn Future<Output = Probe> + Send + '_>> {
        Box::pin(FileStore::probe(self))
    }
}

/// Create the directory with mode 0700 if it does not exist yet.
/// Existing directories are left as they are.
async fn ensure_private_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(());
    }

    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder
        .create(dir)
        .await
        .map_err(|e| Error::Io(format!("creating {}: {e}", dir.display())))
}

async fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    // A stale temp file keeps its old mode, so set it explicitly as well
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    file.write_all(bytes)
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;
    file.flush()
        .await
        .map_err(|e| Error::Io(format!("flushing temp token file: {e}")))?;
    Ok(())
}
