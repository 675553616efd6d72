use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::info;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::types::TableSnapshot;
use crate::{bail, etl_error};

/// Encoding of a snapshot into one file.
pub trait FileFormat: Send + Sync + 'static {
    /// Short name used in logs and metrics, e.g. `csv`.
    fn name(&self) -> &'static str;

    /// File extension without the leading dot.
    fn extension(&self) -> &'static str;

    /// Writes the whole snapshot to `out`.
    fn encode(&self, snapshot: &TableSnapshot, out: &mut BufWriter<File>) -> EtlResult<()>;
}

/// Writes each snapshot to `<directory>/<table>.<extension>`.
///
/// The file is first written to a temporary sibling and renamed into place once the encoder
/// has finished, so readers never observe a partial file. An existing file is replaced.
#[derive(Debug)]
pub struct FileDestination<F> {
    directory: PathBuf,
    format: Arc<F>,
}

impl<F: FileFormat> FileDestination<F> {
    pub fn with_format(directory: impl Into<PathBuf>, format: F) -> Self {
        Self {
            directory: directory.into(),
            format: Arc::new(format),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file written for `table`.
    pub fn file_path(&self, table: &str) -> PathBuf {
        self.directory
            .join(format!("{table}.{}", self.format.extension()))
    }
}

impl<F> Clone for FileDestination<F> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            format: self.format.clone(),
        }
    }
}

#[async_trait]
impl<F: FileFormat> Destination for FileDestination<F> {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        validate_file_stem(snapshot.name())?;

        let directory = self.directory.clone();
        let target = self.file_path(snapshot.name());
        let format = self.format.clone();
        let snapshot = snapshot.clone();

        let path = tokio::task::spawn_blocking(move || -> EtlResult<PathBuf> {
            write_atomically(&directory, &target, |out| format.encode(&snapshot, out))?;
            Ok(target)
        })
        .await??;

        info!(
            destination = self.format.name(),
            path = %path.display(),
            "wrote table file"
        );

        Ok(())
    }
}

/// Runs `write` against a temporary file in `directory`, then renames it to `target`.
fn write_atomically<W>(directory: &Path, target: &Path, write: W) -> EtlResult<()>
where
    W: FnOnce(&mut BufWriter<File>) -> EtlResult<()>,
{
    fs::create_dir_all(directory).map_err(|err| {
        etl_error!(
            ErrorKind::DestinationIoError,
            "Creating output directory failed",
            directory.display(),
            source: err
        )
    })?;

    let temp = NamedTempFile::new_in(directory).map_err(|err| {
        etl_error!(
            ErrorKind::DestinationIoError,
            "Creating temporary output file failed",
            directory.display(),
            source: err
        )
    })?;

    let (file, temp_path) = temp.into_parts();
    let mut out = BufWriter::new(file);
    write(&mut out)?;
    out.flush()?;
    let file = out.into_inner().map_err(|err| {
        etl_error!(
            ErrorKind::DestinationIoError,
            "Flushing output file failed",
            target.display(),
            source: err.into_error()
        )
    })?;
    file.sync_all()?;
    drop(file);

    temp_path.persist(target).map_err(|err| {
        etl_error!(
            ErrorKind::DestinationIoError,
            "Moving output file into place failed",
            target.display(),
            source: err.error
        )
    })?;

    Ok(())
}

/// Rejects table names that cannot be used as a file name inside the output directory.
fn validate_file_stem(table: &str) -> EtlResult<()> {
    if table.is_empty() || table == "." || table == ".." || table.contains(['/', '\\', '\0']) {
        bail!(
            ErrorKind::InvalidData,
            "Table name cannot be used as a file name",
            table
        );
    }

    Ok(())
}
