//! Batch watermarking of many PDFs into one archive

use std::path::Path;
use tracing::info;
use crate::archive::ArchiveWriter;
use crate::error::{Error, Result};
use crate::intake::{ensure_unique_names, InputFile};
use crate::pdf::{watermark_pdf_bytes, WatermarkOptions};

/// Watermark every input and bundle the results into a zip archive
///
/// Files are processed one at a time in input order, so archive entries
/// follow the input order too. The first failing file aborts the whole batch;
/// the returned error names it. Inputs sharing an entry name are rejected
/// before any file is read.
///
/// An empty input list yields an empty archive.
pub fn watermark_batch(files: &[InputFile], options: &WatermarkOptions) -> Result<Vec<u8>> {
    options.validate()?;
    ensure_unique_names(files)?;

    let mut archive = ArchiveWriter::new();

    for (index, file) in files.iter().enumerate() {
        info!(file = %file.name, "watermarking {}/{}", index + 1, files.len());

        let watermarked = file
            .read()
            .and_then(|bytes| watermark_pdf_bytes(&bytes, options))
            .map_err(|e| Error::InFile {
                name: file.name.clone(),
                source: Box::new(e),
            })?;

        archive.add_entry(&file.name, &watermarked)?;
    }

    archive.finish()
}

/// Watermark a batch and write the archive to `output_path`
///
/// Returns the number of files in the archive.
pub fn write_batch_archive(
    files: &[InputFile],
    options: &WatermarkOptions,
    output_path: &Path,
) -> Result<usize> {
    let archive = watermark_batch(files, options)?;
    std::fs::write(output_path, archive)?;
    info!(output = %output_path.display(), files = files.len(), "archive written");
    Ok(files.len())
}
