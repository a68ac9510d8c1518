use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::{part_file_name, SUCCESS_MARKER};
use crate::error::{JobError, Result};
use crate::types::OutputRecord;

/// Create the job output directory; it must not exist yet
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Err(JobError::OutputExists(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write one reduce partition as `label\tcount` lines
pub fn write_part_file(dir: &Path, partition: usize, records: &[OutputRecord]) -> Result<PathBuf> {
    let path = dir.join(part_file_name(partition));
    let mut writer = BufWriter::new(File::create(&path)?);
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()?;
    Ok(path)
}

/// Mark the output directory as complete
pub fn write_success_marker(dir: &Path) -> Result<()> {
    File::create(dir.join(SUCCESS_MARKER))?;
    Ok(())
}
