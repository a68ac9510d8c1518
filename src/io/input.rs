use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{JobError, Result};

/// A contiguous run of input lines processed by one map task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSplit {
    pub file: PathBuf,
    /// Zero-based line number of the first line in the file
    pub first_line: usize,
    pub lines: Vec<String>,
}

/// Resolve the input files of a job.
///
/// A file path is used as is. For a directory, every regular file whose name
/// does not start with `_` or `.` is taken, sorted by name, so markers like
/// `_SUCCESS` and hidden files are ignored.
pub fn discover_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(path)?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('_') || name.starts_with('.') {
            debug!("Skipping input candidate {}", name);
            continue;
        }
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(JobError::NoInput(path.to_path_buf()));
    }
    Ok(files)
}

/// Read a file and cut it into splits of at most `split_lines` lines.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the
/// line; the parser then decides whether the result is usable.
pub fn read_splits(file: &Path, split_lines: usize) -> Result<Vec<InputSplit>> {
    let split_lines = split_lines.max(1);
    let mut reader = BufReader::new(File::open(file)?);

    let mut splits = Vec::new();
    let mut current = Vec::with_capacity(split_lines.min(1024));
    let mut first_line = 0;
    let mut line_no = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        let mut line = String::from_utf8_lossy(&buf).into_owned();
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        current.push(line);
        line_no += 1;

        if current.len() == split_lines {
            splits.push(InputSplit {
                file: file.to_path_buf(),
                first_line,
                lines: std::mem::take(&mut current),
            });
            first_line = line_no;
        }
    }

    if !current.is_empty() {
        splits.push(InputSplit {
            file: file.to_path_buf(),
            first_line,
            lines: current,
        });
    }
    Ok(splits)
}
