pub mod output;
pub mod readme;
pub mod walker;

pub use output::{create_writer, JsonWriter, OutputFormat, OutputWriter, TerminalWriter};
pub use readme::{ConventionalReadme, ReadmeInfo, ReadmeLocator};
pub use walker::{is_test_file, relative_to, FileWalker, SourceFiles};

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Read a source file as text, replacing invalid UTF-8 sequences.
pub fn read_source(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}

pub fn file_size(path: &Path) -> std::io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}
