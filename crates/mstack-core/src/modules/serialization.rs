//! Byte-level output helpers shared by the table and archive writers.

use crate::domain::{StackError, StackResult};
use std::fs;
use std::path::Path;

/// `\n` line endings and a trailing newline, so equal tables give equal bytes.
pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Writes `bytes` to `path`, creating missing parent directories. I/O
/// failures are reported under `placeholder`.
pub fn write_binary_artifact(
    path: &Path,
    bytes: &[u8],
    placeholder: &'static str,
) -> StackResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            StackError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!("failed to create directory '{}': {}", parent.display(), source),
            )
        })?;
    }
    fs::write(path, bytes).map_err(|source| {
        StackError::io_system(
            placeholder,
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

pub fn write_text_artifact(
    path: &Path,
    content: &str,
    placeholder: &'static str,
) -> StackResult<()> {
    write_binary_artifact(path, normalize_text_artifact(content).as_bytes(), placeholder)
}

pub(crate) fn push_u32(target: &mut Vec<u8>, value: u32) {
    target.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn push_f64(target: &mut Vec<u8>, value: f64) {
    target.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn take_u32(bytes: &[u8], offset: &mut usize) -> Option<u32> {
    let end = offset.checked_add(std::mem::size_of::<u32>())?;
    let value = u32::from_le_bytes(bytes.get(*offset..end)?.try_into().ok()?);
    *offset = end;
    Some(value)
}

pub(crate) fn take_f64(bytes: &[u8], offset: &mut usize) -> Option<f64> {
    let end = offset.checked_add(std::mem::size_of::<f64>())?;
    let value = f64::from_le_bytes(bytes.get(*offset..end)?.try_into().ok()?);
    *offset = end;
    Some(value)
}
