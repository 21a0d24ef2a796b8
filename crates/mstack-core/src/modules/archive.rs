//! Binary archive of named (object x draw) arrays, one file per stage.

use super::serialization::{push_f64, push_u32, take_f64, take_u32, write_binary_artifact};
use crate::domain::{OutputArtifact, StackError, StackResult};
use ndarray::{Array1, Array2, ArrayView1};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const ENSEMBLE_ARCHIVE_MAGIC: &[u8; 8] = b"MSTKENS1";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnsembleArchive {
    entries: BTreeMap<String, Array2<f64>>,
}

impl EnsembleArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Array2<f64>) {
        self.entries.insert(name.into(), values);
    }

    /// Stores a per-object vector as a single-column array.
    pub fn insert_vector(&mut self, name: impl Into<String>, values: ArrayView1<'_, f64>) {
        let column = values.to_owned().insert_axis(ndarray::Axis(1));
        self.entries.insert(name.into(), column);
    }

    pub fn get(&self, name: &str) -> Option<&Array2<f64>> {
        self.entries.get(name)
    }

    pub fn vector(&self, name: &str) -> Option<Array1<f64>> {
        self.entries
            .get(name)
            .filter(|values| values.ncols() == 1)
            .map(|values| values.column(0).to_owned())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(ENSEMBLE_ARCHIVE_MAGIC);
        push_u32(&mut bytes, self.entries.len() as u32);
        for (name, values) in &self.entries {
            push_u32(&mut bytes, name.len() as u32);
            bytes.extend_from_slice(name.as_bytes());
            push_u32(&mut bytes, values.nrows() as u32);
            push_u32(&mut bytes, values.ncols() as u32);
            for value in values.iter() {
                push_f64(&mut bytes, *value);
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> StackResult<Self> {
        if bytes.get(..ENSEMBLE_ARCHIVE_MAGIC.len()) != Some(ENSEMBLE_ARCHIVE_MAGIC.as_slice()) {
            return Err(corrupt("missing ensemble archive magic"));
        }
        let mut offset = ENSEMBLE_ARCHIVE_MAGIC.len();
        let count = take_u32(bytes, &mut offset).ok_or_else(|| corrupt("truncated entry count"))?;

        let mut archive = Self::new();
        for entry in 0..count {
            let name_len = take_u32(bytes, &mut offset)
                .ok_or_else(|| corrupt(format!("truncated name length for entry {}", entry)))?
                as usize;
            let name_bytes = bytes
                .get(offset..offset + name_len)
                .ok_or_else(|| corrupt(format!("truncated name for entry {}", entry)))?;
            let name = String::from_utf8(name_bytes.to_vec())
                .map_err(|_| corrupt(format!("entry {} name is not UTF-8", entry)))?;
            offset += name_len;

            let rows = take_u32(bytes, &mut offset)
                .ok_or_else(|| corrupt(format!("truncated shape for '{}'", name)))?
                as usize;
            let cols = take_u32(bytes, &mut offset)
                .ok_or_else(|| corrupt(format!("truncated shape for '{}'", name)))?
                as usize;
            let count = rows
                .checked_mul(cols)
                .ok_or_else(|| corrupt(format!("shape overflow for '{}'", name)))?;
            let mut values = Vec::with_capacity(count.min((bytes.len() - offset) / 8));
            for _ in 0..count {
                values.push(
                    take_f64(bytes, &mut offset)
                        .ok_or_else(|| corrupt(format!("truncated values for '{}'", name)))?,
                );
            }
            let array = Array2::from_shape_vec((rows, cols), values)
                .map_err(|error| corrupt(format!("bad shape for '{}': {}", name, error)))?;
            archive.insert(name, array);
        }

        if offset != bytes.len() {
            return Err(corrupt(format!(
                "{} trailing bytes after last entry",
                bytes.len() - offset
            )));
        }
        Ok(archive)
    }
}

/// Writes the archive, replacing (never merging with) an existing file.
pub fn write_archive(archive: &EnsembleArchive, path: &Path) -> StackResult<OutputArtifact> {
    let exists = path.exists();
    if exists {
        tracing::warn!(path = %path.display(), "Overwriting");
    } else {
        tracing::info!(path = %path.display(), entries = archive.len(), "Writing");
    }
    write_binary_artifact(path, &archive.to_bytes(), "IO.ARCHIVE_WRITE")?;
    Ok(OutputArtifact::new(path, exists))
}

pub fn read_archive(path: &Path) -> StackResult<EnsembleArchive> {
    if !path.is_file() {
        return Err(StackError::missing_file(path));
    }
    let bytes = fs::read(path).map_err(|source| {
        StackError::io_system(
            "IO.ARCHIVE_READ",
            format!("failed to read archive '{}': {}", path.display(), source),
        )
    })?;
    EnsembleArchive::from_bytes(&bytes)
}

fn corrupt(message: impl Into<String>) -> StackError {
    StackError::io_system("IO.ARCHIVE_CORRUPT", message)
}
