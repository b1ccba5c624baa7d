//! Loading operators and observations from delimited text.
//!
//! Values may be separated by commas, semicolons or any whitespace, in any
//! mix; line breaks carry no meaning beyond separating values, so a matrix
//! may be stored one row per line or as a single flat column. Operators are
//! read row-major.
//!
//! Parsing text is slow for large operators, so a flat little-endian `f64`
//! binary cache can be written next to the text file and is preferred on
//! later loads (see [`load_with_cache`]).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LoadError, ValidationError};
use crate::types::DenseMatrix;

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// Parse every number in `reader`.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for a token that is not a number, or
/// [`LoadError::Io`] if reading fails.
pub fn read_values<R: BufRead>(reader: R) -> Result<Vec<f64>, LoadError> {
    let mut values = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        for token in line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value = token.parse::<f64>().map_err(|_| LoadError::Parse {
                line: i + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }

    Ok(values)
}

/// Read an observation vector `g`.
///
/// # Errors
///
/// As [`read_values`]; additionally [`LoadError::Shape`] if the source
/// holds no values.
pub fn read_observation<R: BufRead>(reader: R) -> Result<Vec<f64>, LoadError> {
    let g = read_values(reader)?;
    if g.is_empty() {
        return Err(ValidationError::DimensionMismatch("observation source is empty".into()).into());
    }
    debug!("loaded observation with {} values", g.len());
    Ok(g)
}

impl DenseMatrix {
    /// Read a `rows x cols` operator stored row-major as delimited text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Shape`] if the number of values is not
    /// `rows * cols`, and the errors of [`read_values`].
    pub fn from_delimited<R: BufRead>(
        reader: R,
        rows: usize,
        cols: usize,
    ) -> Result<Self, LoadError> {
        let data = read_values(reader)?;
        let h = DenseMatrix::new(rows, cols, data)?;
        debug!("loaded {rows}x{cols} operator");
        Ok(h)
    }
}

// ---------------------------------------------------------------------------
// Binary cache
// ---------------------------------------------------------------------------

/// Write `values` as consecutive little-endian `f64`s.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the writer fails.
pub fn write_binary<W: Write>(mut writer: W, values: &[f64]) -> Result<(), LoadError> {
    for v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read consecutive little-endian `f64`s until end of input.
///
/// # Errors
///
/// Returns [`LoadError::Shape`] if the byte count is not a multiple of 8,
/// or [`LoadError::Io`] if reading fails.
pub fn read_binary<R: Read>(mut reader: R) -> Result<Vec<f64>, LoadError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() % F64_BYTES != 0 {
        return Err(ValidationError::DimensionMismatch(format!(
            "binary cache of {} bytes is not a whole number of f64 values",
            bytes.len(),
        ))
        .into());
    }

    Ok(bytes
        .chunks_exact(F64_BYTES)
        .map(|chunk| {
            let mut buf = [0u8; F64_BYTES];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect())
}

/// Path of the binary cache belonging to a text file: same stem, `.bin`.
pub fn cache_path(path: &Path) -> PathBuf {
    path.with_extension("bin")
}

/// Load the values of a delimited text file, using its binary cache when
/// present and creating the cache after a text parse.
///
/// Failure to write the cache is logged and otherwise ignored.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if neither the cache nor the text file can be
/// read, and the errors of [`read_values`] / [`read_binary`].
pub fn load_with_cache(path: &Path) -> Result<Vec<f64>, LoadError> {
    let cache = cache_path(path);

    if cache.is_file() {
        debug!("loading binary cache {}", cache.display());
        return read_binary(BufReader::new(File::open(&cache)?));
    }

    debug!("parsing {}", path.display());
    let values = read_values(BufReader::new(File::open(path)?))?;

    if !values.is_empty() {
        let written = File::create(&cache)
            .map_err(LoadError::from)
            .and_then(|file| write_binary(BufWriter::new(file), &values));
        if let Err(e) = written {
            warn!("could not write binary cache {}: {e}", cache.display());
        }
    }

    Ok(values)
}
