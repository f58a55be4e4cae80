//! Script input sources.
//!
//! A script is read once, in full, from a file or from piped stdin. Events
//! are replayed afterwards on their own timeline, so there is no need to
//! stream.

use crate::model::error::InputError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Where the script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A JSONL file on disk.
    File(PathBuf),
    /// Standard input.
    Stdin,
}

impl InputSource {
    /// File if a path was given, stdin otherwise.
    pub fn detect(file: Option<PathBuf>) -> Self {
        match file {
            Some(path) => InputSource::File(path),
            None => InputSource::Stdin,
        }
    }

    /// Read every line of the script.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist and
    /// `InputError::Io` for any other read failure.
    pub fn read_lines(&self) -> Result<Vec<String>, InputError> {
        match self {
            InputSource::File(path) => {
                if !path.exists() {
                    return Err(InputError::FileNotFound { path: path.clone() });
                }
                read_all(BufReader::new(File::open(path)?))
            }
            InputSource::Stdin => read_all(std::io::stdin().lock()),
        }
    }
}

/// Collect all lines from a reader.
pub fn read_all<R: BufRead>(reader: R) -> Result<Vec<String>, InputError> {
    reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(InputError::from)
}
