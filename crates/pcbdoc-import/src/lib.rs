pub mod error;
pub mod geometry;
pub mod parsers;
pub mod types;

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use serde::Serialize;

pub use error::ImportError;
pub use parsers::altium::context::Diagnostic;
use parsers::altium::{ascii, binary, units};
use types::{Board, Coord};

/// On-disk flavour of a PcbDoc file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `RECORD=...|KEY=VALUE` lines.
    Ascii,
    /// Compound document with one storage per object kind.
    Binary,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Read size of the text tokenizer; blocks grow to the next line end.
    pub block_size: usize,
    /// Clearance of copper objects when no rule applies.
    pub default_clearance: Coord,
    /// Solder mask expansion of pads without a manual value.
    pub default_mask_expansion: Coord,
    /// Paste expansion of pads without a manual value.
    pub default_paste_expansion: Coord,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            block_size: ascii::DEFAULT_BLOCK_SIZE,
            default_clearance: units::mil(10.0),
            default_mask_expansion: units::mil(4.0),
            default_paste_expansion: 0,
        }
    }
}

/// Result of one import: the board and every record that was skipped.
#[derive(Debug, Serialize)]
pub struct Import {
    pub board: Board,
    pub diagnostics: Vec<Diagnostic>,
}

/// Detect the dialect from the file contents.
pub fn detect_dialect(path: &Path) -> Result<Option<Dialect>, ImportError> {
    let mut head = Vec::with_capacity(256);
    File::open(path)?.take(256).read_to_end(&mut head)?;
    if binary::sniff(&head[..]) {
        Ok(Some(Dialect::Binary))
    } else if ascii::sniff(&head[..]) {
        Ok(Some(Dialect::Ascii))
    } else {
        Ok(None)
    }
}

/// Sniff the dialect and import a file.
pub fn import(path: &Path, opts: &ImportOptions) -> Result<Import, ImportError> {
    let dialect = detect_dialect(path)?
        .ok_or_else(|| ImportError::NotPcbDoc(path.display().to_string()))?;
    import_reader(File::open(path)?, dialect, opts)
}

/// Import from any seekable reader with a known dialect.
pub fn import_reader<R: Read + Seek>(
    reader: R,
    dialect: Dialect,
    opts: &ImportOptions,
) -> Result<Import, ImportError> {
    parsers::altium::import(reader, dialect, opts)
}
