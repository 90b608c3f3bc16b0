//! Error types for the PDF watermarker library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF watermarker library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Font name is not one of the standard fonts
    #[error("Unknown font: {0}")]
    UnknownFont(String),

    /// Symbol and ZapfDingbats have no usable text glyphs
    #[error("Symbolic font cannot be used for watermark text: {0}")]
    SymbolicFont(String),

    /// Character outside the font's encoding
    #[error("Character {character:?} cannot be encoded with {font}")]
    UnencodableCharacter { character: char, font: &'static str },

    /// Font size outside the accepted range
    #[error("Font size {0} is out of range (expected {min}-{max})", min = crate::pdf::MIN_FONT_SIZE, max = crate::pdf::MAX_FONT_SIZE)]
    InvalidFontSize(u16),

    /// Other invalid watermark option
    #[error("Invalid watermark option: {0}")]
    InvalidOption(String),

    /// Two inputs map to the same archive entry
    #[error("{} and {} would both be stored as {name}", .first.display(), .second.display())]
    DuplicateEntryName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Page has no MediaBox, neither its own nor inherited
    #[error("Page {0} has no MediaBox")]
    MissingMediaBox(u32),

    /// Failure while processing one file of a batch
    #[error("{name}: {source}")]
    InFile {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// General error
    #[error("{0}")]
    General(String),
}
