//! PDF Watermarker Library
//!
//! A cross-platform library for stamping a diagonal text watermark onto every
//! page of one or more PDFs. This library provides functionality to:
//! - Center rotated watermark text on a page
//! - Stamp semi-transparent text in one of the standard PDF fonts
//! - Watermark a batch of files into a single zip archive
//! - Render a debounced one-page preview
//!
//! # Example
//!
//! ```no_run
//! use pdf_watermarker::batch::watermark_batch;
//! use pdf_watermarker::intake::InputFile;
//! use pdf_watermarker::pdf::WatermarkOptions;
//!
//! let files = vec![
//!     InputFile::from_path("1. intro.pdf"),
//!     InputFile::from_path("2. advanced.pdf"),
//! ];
//! let options = WatermarkOptions::with_text("CONFIDENTIAL");
//!
//! let archive = watermark_batch(&files, &options).expect("Failed to watermark PDFs");
//! std::fs::write("pdfwatermarked.zip", archive).expect("Failed to save archive");
//! ```

pub mod archive;
pub mod batch;
pub mod error;
pub mod font;
pub mod intake;
pub mod layout;
pub mod pdf;
pub mod preview;
pub mod session;
pub mod state;

// Re-export commonly used items
pub use error::{Error, Result};
pub use font::StandardFont;
pub use layout::{calculate_placement, PageGeometry, Placement, TextMetrics};
