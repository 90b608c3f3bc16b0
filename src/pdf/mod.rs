//! PDF manipulation module

pub mod metadata;
pub mod stamp;

// Re-export commonly used items
pub use metadata::{extract_metadata, page_geometry, PdfMetadata};
pub use stamp::{
    add_watermark, stamp_document, watermark_pdf_bytes, WatermarkOptions, DEFAULT_FONT_SIZE,
    MAX_FONT_SIZE, MIN_FONT_SIZE, WATERMARK_OPACITY,
};
