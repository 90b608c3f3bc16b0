//! Stamping diagonal watermark text onto PDF pages using lopdf
//!
//! The watermark is drawn into each page's own content: the existing content
//! streams are wrapped in a `q`/`Q` pair, the font and transparency state are
//! merged into the page resources, and one more content stream draws the text.

use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::font::StandardFont;
use crate::layout::{calculate_placement, Placement, TextMetrics, DEFAULT_ROTATION_DEGREES};
use crate::pdf::metadata::{inherited_attribute, page_geometry, resolve, touch_info};

/// Fill opacity of the watermark text
pub const WATERMARK_OPACITY: f32 = 0.2;

/// Smallest accepted font size in points
pub const MIN_FONT_SIZE: u16 = 10;

/// Largest accepted font size in points
pub const MAX_FONT_SIZE: u16 = 100;

/// Font size used when none is given
pub const DEFAULT_FONT_SIZE: u16 = 50;

/// Options for stamping a watermark onto a PDF
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    /// Watermark text; empty means "no watermark"
    pub text: String,
    /// Standard font used to draw the text
    pub font: StandardFont,
    /// Font size in points
    pub font_size: u16,
    /// Rotation in degrees (negative is clockwise)
    pub rotation_degrees: f64,
    /// Fill opacity between 0 and 1
    pub opacity: f32,
    /// Whether to record Producer/ModDate in the Info dictionary on save
    pub update_metadata: bool,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: StandardFont::Helvetica,
            font_size: DEFAULT_FONT_SIZE,
            rotation_degrees: DEFAULT_ROTATION_DEGREES,
            opacity: WATERMARK_OPACITY,
            update_metadata: true,
        }
    }
}

impl WatermarkOptions {
    /// Default options with the given text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Empty text means the document is passed through unchanged
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Check the options before touching any document
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(Error::InvalidFontSize(self.font_size));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(Error::InvalidOption(format!(
                "rotation must be finite, got {}",
                self.rotation_degrees
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidOption(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        self.font.encode(&self.text)?;
        Ok(())
    }

    /// Size of the un-rotated text box for the configured font and size
    pub fn text_metrics(&self) -> Result<TextMetrics> {
        self.font.measure(&self.text, self.font_size as f64)
    }
}

/// Objects shared read-only by every stamped page of one document
struct SharedResources {
    font_id: ObjectId,
    graphics_state_id: ObjectId,
    save_state_id: ObjectId,
    restore_state_id: ObjectId,
}

impl SharedResources {
    fn register(doc: &mut Document, options: &WatermarkOptions) -> Self {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(options.font.base_font_name().as_bytes().to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font_id = doc.add_object(Object::Dictionary(font));

        let mut graphics_state = Dictionary::new();
        graphics_state.set("Type", Object::Name(b"ExtGState".to_vec()));
        graphics_state.set("ca", Object::Real(options.opacity));
        graphics_state.set("CA", Object::Real(options.opacity));
        let graphics_state_id = doc.add_object(Object::Dictionary(graphics_state));

        let save_state_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore_state_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

        Self {
            font_id,
            graphics_state_id,
            save_state_id,
            restore_state_id,
        }
    }
}

/// Stamp the watermark onto every page of a loaded document
///
/// Returns the number of pages stamped. Blank text leaves the document
/// untouched and returns 0.
pub fn stamp_document(doc: &mut Document, options: &WatermarkOptions) -> Result<usize> {
    options.validate()?;

    if options.is_blank() {
        debug!("blank watermark text, leaving pages untouched");
        return Ok(0);
    }

    let metrics = options.text_metrics()?;
    let encoded = options.font.encode(&options.text)?;
    let shared = SharedResources::register(doc, options);

    // Collect page info first (to avoid borrow issues)
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

    for (page_number, page_id) in &pages {
        let geometry = page_geometry(doc, *page_number, *page_id)?;
        let placement = calculate_placement(&geometry, &metrics, options.rotation_degrees);
        debug!(
            page = page_number,
            width = geometry.width,
            height = geometry.height,
            x = placement.x,
            y = placement.y,
            "placing watermark"
        );

        let (font_name, state_name) = add_watermark_to_page_resources(doc, *page_id, &shared)?;
        isolate_page_content(doc, *page_id, &shared)?;

        let content = generate_watermark_content(
            &encoded,
            &font_name,
            &state_name,
            options.font_size,
            &placement,
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        append_content_to_page(doc, *page_id, content_id)?;
    }

    Ok(pages.len())
}

/// Watermark a PDF held in memory and return the serialized result
pub fn watermark_pdf_bytes(bytes: &[u8], options: &WatermarkOptions) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)?;
    let pages = stamp_document(&mut doc, options)?;
    debug!(pages, "stamped document");
    save_document(&mut doc, options)
}

/// Serialize a document, recording this tool in its Info dictionary if asked
pub(crate) fn save_document(doc: &mut Document, options: &WatermarkOptions) -> Result<Vec<u8>> {
    if options.update_metadata {
        touch_info(doc)?;
    }

    doc.compress();
    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}

/// Add a watermark to a PDF file
///
/// # Example
///
/// ```no_run
/// use pdf_watermarker::pdf::{add_watermark, WatermarkOptions};
/// use std::path::Path;
///
/// let options = WatermarkOptions::with_text("CONFIDENTIAL");
///
/// add_watermark(
///     Path::new("input.pdf"),
///     Path::new("output.pdf"),
///     &options
/// ).expect("Failed to add watermark");
/// ```
pub fn add_watermark(input_path: &Path, output_path: &Path, options: &WatermarkOptions) -> Result<()> {
    if !input_path.exists() {
        return Err(Error::FileNotFound(input_path.to_path_buf()));
    }

    let bytes = std::fs::read(input_path)?;
    let output = watermark_pdf_bytes(&bytes, options)?;
    std::fs::write(output_path, output)?;

    info!(input = %input_path.display(), output = %output_path.display(), "watermarked");
    Ok(())
}

/// Generate the content stream that draws the rotated text
fn generate_watermark_content(
    text: &[u8],
    font_name: &str,
    state_name: &str,
    font_size: u16,
    placement: &Placement,
) -> String {
    let (sin, cos) = placement.rotation_degrees.to_radians().sin_cos();

    let mut content = String::new();
    content.push_str("q\n");
    content.push_str(&format!("/{} gs\n", state_name));
    content.push_str("0 0 0 rg\n"); // black fill
    content.push_str("BT\n");
    content.push_str(&format!("/{} {} Tf\n", font_name, font_size));
    content.push_str(&format!(
        "{} {} {} {} {} {} Tm\n",
        format_number(cos),
        format_number(sin),
        format_number(-sin),
        format_number(cos),
        format_number(placement.x),
        format_number(placement.y),
    ));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
    content.push_str("ET\n");
    content.push_str("Q\n");
    content
}

/// Format a number for a content stream without exponent notation
fn format_number(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Write encoded text as a literal string body, octal-escaping bytes above ASCII
fn escape_pdf_string(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' | b'(' | b')' => {
                escaped.push('\\');
                escaped.push(byte as char);
            }
            0x20..=0x7E => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{:03o}", byte)),
        }
    }
    escaped
}

/// Pick a resource name not already used in `category`
fn unique_resource_name(category: &Dictionary, base: &str) -> String {
    if !category.has(base.as_bytes()) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|name| !category.has(name.as_bytes()))
        .unwrap_or_else(|| base.to_string())
}

/// Clone a resource category (Font, ExtGState, ...) as a direct dictionary
fn resource_category(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|value| resolve(doc, value).ok())
        .and_then(|value| value.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// Merge the watermark font and graphics state into a page's Resources
///
/// Resources may be inherited from the page tree or stored indirectly; the
/// merged copy is set directly on the page so other pages sharing the
/// original dictionary are unaffected. Returns the names the font and the
/// graphics state were registered under.
fn add_watermark_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    shared: &SharedResources,
) -> Result<(String, String)> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources")? {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut fonts = resource_category(doc, &resources, b"Font");
    let font_name = unique_resource_name(&fonts, "WmFont");
    fonts.set(font_name.as_bytes(), Object::Reference(shared.font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = resource_category(doc, &resources, b"ExtGState");
    let state_name = unique_resource_name(&states, "WmGS");
    states.set(state_name.as_bytes(), Object::Reference(shared.graphics_state_id));
    resources.set("ExtGState", Object::Dictionary(states));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok((font_name, state_name))
}

/// The page's content stream references as a list
fn page_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(array)) => array.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(array)) => array.clone(),
        _ => vec![],
    };

    Ok(contents)
}

/// Wrap the existing page content in q/Q
///
/// Pages may leave a transformation matrix or colour set when their content
/// ends; restoring the graphics state keeps those from leaking into the
/// watermark.
fn isolate_page_content(doc: &mut Document, page_id: ObjectId, shared: &SharedResources) -> Result<()> {
    if page_contents(doc, page_id)?.is_empty() {
        return Ok(());
    }

    prepend_content_to_page(doc, page_id, shared.save_state_id)?;
    append_content_to_page(doc, page_id, shared.restore_state_id)
}

/// Prepend a content stream to a page's Contents
fn prepend_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let mut contents = page_contents(doc, page_id)?;
    contents.insert(0, Object::Reference(new_content_id));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Append a content stream to a page's Contents
///
/// We append after the original content so the watermark is drawn on top
/// (not covered by background fills).
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let mut contents = page_contents(doc, page_id)?;
    contents.push(Object::Reference(new_content_id));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}
