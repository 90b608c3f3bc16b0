//! PDF metadata: page counts, page sizes and the Info dictionary

use std::path::Path;
use chrono::Utc;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use crate::error::{Error, Result};
use crate::layout::PageGeometry;

/// Producer string written into the Info dictionary of watermarked files
pub const PRODUCER: &str = concat!("pdf-watermarker ", env!("CARGO_PKG_VERSION"));

/// Follow a reference to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up a page attribute, walking up the Parent chain for inheritable keys
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut node = doc.get_dictionary(page_id)?;

    // Bounded to survive a Parent cycle in a damaged file
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Ok(Some(resolve(doc, value)?));
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node = doc.get_dictionary(*parent_id)?,
            _ => break,
        }
    }

    Ok(None)
}

/// Read the width and height of a page from its MediaBox
pub fn page_geometry(doc: &Document, page_number: u32, page_id: ObjectId) -> Result<PageGeometry> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?
        .ok_or(Error::MissingMediaBox(page_number))?;

    let corners = media_box
        .as_array()?
        .iter()
        .map(|value| resolve(doc, value).and_then(|v| Ok(v.as_float()? as f64)))
        .collect::<Result<Vec<f64>>>()?;

    if corners.len() != 4 {
        return Err(Error::MissingMediaBox(page_number));
    }

    Ok(PageGeometry::new(
        (corners[2] - corners[0]).abs(),
        (corners[3] - corners[1]).abs(),
    ))
}

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog()?;

    let pages_id = match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::General("Pages is not a reference".to_string())),
        Err(_) => return Err(Error::General("No Pages in catalog".to_string())),
    };

    let count = doc
        .get_dictionary(pages_id)?
        .get(b"Count")
        .map_err(|_| Error::General("No Count in Pages".to_string()))?;

    match resolve(doc, count)? {
        Object::Integer(n) => Ok((*n).max(0) as usize),
        _ => Err(Error::General("Count is not an integer".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Size of every page, in page order
    pub page_sizes: Vec<PageGeometry>,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve(doc, info).ok()?.as_dict().ok()
}

fn info_string(info: Option<&Dictionary>, key: &[u8]) -> Option<String> {
    let bytes = info?.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    let page_count = count_pages_from_catalog(&doc)?;
    let page_sizes = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| page_geometry(&doc, number, id))
        .collect::<Result<Vec<_>>>()?;

    let info = info_dictionary(&doc);

    Ok(PdfMetadata {
        page_count,
        page_sizes,
        title: info_string(info, b"Title"),
        author: info_string(info, b"Author"),
        producer: info_string(info, b"Producer"),
    })
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSSZ`)
fn pdf_date_now() -> String {
    Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Record this tool as Producer and bump ModDate in the Info dictionary
///
/// Creates the Info dictionary when the document has none. Other entries are
/// left as they are.
pub fn touch_info(doc: &mut Document) -> Result<()> {
    let producer = Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal);
    let mod_date = Object::String(pdf_date_now().into_bytes(), StringFormat::Literal);

    let info_ref = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    if let Some(info_id) = info_ref {
        if let Ok(info) = doc.get_dictionary_mut(info_id) {
            info.set("Producer", producer);
            info.set("ModDate", mod_date);
            return Ok(());
        }
    }

    let mut info = match doc.trailer.get(b"Info") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    info.set("Producer", producer);
    info.set("ModDate", mod_date);

    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));

    Ok(())
}
