//! Integration tests for the PDF watermarker library

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_watermarker::batch::{watermark_batch, write_batch_archive};
use pdf_watermarker::intake::{collect_inputs, InputFile};
use pdf_watermarker::pdf::{add_watermark, extract_metadata, watermark_pdf_bytes, WatermarkOptions};
use pdf_watermarker::preview::render_preview;
use pdf_watermarker::{Error, StandardFont};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Build a US Letter PDF whose MediaBox and Resources live on the page tree
fn sample_pdf(pages: usize, font_names: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let mut fonts = lopdf::Dictionary::new();
    for name in font_names {
        fonts.set(name.as_bytes(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font_names[0].into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", number))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a sample PDF into `dir` and return its path
fn write_sample(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, sample_pdf(pages, &["F1"])).unwrap();
    path
}

/// Decoded content of every page, in page order
fn page_contents(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).into_owned())
        .collect()
}

fn first_page_fonts(bytes: &[u8]) -> lopdf::Dictionary {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id: ObjectId = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    resources.get(b"Font").unwrap().as_dict().unwrap().clone()
}

/// Read every entry of a zip archive as (name, bytes)
fn archive_entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut entry = zip.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

#[test]
fn test_batch_archive_has_one_entry_per_input_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let files = vec![
        InputFile::from_path(write_sample(temp_dir.path(), "2. second.pdf", 1)),
        InputFile::from_path(write_sample(temp_dir.path(), "1. first.pdf", 3)),
    ];

    let archive = watermark_batch(&files, &WatermarkOptions::with_text("CONFIDENTIAL"))
        .expect("Failed to watermark batch");
    let entries = archive_entries(&archive);

    let names: Vec<_> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["2. second.pdf", "1. first.pdf"]);

    let pages: Vec<_> = entries.iter().map(|(_, data)| page_contents(data).len()).collect();
    assert_eq!(pages, [1, 3]);

    for (name, data) in &entries {
        for (i, content) in page_contents(data).iter().enumerate() {
            assert!(
                content.contains("(CONFIDENTIAL) Tj"),
                "{} page {} has no watermark",
                name,
                i + 1
            );
        }
    }
}

#[test]
fn test_same_file_name_in_two_folders_fails_before_work() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for folder in ["a", "b"] {
        std::fs::create_dir(temp_dir.path().join(folder)).unwrap();
    }
    let first = write_sample(&temp_dir.path().join("a"), "report.pdf", 1);
    let second = write_sample(&temp_dir.path().join("b"), "report.pdf", 2);

    let files = vec![InputFile::from_path(&first), InputFile::from_path(&second)];
    match watermark_batch(&files, &WatermarkOptions::with_text("X")) {
        Err(Error::DuplicateEntryName { name, first: a, second: b }) => {
            assert_eq!(name, "report.pdf");
            assert_eq!((a, b), (first.clone(), second.clone()));
        }
        other => panic!("expected DuplicateEntryName, got {:?}", other.map(|a| a.len())),
    }

    // Whole folders keep their names apart
    let files = collect_inputs(&[
        temp_dir.path().join("a").display().to_string(),
        temp_dir.path().join("b").display().to_string(),
    ])
    .unwrap();
    let archive = watermark_batch(&files, &WatermarkOptions::with_text("X")).unwrap();
    let names: Vec<_> = archive_entries(&archive).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["a/report.pdf", "b/report.pdf"]);
}

#[test]
fn test_latin1_and_cp1252_text_is_stamped() {
    let cases = [
        ("BROUILLON ÉTÉ", "(BROUILLON \\311T\\311) Tj"),
        ("Entwurf – intern", "(Entwurf \\226 intern) Tj"),
        ("naïve", "(na\\357ve) Tj"),
        ("© 2024", "(\\251 2024) Tj"),
    ];

    for (text, operand) in cases {
        let output = watermark_pdf_bytes(&sample_pdf(1, &["F1"]), &WatermarkOptions::with_text(text))
            .unwrap_or_else(|e| panic!("failed to stamp {:?}: {}", text, e));
        let content = &page_contents(&output)[0];
        assert!(content.contains(operand), "{:?} not drawn as {}", text, operand);
    }
}

#[test]
fn test_text_outside_winansi_is_rejected() {
    let result = watermark_pdf_bytes(&sample_pdf(1, &["F1"]), &WatermarkOptions::with_text("草稿"));
    assert!(matches!(result, Err(Error::UnencodableCharacter { character: '草', .. })));
}

#[test]
fn test_every_page_is_stamped() {
    let options = WatermarkOptions::with_text("DRAFT");
    let output = watermark_pdf_bytes(&sample_pdf(3, &["F1"]), &options).unwrap();

    let contents = page_contents(&output);
    assert_eq!(contents.len(), 3);
    for (i, content) in contents.iter().enumerate() {
        assert!(content.contains(&format!("Page {}", i + 1)), "page {} lost its content", i + 1);
        assert!(content.contains("(DRAFT) Tj"), "page {} has no watermark", i + 1);
        assert!(content.contains("/WmGS gs"));
        assert!(content.contains("/WmFont 50 Tf"));
    }
}

#[test]
fn test_watermark_drawn_after_original_content() {
    let output = watermark_pdf_bytes(&sample_pdf(1, &["F1"]), &WatermarkOptions::with_text("TOP")).unwrap();
    let content = &page_contents(&output)[0];

    let original = content.find("Page 1").unwrap();
    let watermark = content.find("(TOP) Tj").unwrap();
    assert!(original < watermark);
    assert!(content.trim_start().starts_with('q'));
}

#[test]
fn test_blank_text_leaves_pages_unchanged() {
    let input = sample_pdf(2, &["F1"]);
    let output = watermark_pdf_bytes(&input, &WatermarkOptions::default()).unwrap();

    assert_eq!(page_contents(&output), page_contents(&input));
}

#[test]
fn test_blank_text_batch_entry_matches_source() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_sample(temp_dir.path(), "plain.pdf", 1);
    let source = std::fs::read(&path).unwrap();

    let archive = watermark_batch(&[InputFile::from_path(path)], &WatermarkOptions::default()).unwrap();
    let entries = archive_entries(&archive);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "plain.pdf");
    assert_eq!(page_contents(&entries[0].1), page_contents(&source));
}

#[test]
fn test_inherited_resources_are_kept() {
    let output = watermark_pdf_bytes(&sample_pdf(2, &["F1"]), &WatermarkOptions::with_text("COPY")).unwrap();

    let fonts = first_page_fonts(&output);
    assert!(fonts.has(b"F1"));
    assert!(fonts.has(b"WmFont"));
}

#[test]
fn test_existing_resource_name_is_not_overwritten() {
    let input = sample_pdf(1, &["F1", "WmFont"]);
    let output = watermark_pdf_bytes(&input, &WatermarkOptions::with_text("COPY")).unwrap();

    let fonts = first_page_fonts(&output);
    assert!(fonts.has(b"WmFont"));
    assert!(fonts.has(b"WmFont1"));
    assert!(page_contents(&output)[0].contains("/WmFont1 50 Tf"));
}

#[test]
fn test_font_choice_is_registered() {
    let options = WatermarkOptions {
        font: StandardFont::TimesBoldItalic,
        font_size: 20,
        ..WatermarkOptions::with_text("Sample")
    };
    let output = watermark_pdf_bytes(&sample_pdf(1, &["F1"]), &options).unwrap();

    let doc = Document::load_mem(&output).unwrap();
    let font_id = first_page_fonts(&output)
        .get(b"WmFont")
        .unwrap()
        .as_reference()
        .unwrap();
    let font = doc.get_dictionary(font_id).unwrap();
    assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Times-BoldItalic");
    assert!(page_contents(&output)[0].contains("/WmFont 20 Tf"));
}

#[test]
fn test_bad_file_aborts_batch_and_is_named() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let good = write_sample(temp_dir.path(), "good.pdf", 1);
    let broken = temp_dir.path().join("broken.pdf");
    std::fs::write(&broken, b"this is not a pdf").unwrap();

    let files = vec![InputFile::from_path(good), InputFile::from_path(broken)];
    let result = watermark_batch(&files, &WatermarkOptions::with_text("X"));

    match result {
        Err(Error::InFile { name, .. }) => assert_eq!(name, "broken.pdf"),
        other => panic!("expected InFile error, got {:?}", other.map(|a| a.len())),
    }
}

#[test]
fn test_invalid_options_rejected_before_any_file_is_read() {
    let files = vec![InputFile::from_path("does-not-exist.pdf")];
    let options = WatermarkOptions {
        font_size: 5,
        ..WatermarkOptions::with_text("X")
    };

    assert!(matches!(
        watermark_batch(&files, &options),
        Err(Error::InvalidFontSize(5))
    ));
}

#[test]
fn test_write_batch_archive_from_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let docs = temp_dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    write_sample(&docs, "a.pdf", 1);
    write_sample(&docs, "b.pdf", 2);
    std::fs::write(docs.join("notes.txt"), b"skip me").unwrap();

    let files = collect_inputs(&[docs.display().to_string()]).unwrap();
    let output = temp_dir.path().join("pdfwatermarked.zip");
    let count = write_batch_archive(&files, &WatermarkOptions::with_text("BATCH"), &output).unwrap();

    assert_eq!(count, 2);
    let entries = archive_entries(&std::fs::read(&output).unwrap());
    let names: Vec<_> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["docs/a.pdf", "docs/b.pdf"]);
}

#[test]
fn test_empty_batch_yields_empty_archive() {
    let archive = watermark_batch(&[], &WatermarkOptions::with_text("X")).unwrap();
    assert!(archive_entries(&archive).is_empty());
}

#[test]
fn test_preview_has_only_first_page() {
    let preview = render_preview(&sample_pdf(3, &["F1"]), &WatermarkOptions::with_text("PREVIEW")).unwrap();

    let contents = page_contents(&preview);
    assert_eq!(contents.len(), 1);
    assert!(contents[0].contains("Page 1"));
    assert!(contents[0].contains("(PREVIEW) Tj"));
}

#[test]
fn test_add_watermark_updates_metadata() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = write_sample(temp_dir.path(), "input.pdf", 2);
    let stamped = temp_dir.path().join("stamped.pdf");
    let untouched = temp_dir.path().join("untouched.pdf");

    add_watermark(&input, &stamped, &WatermarkOptions::with_text("META")).unwrap();
    let options = WatermarkOptions {
        update_metadata: false,
        ..WatermarkOptions::with_text("META")
    };
    add_watermark(&input, &untouched, &options).unwrap();

    let metadata = extract_metadata(&stamped).unwrap();
    assert_eq!(metadata.page_count, 2);
    assert_eq!(metadata.page_sizes[0].width, 612.0);
    assert!(metadata.producer.unwrap().starts_with("pdf-watermarker"));

    assert!(extract_metadata(&untouched).unwrap().producer.is_none());
}

#[test]
fn test_add_watermark_missing_input() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let result = add_watermark(
        &temp_dir.path().join("missing.pdf"),
        &temp_dir.path().join("out.pdf"),
        &WatermarkOptions::with_text("X"),
    );

    assert!(matches!(result, Err(Error::FileNotFound(_))));
}
