//! Shared fixtures: minimal in-memory DOCX archives and output readers

#![allow(dead_code)]

use docveil::docx::package::DocxPackage;
use docveil::docx::text::scan_text_nodes;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const NS: &str =
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

/// Wrap body XML into a full `word/document.xml`
pub fn wrap_document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NS}><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

/// Write a DOCX file with the standard skeleton plus the given parts
pub fn write_docx(path: &Path, parts: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    zip.start_file("_rels/.rels", opts).unwrap();
    zip.write_all(ROOT_RELS.as_bytes()).unwrap();
    for (name, content) in parts {
        zip.start_file(*name, opts).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A DOCX with only a body
pub fn write_simple_docx(path: &Path, body: &str) {
    write_docx(path, &[("word/document.xml", &wrap_document(body))]);
}

/// Read one part of a written archive
pub fn read_part(path: &Path, name: &str) -> String {
    DocxPackage::open(path).unwrap().part_xml(name).unwrap()
}

/// `w:t` contents of a part, in document order
pub fn part_texts(path: &Path, name: &str) -> Vec<String> {
    scan_text_nodes(&read_part(path, name))
        .into_iter()
        .map(|n| n.text)
        .collect()
}

/// Entry names of a written archive
pub fn part_names(path: &Path) -> Vec<String> {
    DocxPackage::open(path)
        .unwrap()
        .part_names()
        .map(str::to_string)
        .collect()
}

/// Temp directory for one test
pub fn temp_dir(tag: &str) -> PathBuf {
    tempfile::Builder::new()
        .prefix(&format!("docveil-{tag}-"))
        .tempdir()
        .unwrap()
        .into_path()
}
