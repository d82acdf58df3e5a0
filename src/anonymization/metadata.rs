//! Core-properties scrubbing
//!
//! `docProps/core.xml` carries author identities outside the document
//! body. When enabled, the creator and last-modified-by values are
//! replaced with their surrogates so the package metadata cannot undo the
//! body-level anonymization.

use crate::anonymization::surrogate::SurrogateMapper;
use crate::docx::package::{DocxPackage, CORE_PROPERTIES};
use crate::docx::part::local_name;
use crate::docx::text::{apply_edits, escape_text, Edit};
use crate::domain::models::{Detection, DetectionSource, ReplacementPlan, Span};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;

const METADATA_CATEGORY: &str = "metadata";
const SCRUBBED_TAGS: [&[u8]; 2] = [b"creator", b"lastModifiedBy"];

/// Replace author metadata values with surrogates. Returns synthetic
/// plans describing the replacements for the ledger; a package without a
/// core-properties part is left untouched.
pub fn scrub_core_properties(
    package: &mut DocxPackage,
    surrogates: &SurrogateMapper,
) -> Vec<ReplacementPlan> {
    let Some(xml) = package
        .part(CORE_PROPERTIES)
        .and_then(|data| String::from_utf8(data.to_vec()).ok())
    else {
        return Vec::new();
    };

    let mut edits: Vec<Edit> = Vec::new();
    let mut applied = Vec::new();

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(false);
    let mut pending: Option<usize> = None;

    loop {
        let tag_start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if SCRUBBED_TAGS.contains(&local_name(e.name().as_ref())) {
                    pending = Some(reader.buffer_position());
                } else {
                    pending = None;
                }
            }
            Ok(Event::End(e)) => {
                if let Some(content_start) = pending.take() {
                    if SCRUBBED_TAGS.contains(&local_name(e.name().as_ref())) {
                        let raw = &xml[content_start..tag_start];
                        let value = unescape(raw)
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|_| raw.to_string());
                        if !value.trim().is_empty() {
                            let uuid = surrogates.uuid_for(&value, METADATA_CATEGORY);
                            edits.push(Edit {
                                at: content_start..tag_start,
                                insert: escape_text(&uuid),
                            });
                            applied.push(metadata_plan(value, uuid));
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Vec::new(),
            _ => {}
        }
    }

    if !applied.is_empty() {
        tracing::debug!(count = applied.len(), "Scrubbed core properties");
        package.set_part(CORE_PROPERTIES, apply_edits(&xml, edits).into_bytes());
    }
    applied
}

fn metadata_plan(original: String, uuid: String) -> ReplacementPlan {
    let width = original.chars().count();
    ReplacementPlan {
        detection: Detection {
            block_id: "core_properties".to_string(),
            category: METADATA_CATEGORY.to_string(),
            original_value: original,
            span: Span::new(0, width),
            confidence: 1.0,
            source: DetectionSource::Rule,
            method: "metadata".to_string(),
        },
        uuid,
        element: crate::domain::models::ElementId::Paragraph { part: 0, segment: 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn package_with_core(core: &str) -> DocxPackage {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", opts).unwrap();
            zip.write_all(b"<w:document/>").unwrap();
            zip.start_file("docProps/core.xml", opts).unwrap();
            zip.write_all(core.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        DocxPackage::from_bytes(&buf.into_inner()).unwrap()
    }

    const CORE: &str = concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
        "<dc:title>Контракт</dc:title>",
        "<dc:creator>Иванов Иван</dc:creator>",
        "<cp:lastModifiedBy>Петров Пётр</cp:lastModifiedBy>",
        "</cp:coreProperties>",
    );

    #[test]
    fn test_creator_and_modifier_scrubbed() {
        let mut package = package_with_core(CORE);
        let mapper = SurrogateMapper::new();
        let applied = scrub_core_properties(&mut package, &mapper);
        assert_eq!(applied.len(), 2);

        let out = package.part_xml(CORE_PROPERTIES).unwrap();
        assert!(!out.contains("Иванов Иван"));
        assert!(!out.contains("Петров Пётр"));
        // the title is not author identity and stays
        assert!(out.contains("Контракт"));
        let expected = mapper.uuid_for("Иванов Иван", "metadata");
        assert!(out.contains(&expected));
    }

    #[test]
    fn test_missing_core_part_is_noop() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", opts).unwrap();
            zip.write_all(b"<w:document/>").unwrap();
            zip.finish().unwrap();
        }
        let mut package = DocxPackage::from_bytes(&buf.into_inner()).unwrap();
        let applied = scrub_core_properties(&mut package, &SurrogateMapper::new());
        assert!(applied.is_empty());
    }
}
