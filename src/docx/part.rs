//! WordprocessingML part segmentation
//!
//! Each part is split into alternating raw XML spans and independently
//! owned element slots (paragraphs, tables, SDT subtrees). Mutating one
//! slot never moves another, so replacement plans can address elements by
//! a stable `(part, segment)` index and the applier can edit them in any
//! order. Serialisation is the concatenation of the segments, which keeps
//! every untouched byte of the part identical to the input.

use crate::docx::package::{DocxPackage, MAIN_DOCUMENT};
use crate::domain::errors::{DocumentError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Strip a namespace prefix from a qualified tag name
pub(crate) fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().position(|&b| b == b':') {
        Some(i) => &qname[i + 1..],
        None => qname,
    }
}

/// Kind of element a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Paragraph,
    Table,
    Sdt,
}

/// One piece of a part: either untouchable raw XML or an addressable element
#[derive(Debug, Clone)]
pub enum Segment {
    Raw(String),
    Slot { kind: SlotKind, xml: String },
}

/// Which document part a `DocPart` was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Body,
    /// Header of the n-th section
    Header(usize),
    /// Footer of the n-th section
    Footer(usize),
}

/// A parsed part: the element arena for one XML file of the package
#[derive(Debug, Clone)]
pub struct DocPart {
    pub name: String,
    pub kind: PartKind,
    segments: Vec<Segment>,
    touched: bool,
}

impl DocPart {
    /// Parse a part into raw spans and element slots.
    ///
    /// Body parts address `w:p` and `w:tbl` children of `w:body`;
    /// header/footer parts additionally address top-level `w:sdt`
    /// subtrees (their paragraphs belong to the SDT slot).
    pub fn parse(name: &str, kind: PartKind, xml: &str) -> Result<Self> {
        let container_depth = match kind {
            PartKind::Body => 2,
            _ => 1,
        };
        let capture_sdt = !matches!(kind, PartKind::Body);
        let segments = segment_xml(name, xml, container_depth, capture_sdt)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            segments,
            touched: false,
        })
    }

    /// XML of an element slot; `None` for raw segments or out-of-range indices
    pub fn slot_xml(&self, index: usize) -> Option<&str> {
        match self.segments.get(index) {
            Some(Segment::Slot { xml, .. }) => Some(xml.as_str()),
            _ => None,
        }
    }

    /// Overwrite an element slot and mark the part dirty
    pub fn set_slot_xml(&mut self, index: usize, xml: String) {
        if let Some(Segment::Slot { xml: slot, .. }) = self.segments.get_mut(index) {
            *slot = xml;
            self.touched = true;
        }
    }

    /// Iterate element slots as `(segment_index, kind, xml)`
    pub fn slots(&self) -> impl Iterator<Item = (usize, SlotKind, &str)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| match seg {
                Segment::Slot { kind, xml } => Some((i, *kind, xml.as_str())),
                Segment::Raw(_) => None,
            })
    }

    /// True once any slot has been rewritten
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Reassemble the part's XML
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Raw(s) => out.push_str(s),
                Segment::Slot { xml, .. } => out.push_str(xml),
            }
        }
        out
    }
}

/// The parsed document: package plus the element arena of every
/// addressable part. Part 0 is always the body; headers and footers
/// follow in section order.
#[derive(Debug)]
pub struct DocumentModel {
    package: DocxPackage,
    parts: Vec<DocPart>,
}

impl DocumentModel {
    /// Parse the body and every header/footer part of a package
    pub fn parse(package: DocxPackage) -> Result<Self> {
        let mut parts = Vec::new();

        let body_xml = package.part_xml(MAIN_DOCUMENT)?;
        parts.push(DocPart::parse(MAIN_DOCUMENT, PartKind::Body, &body_xml)?);

        let headers = package.header_parts();
        let footers = package.footer_parts();
        for section in 0..headers.len().max(footers.len()) {
            if let Some(name) = headers.get(section) {
                let xml = package.part_xml(name)?;
                parts.push(DocPart::parse(name, PartKind::Header(section), &xml)?);
            }
            if let Some(name) = footers.get(section) {
                let xml = package.part_xml(name)?;
                parts.push(DocPart::parse(name, PartKind::Footer(section), &xml)?);
            }
        }

        Ok(Self { package, parts })
    }

    pub fn parts(&self) -> &[DocPart] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&DocPart> {
        self.parts.get(index)
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut DocPart> {
        self.parts.get_mut(index)
    }

    /// Write every touched part back and return the package for serialisation
    pub fn into_package(self) -> DocxPackage {
        let mut package = self.package;
        for part in &self.parts {
            if part.is_touched() {
                package.set_part(&part.name, part.serialize().into_bytes());
            }
        }
        package
    }
}

fn segment_xml(
    part: &str,
    xml: &str,
    container_depth: usize,
    capture_sdt: bool,
) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut flush = 0usize;
    let mut capture: Option<(usize, usize, SlotKind)> = None;

    loop {
        let tag_start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if capture.is_none() && depth == container_depth {
                    if let Some(kind) = slot_kind(local_name(e.name().as_ref()), capture_sdt) {
                        capture = Some((tag_start, depth, kind));
                    }
                }
                depth += 1;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if let Some((start, at_depth, kind)) = capture {
                    if depth == at_depth {
                        let end = reader.buffer_position();
                        if start > flush {
                            segments.push(Segment::Raw(xml[flush..start].to_string()));
                        }
                        segments.push(Segment::Slot {
                            kind,
                            xml: xml[start..end].to_string(),
                        });
                        flush = end;
                        capture = None;
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if capture.is_none() && depth == container_depth {
                    if let Some(kind) = slot_kind(local_name(e.name().as_ref()), capture_sdt) {
                        let end = reader.buffer_position();
                        if tag_start > flush {
                            segments.push(Segment::Raw(xml[flush..tag_start].to_string()));
                        }
                        segments.push(Segment::Slot {
                            kind,
                            xml: xml[tag_start..end].to_string(),
                        });
                        flush = end;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::MalformedXml {
                    part: part.to_string(),
                    detail: e.to_string(),
                }
                .into())
            }
            _ => {}
        }
    }

    if flush < xml.len() {
        segments.push(Segment::Raw(xml[flush..].to_string()));
    }
    Ok(segments)
}

fn slot_kind(name: &[u8], capture_sdt: bool) -> Option<SlotKind> {
    match name {
        b"p" => Some(SlotKind::Paragraph),
        b"tbl" => Some(SlotKind::Table),
        b"sdt" if capture_sdt => Some(SlotKind::Sdt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:body>"#,
        r#"<w:p><w:r><w:t>First</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t>Second</w:t></w:r></w:p>"#,
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
        r#"</w:body></w:document>"#,
    );

    #[test]
    fn test_body_segmentation() {
        let part = DocPart::parse("word/document.xml", PartKind::Body, BODY).unwrap();
        let slots: Vec<_> = part.slots().collect();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].1, SlotKind::Paragraph);
        assert_eq!(slots[1].1, SlotKind::Table);
        assert_eq!(slots[2].1, SlotKind::Paragraph);
        assert!(slots[0].2.contains("First"));
        assert!(slots[1].2.contains("Cell"));
    }

    #[test]
    fn test_serialize_is_identity_when_untouched() {
        let part = DocPart::parse("word/document.xml", PartKind::Body, BODY).unwrap();
        assert_eq!(part.serialize(), BODY);
        assert!(!part.is_touched());
    }

    #[test]
    fn test_nested_paragraphs_stay_inside_table_slot() {
        let part = DocPart::parse("word/document.xml", PartKind::Body, BODY).unwrap();
        let paragraphs = part
            .slots()
            .filter(|(_, k, _)| *k == SlotKind::Paragraph)
            .count();
        // the table-cell paragraph belongs to the table slot
        assert_eq!(paragraphs, 2);
    }

    #[test]
    fn test_header_sdt_captured() {
        let header = concat!(
            r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:sdt><w:sdtContent><w:p><w:r><w:t>Tag</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
            r#"<w:p><w:r><w:t>Plain</w:t></w:r></w:p>"#,
            r#"</w:hdr>"#,
        );
        let part = DocPart::parse("word/header1.xml", PartKind::Header(0), header).unwrap();
        let slots: Vec<_> = part.slots().collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].1, SlotKind::Sdt);
        assert_eq!(slots[1].1, SlotKind::Paragraph);
    }

    #[test]
    fn test_set_slot_marks_touched() {
        let mut part = DocPart::parse("word/document.xml", PartKind::Body, BODY).unwrap();
        let (idx, _, xml) = part.slots().next().map(|(i, k, x)| (i, k, x.to_string())).unwrap();
        part.set_slot_xml(idx, xml.replace("First", "Changed"));
        assert!(part.is_touched());
        assert!(part.serialize().contains("Changed"));
    }

    #[test]
    fn test_self_closing_paragraph() {
        let xml = concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body><w:p/><w:p><w:r><w:t>x</w:t></w:r></w:p></w:body></w:document>"#,
        );
        let part = DocPart::parse("word/document.xml", PartKind::Body, xml).unwrap();
        assert_eq!(part.slots().count(), 2);
        assert_eq!(part.serialize(), xml);
    }
}
