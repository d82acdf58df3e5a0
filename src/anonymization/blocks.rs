//! Block extraction
//!
//! Flattens a parsed document into addressable text blocks in reading
//! order: body paragraphs, body tables, then each section's header and
//! footer content (paragraphs and SDT subtrees). Every block keeps an
//! arena handle back to the element that produced it; positions inside a
//! block are code points over its normalised text.

use crate::docx::part::{DocumentModel, PartKind, SlotKind};
use crate::docx::text::{element_ranges, normalize_nodes, scan_text_nodes};
use crate::domain::models::{Block, BlockKind, ElementId};
use std::ops::Range;

/// One non-empty cell of a table projection
#[derive(Debug, Clone)]
pub struct CellRef {
    /// Character range of the cell text within the projection
    pub start: usize,
    pub end: usize,
    /// Byte range of the `w:tc` element within the table slot XML
    pub range: Range<usize>,
}

/// The `" | "`-joined plain-text projection of a table together with the
/// source range of every projected cell. The applier rebuilds this exact
/// projection to route spans back to cells.
#[derive(Debug, Clone)]
pub struct TableProjection {
    pub text: String,
    pub cells: Vec<CellRef>,
}

impl TableProjection {
    /// Cell whose projected range contains `pos`
    pub fn cell_at(&self, pos: usize) -> Option<&CellRef> {
        self.cells.iter().find(|c| c.start <= pos && pos < c.end)
    }
}

/// Normalised text of one paragraph slot
pub(crate) fn paragraph_text(xml: &str) -> String {
    let nodes = scan_text_nodes(xml);
    let texts: Vec<&str> = nodes.iter().map(|n| n.text.as_str()).collect();
    normalize_nodes(&texts).0
}

/// Normalised concatenation of every descendant text node of an SDT
pub(crate) fn sdt_text(xml: &str) -> String {
    paragraph_text(xml)
}

/// Text of one table cell: each paragraph normalised, non-empty paragraphs
/// joined with single spaces
fn cell_text(cell_xml: &str) -> String {
    let mut parts = Vec::new();
    for pr in element_ranges(cell_xml, b"p") {
        let text = paragraph_text(&cell_xml[pr]);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

/// Build the table projection: cells joined with `" | "`, every non-empty
/// row terminated with `"\n"`. Empty cells and empty rows are dropped.
pub(crate) fn project_table(xml: &str) -> TableProjection {
    let mut text = String::new();
    let mut chars = 0usize;
    let mut cells = Vec::new();

    for row in element_ranges(xml, b"tr") {
        let row_xml = &xml[row.clone()];
        let mut row_cells: Vec<(String, Range<usize>)> = Vec::new();
        for cr in element_ranges(row_xml, b"tc") {
            let abs = row.start + cr.start..row.start + cr.end;
            let t = cell_text(&xml[abs.clone()]);
            if !t.is_empty() {
                row_cells.push((t, abs));
            }
        }
        if row_cells.is_empty() {
            continue;
        }
        for (i, (t, abs)) in row_cells.into_iter().enumerate() {
            if i > 0 {
                text.push_str(" | ");
                chars += 3;
            }
            let start = chars;
            let width = t.chars().count();
            text.push_str(&t);
            chars += width;
            cells.push(CellRef {
                start,
                end: start + width,
                range: abs,
            });
        }
        text.push('\n');
        chars += 1;
    }

    TableProjection { text, cells }
}

/// Traverses the document once and emits its blocks
pub struct BlockBuilder;

impl BlockBuilder {
    /// Emit blocks in reading order. Empty elements produce no block but
    /// still advance the per-kind ordinal, so ids stay stable across
    /// documents with empty paragraphs.
    pub fn build(model: &DocumentModel) -> Vec<Block> {
        let mut blocks = Vec::new();

        if let Some(body) = model.part(0) {
            let mut para_idx = 0usize;
            for (segment, kind, xml) in body.slots() {
                if kind == SlotKind::Paragraph {
                    let text = paragraph_text(xml);
                    if !text.is_empty() {
                        blocks.push(Block {
                            block_id: format!("paragraph_{para_idx}"),
                            text,
                            kind: BlockKind::Paragraph,
                            element: ElementId::Paragraph { part: 0, segment },
                        });
                    }
                    para_idx += 1;
                }
            }
            let mut table_idx = 0usize;
            for (segment, kind, xml) in body.slots() {
                if kind == SlotKind::Table {
                    let projection = project_table(xml);
                    if !projection.text.is_empty() {
                        blocks.push(Block {
                            block_id: format!("table_{table_idx}"),
                            text: projection.text,
                            kind: BlockKind::Table,
                            element: ElementId::Table { part: 0, segment },
                        });
                    }
                    table_idx += 1;
                }
            }
        }

        for (part_idx, part) in model.parts().iter().enumerate().skip(1) {
            let (prefix, section, para_kind, sdt_kind) = match part.kind {
                PartKind::Header(s) => ("header", s, BlockKind::Header, BlockKind::HeaderSdt),
                PartKind::Footer(s) => ("footer", s, BlockKind::Footer, BlockKind::FooterSdt),
                PartKind::Body => continue,
            };

            let mut para_idx = 0usize;
            let mut sdt_idx = 0usize;
            for (segment, kind, xml) in part.slots() {
                match kind {
                    SlotKind::Paragraph => {
                        let text = paragraph_text(xml);
                        if !text.is_empty() {
                            blocks.push(Block {
                                block_id: format!("{prefix}_{section}_{para_idx}"),
                                text,
                                kind: para_kind,
                                element: ElementId::Paragraph {
                                    part: part_idx,
                                    segment,
                                },
                            });
                        }
                        para_idx += 1;
                    }
                    SlotKind::Sdt => {
                        let text = sdt_text(xml);
                        if !text.is_empty() {
                            blocks.push(Block {
                                block_id: format!("{prefix}_sdt_{section}_{sdt_idx}"),
                                text,
                                kind: sdt_kind,
                                element: ElementId::Sdt {
                                    part: part_idx,
                                    segment,
                                },
                            });
                        }
                        sdt_idx += 1;
                    }
                    SlotKind::Table => {}
                }
            }
        }

        blocks
    }
}
