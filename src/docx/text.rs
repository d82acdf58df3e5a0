//! Text-layer utilities shared by the block builder and the applier
//!
//! Detection spans are measured over a normalised projection of the
//! element text, while edits land in raw XML. This module owns both sides
//! of that contract: the normalisation state machine (with a per-character
//! back-map into the source `w:t` nodes) and the `w:t` scanner that turns
//! an element slot into editable text nodes with their enclosing run
//! formatting context. The normalisation is a single implementation, so
//! block building and re-extraction inside the applier can never disagree.

use crate::docx::part::local_name;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

/// Yellow replacement highlight, the WordprocessingML equivalent of a
/// highlighter pen over the inserted surrogate
pub const HIGHLIGHT: &str = r#"<w:highlight w:val="yellow"/>"#;

/// Back-reference from a normalised character to its source node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRef {
    /// Index into the node list the projection was built from
    pub node: usize,
    /// Character offset within that node's text
    pub offset: usize,
}

/// Normalise element text: NBSP becomes a space, runs of whitespace
/// collapse to a single space, leading/trailing whitespace is stripped.
pub fn normalize(text: &str) -> String {
    normalize_nodes(&[text]).0
}

/// Normalise the concatenation of several node texts, returning the
/// projection together with one [`CharRef`] per projected character.
///
/// A collapsed whitespace run maps to its first source character.
pub fn normalize_nodes(texts: &[&str]) -> (String, Vec<CharRef>) {
    let mut out = String::new();
    let mut map = Vec::new();
    let mut pending_ws: Option<CharRef> = None;
    let mut started = false;

    for (node, text) in texts.iter().enumerate() {
        for (offset, mut ch) in text.chars().enumerate() {
            if ch == '\u{a0}' {
                ch = ' ';
            }
            if ch.is_whitespace() {
                if started && pending_ws.is_none() {
                    pending_ws = Some(CharRef { node, offset });
                }
            } else {
                if let Some(ws) = pending_ws.take() {
                    out.push(' ');
                    map.push(ws);
                }
                out.push(ch);
                map.push(CharRef { node, offset });
                started = true;
            }
        }
    }
    (out, map)
}

/// Formatting context of the run enclosing a text node
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Byte position right after the `<w:r ...>` open tag
    pub content_start: usize,
    /// Byte position right after `<w:rPr>`, when the run has properties
    pub rpr_content_start: Option<usize>,
    /// Byte range of a self-closing `<w:rPr/>`, which must be replaced
    /// rather than inserted into
    pub rpr_empty: Option<Range<usize>>,
    /// The run already carries a `w:highlight`
    pub has_highlight: bool,
}

/// One editable `<w:t>` node located inside an element slot
#[derive(Debug, Clone)]
pub struct TextNode {
    /// Unescaped text content
    pub text: String,
    /// Byte range of the raw content between the tags
    pub content: Range<usize>,
    /// Byte range of the opening (or self-closing) tag
    pub open_tag: Range<usize>,
    pub self_closing: bool,
    /// The open tag carries `xml:space="preserve"`
    pub preserve_space: bool,
    /// Enclosing run, if any
    pub run: Option<RunContext>,
}

fn has_preserve_attr(e: &BytesStart<'_>) -> bool {
    e.attributes().with_checks(false).flatten().any(|a| {
        local_name(a.key.as_ref()) == b"space" && a.value.as_ref() == b"preserve"
    })
}

/// Scan an element slot for its `w:t` nodes in document order
pub fn scan_text_nodes(xml: &str) -> Vec<TextNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut nodes = Vec::new();
    let mut run: Option<RunContext> = None;
    let mut in_rpr = false;
    let mut pending: Option<(Range<usize>, usize, bool)> = None;

    loop {
        let tag_start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"r" => {
                    run = Some(RunContext {
                        content_start: reader.buffer_position(),
                        rpr_content_start: None,
                        rpr_empty: None,
                        has_highlight: false,
                    });
                    in_rpr = false;
                }
                b"rPr" => {
                    if let Some(r) = run.as_mut() {
                        if r.rpr_content_start.is_none() && r.rpr_empty.is_none() {
                            r.rpr_content_start = Some(reader.buffer_position());
                            in_rpr = true;
                        }
                    }
                }
                b"highlight" => {
                    if in_rpr {
                        if let Some(r) = run.as_mut() {
                            r.has_highlight = true;
                        }
                    }
                }
                b"t" => {
                    pending = Some((
                        tag_start..reader.buffer_position(),
                        reader.buffer_position(),
                        has_preserve_attr(&e),
                    ));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"rPr" => {
                    if let Some(r) = run.as_mut() {
                        if r.rpr_content_start.is_none() && r.rpr_empty.is_none() {
                            r.rpr_empty = Some(tag_start..reader.buffer_position());
                        }
                    }
                }
                b"highlight" => {
                    if in_rpr {
                        if let Some(r) = run.as_mut() {
                            r.has_highlight = true;
                        }
                    }
                }
                b"t" => {
                    let pos = reader.buffer_position();
                    nodes.push(TextNode {
                        text: String::new(),
                        content: pos..pos,
                        open_tag: tag_start..pos,
                        self_closing: true,
                        preserve_space: has_preserve_attr(&e),
                        run: run.clone(),
                    });
                }
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"r" => {
                    run = None;
                    in_rpr = false;
                }
                b"rPr" => {
                    in_rpr = false;
                }
                b"t" => {
                    if let Some((open_tag, content_start, preserve)) = pending.take() {
                        let raw = &xml[content_start..tag_start];
                        let text = unescape(raw)
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|_| raw.to_string());
                        nodes.push(TextNode {
                            text,
                            content: content_start..tag_start,
                            open_tag,
                            self_closing: false,
                            preserve_space: preserve,
                            run: run.clone(),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    nodes
}

/// Byte ranges of the outermost `<w:{tag}>` elements within `xml`
pub fn element_ranges(xml: &str, tag: &[u8]) -> Vec<Range<usize>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut capture: Option<(usize, usize)> = None;

    loop {
        let tag_start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if capture.is_none() && local_name(e.name().as_ref()) == tag {
                    capture = Some((tag_start, depth));
                }
                depth += 1;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if let Some((start, at_depth)) = capture {
                    if depth == at_depth {
                        out.push(start..reader.buffer_position());
                        capture = None;
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if capture.is_none() && local_name(e.name().as_ref()) == tag {
                    out.push(tag_start..reader.buffer_position());
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    out
}

/// A byte-range splice into a slot's XML
#[derive(Debug, Clone)]
pub struct Edit {
    pub at: Range<usize>,
    pub insert: String,
}

/// Apply a set of pairwise-disjoint edits; later positions first so
/// earlier ranges stay valid
pub fn apply_edits(xml: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.at.start.cmp(&a.at.start));
    let mut out = xml.to_string();
    for edit in edits {
        out.replace_range(edit.at.clone(), &edit.insert);
    }
    out
}

/// Escape replacement text for XML content
pub fn escape_text(text: &str) -> String {
    escape(text).into_owned()
}

/// Edits rewriting one node's text content, adding `xml:space="preserve"`
/// when the new text has significant edge whitespace
pub fn content_edits(node: &TextNode, new_text: &str) -> Vec<Edit> {
    let mut edits = Vec::new();
    if node.self_closing {
        // empty nodes hold no characters and are never spliced into
        return edits;
    }
    edits.push(Edit {
        at: node.content.clone(),
        insert: escape_text(new_text),
    });
    if new_text != new_text.trim() && !node.preserve_space && !node.open_tag.is_empty() {
        let at = node.open_tag.end - 1;
        edits.push(Edit {
            at: at..at,
            insert: r#" xml:space="preserve""#.to_string(),
        });
    }
    edits
}

/// Edit injecting the replacement highlight into a node's run, if the run
/// does not already carry one
pub fn highlight_edit(node: &TextNode) -> Option<Edit> {
    let run = node.run.as_ref()?;
    if run.has_highlight {
        return None;
    }
    if let Some(empty) = run.rpr_empty.clone() {
        return Some(Edit {
            at: empty,
            insert: format!("<w:rPr>{HIGHLIGHT}</w:rPr>"),
        });
    }
    if let Some(pos) = run.rpr_content_start {
        return Some(Edit {
            at: pos..pos,
            insert: HIGHLIGHT.to_string(),
        });
    }
    Some(Edit {
        at: run.content_start..run.content_start,
        insert: format!("<w:rPr>{HIGHLIGHT}</w:rPr>"),
    })
}

/// Character index of the first occurrence of `needle` in `haystack`
pub fn char_index_of(haystack: &str, needle: &str) -> Option<usize> {
    let byte = haystack.find(needle)?;
    Some(haystack[..byte].chars().count())
}
