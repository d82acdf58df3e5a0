//! Paragraph replacement
//!
//! The shared splice routine behind every element kind. A surrogate either
//! lands inside a single `w:t` node (first-occurrence rewrite) or is
//! spliced across the nodes intersecting the detection span: the first
//! intersecting node receives the surrogate with its run's formatting, the
//! rest lose the covered portion of their text. Text outside the span is
//! never altered.

use crate::docx::text::{
    apply_edits, char_index_of, content_edits, highlight_edit, normalize_nodes, scan_text_nodes,
    Edit, TextNode,
};
use crate::domain::models::Span;
use std::collections::BTreeMap;

/// Replace the first occurrence of `original` within an element slot.
///
/// `span_hint` is the detection span over the element's normalised text;
/// it is trusted only if the recomputed projection still matches (earlier
/// replacements in the same block may have shifted text to the right of
/// it, never to the left). Returns the rewritten slot XML, or `None` when
/// the literal can no longer be found.
pub(crate) fn replace_in_element(
    xml: &str,
    original: &str,
    replacement: &str,
    span_hint: Option<Span>,
    highlight: bool,
) -> Option<String> {
    if original.is_empty() {
        return None;
    }
    let nodes = scan_text_nodes(xml);
    if nodes.is_empty() {
        return None;
    }

    // single-node case: the literal sits inside one run's text
    if let Some(node) = nodes.iter().find(|n| n.text.contains(original)) {
        let new_text = node.text.replacen(original, replacement, 1);
        let mut edits = content_edits(node, &new_text);
        if highlight {
            edits.extend(highlight_edit(node));
        }
        return Some(apply_edits(xml, edits));
    }

    // multi-node case: splice across the nodes covered by the span
    let texts: Vec<&str> = nodes.iter().map(|n| n.text.as_str()).collect();
    let (projection, map) = normalize_nodes(&texts);

    let span = match span_hint.filter(|s| span_matches(&projection, *s, original)) {
        Some(s) => s,
        None => {
            let start = char_index_of(&projection, original)?;
            Span::new(start, start + original.chars().count())
        }
    };
    if span.end > map.len() || span.is_empty() {
        return None;
    }

    // per-node extent of the span, in character offsets
    let mut per_node: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for reference in &map[span.start..span.end] {
        per_node
            .entry(reference.node)
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(reference.offset);
                *hi = (*hi).max(reference.offset + 1);
            })
            .or_insert((reference.offset, reference.offset + 1));
    }

    let first_node = *per_node.keys().next()?;
    let mut edits: Vec<Edit> = Vec::new();
    for (&node_idx, &(lo, hi)) in &per_node {
        let node = &nodes[node_idx];
        let new_text = splice(node, lo, hi, (node_idx == first_node).then_some(replacement));
        edits.extend(content_edits(node, &new_text));
    }
    if highlight {
        edits.extend(highlight_edit(&nodes[first_node]));
    }
    Some(apply_edits(xml, edits))
}

/// Replace every occurrence of `original` within an element slot,
/// returning the rewritten XML and the number of replacements
pub(crate) fn replace_all_in_element(
    xml: &str,
    original: &str,
    replacement: &str,
    highlight: bool,
) -> (String, usize) {
    // a replacement containing its own literal would oscillate
    let single_pass = replacement.contains(original);
    let mut current = xml.to_string();
    let mut count = 0usize;
    while let Some(next) = replace_in_element(&current, original, replacement, None, highlight) {
        current = next;
        count += 1;
        if single_pass || count >= 1000 {
            break;
        }
    }
    (current, count)
}

fn splice(node: &TextNode, lo: usize, hi: usize, insert: Option<&str>) -> String {
    let chars: Vec<char> = node.text.chars().collect();
    let hi = hi.min(chars.len());
    let mut out: String = chars[..lo.min(chars.len())].iter().collect();
    if let Some(replacement) = insert {
        out.push_str(replacement);
    }
    out.extend(chars[hi..].iter());
    out
}

fn span_matches(projection: &str, span: Span, needle: &str) -> bool {
    projection
        .chars()
        .skip(span.start)
        .take(span.len())
        .eq(needle.chars())
        && span.len() == needle.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::text::scan_text_nodes;

    fn texts(xml: &str) -> Vec<String> {
        scan_text_nodes(xml).into_iter().map(|n| n.text).collect()
    }

    #[test]
    fn test_single_run_replacement_preserves_neighbours() {
        let xml = concat!(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Иванов И. И. подписал</w:t></w:r>"#,
            r#"<w:r><w:t>документ</w:t></w:r></w:p>"#,
        );
        let out =
            replace_in_element(xml, "Иванов И. И.", "UUID-1", Some(Span::new(0, 12)), true).unwrap();
        let t = texts(&out);
        assert_eq!(t[0], "UUID-1 подписал");
        assert_eq!(t[1], "документ");
        assert!(out.contains(r#"<w:highlight w:val="yellow"/>"#));
        // existing bold formatting untouched
        assert!(out.contains("<w:b/>"));
    }

    #[test]
    fn test_multi_run_splice_collapses_span_into_first_run() {
        let xml = concat!(
            r#"<w:p><w:r><w:t>Мини</w:t></w:r>"#,
            r#"<w:r><w:t xml:space="preserve">стерство </w:t></w:r>"#,
            r#"<w:r><w:t>связи</w:t></w:r></w:p>"#,
        );
        let out =
            replace_in_element(xml, "Министерство связи", "UUID-2", Some(Span::new(0, 18)), true)
                .unwrap();
        let t = texts(&out);
        assert_eq!(t[0], "UUID-2");
        assert_eq!(t[1], "");
        assert_eq!(t[2], "");
    }

    #[test]
    fn test_splice_keeps_text_outside_span() {
        let xml = concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">до Мини</w:t></w:r>"#,
            r#"<w:r><w:t xml:space="preserve">стерство связи после</w:t></w:r></w:p>"#,
        );
        // projection: "до Министерство связи после"
        let out =
            replace_in_element(xml, "Министерство связи", "UUID-3", Some(Span::new(3, 21)), false)
                .unwrap();
        let t = texts(&out);
        assert_eq!(t[0], "до UUID-3");
        assert_eq!(t[1], " после");
    }

    #[test]
    fn test_stale_span_falls_back_to_search() {
        let xml = r#"<w:p><w:r><w:t>prefix Иванов suffix</w:t></w:r></w:p>"#;
        // a hint pointing at the wrong place still resolves by search
        let out =
            replace_in_element(xml, "Иванов", "UUID-4", Some(Span::new(0, 6)), false).unwrap();
        assert_eq!(texts(&out)[0], "prefix UUID-4 suffix");
    }

    #[test]
    fn test_missing_literal_reports_not_found() {
        let xml = r#"<w:p><w:r><w:t>ничего похожего</w:t></w:r></w:p>"#;
        assert!(replace_in_element(xml, "Иванов", "UUID-5", None, false).is_none());
    }

    #[test]
    fn test_replacement_with_xml_metacharacters_is_escaped() {
        let xml = r#"<w:p><w:r><w:t>a&amp;b c</w:t></w:r></w:p>"#;
        let out = replace_in_element(xml, "a&b", "x<y>&z", None, false).unwrap();
        assert_eq!(texts(&out)[0], "x<y>&z c");
        assert!(out.contains("&amp;"));
    }

    #[test]
    fn test_replace_all_counts_occurrences() {
        let xml = concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">стр. 1 стр. 2 "#,
            r#"стр. 3</w:t></w:r></w:p>"#,
        );
        let (out, count) = replace_all_in_element(xml, "стр.", "PAGE", false);
        assert_eq!(count, 3);
        assert_eq!(texts(&out)[0], "PAGE 1 PAGE 2 PAGE 3");
    }

    #[test]
    fn test_nbsp_in_source_still_matches_normalised_span() {
        // NBSP between surname and initials collapses to a space in the
        // projection; the splice lands back in the raw NBSP text
        let xml = concat!(
            r#"<w:p><w:r><w:t>Иванов&#160;И.</w:t></w:r>"#,
            r#"<w:r><w:t xml:space="preserve"> И. подписал</w:t></w:r></w:p>"#,
        );
        let out =
            replace_in_element(xml, "Иванов И. И.", "UUID-6", Some(Span::new(0, 12)), false)
                .unwrap();
        let t = texts(&out);
        assert_eq!(t[0], "UUID-6");
        assert_eq!(t[1], " подписал");
    }
}
