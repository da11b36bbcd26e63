//! Document tree flattening.
//!
//! The corpus API returns titles as deeply nested XML where the same field
//! name may hold a scalar in one place and a repeated element elsewhere.
//! This module models that shape as a tagged [`DocNode`] variant and
//! flattens it into one ordered plain-text string: a depth-first,
//! left-to-right concatenation of every leaf, with a single space between
//! consecutive non-empty leaves.
//!
//! Traversal depth is bounded so a pathological or cyclic tree aborts with
//! an error instead of hanging.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Maximum traversal/parse depth before flattening aborts.
pub const MAX_DEPTH: usize = 256;

/// A node of a heterogeneous document tree.
///
/// Mappings preserve field declaration order; flattening imposes no ordering
/// of its own beyond the source tree's child order.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    /// Plain text leaf.
    Leaf(String),
    /// Ordered sequence of child nodes.
    Sequence(Vec<DocNode>),
    /// Mapping from field name to child node, in declaration order.
    /// Repeated field names simply appear as repeated entries.
    Mapping(Vec<(String, DocNode)>),
}

/// Flattening error (no panic; the pipeline skips the offending document).
#[derive(Debug)]
pub enum FlattenError {
    DepthExceeded(usize),
    Xml(String),
}

impl std::fmt::Display for FlattenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlattenError::DepthExceeded(d) => {
                write!(f, "document tree exceeds maximum depth {}", d)
            }
            FlattenError::Xml(e) => write!(f, "XML parse failed: {}", e),
        }
    }
}

impl std::error::Error for FlattenError {}

/// Flattens a document tree into one plain-text string.
///
/// Empty leaves contribute nothing; no leaf is dropped regardless of
/// nesting depth or branching factor, up to [`MAX_DEPTH`].
pub fn flatten(node: &DocNode) -> Result<String, FlattenError> {
    let mut out = String::new();
    visit(node, 0, &mut out)?;
    Ok(out)
}

fn visit(node: &DocNode, depth: usize, out: &mut String) -> Result<(), FlattenError> {
    if depth > MAX_DEPTH {
        return Err(FlattenError::DepthExceeded(MAX_DEPTH));
    }
    match node {
        DocNode::Leaf(text) => {
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        DocNode::Sequence(children) => {
            for child in children {
                visit(child, depth + 1, out)?;
            }
        }
        DocNode::Mapping(entries) => {
            for (_, child) in entries {
                visit(child, depth + 1, out)?;
            }
        }
    }
    Ok(())
}

/// Parses an XML document into a [`DocNode`] tree.
///
/// Each element becomes a [`DocNode::Mapping`]; attribute values become
/// leaf entries ahead of child content (the original traversal included
/// them), text becomes `#text` leaf entries. The document root is a
/// [`DocNode::Sequence`] of top-level nodes.
pub fn parse_xml(xml: &str) -> Result<DocNode, FlattenError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    // Stack of (element name, accumulated entries); index 0 is the root.
    let mut stack: Vec<(String, Vec<(String, DocNode)>)> = vec![(String::new(), Vec::new())];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() > MAX_DEPTH {
                    return Err(FlattenError::DepthExceeded(MAX_DEPTH));
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut entries = Vec::new();
                push_attributes(&e, &mut entries)?;
                stack.push((name, entries));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut entries = Vec::new();
                push_attributes(&e, &mut entries)?;
                let top = stack
                    .last_mut()
                    .ok_or_else(|| FlattenError::Xml("unbalanced element".to_string()))?;
                top.1.push((name, DocNode::Mapping(entries)));
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| FlattenError::Xml(e.to_string()))?
                    .into_owned();
                if !text.is_empty() {
                    let top = stack
                        .last_mut()
                        .ok_or_else(|| FlattenError::Xml("text outside document".to_string()))?;
                    top.1.push(("#text".to_string(), DocNode::Leaf(text)));
                }
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                if !text.is_empty() {
                    let top = stack
                        .last_mut()
                        .ok_or_else(|| FlattenError::Xml("text outside document".to_string()))?;
                    top.1.push(("#text".to_string(), DocNode::Leaf(text)));
                }
            }
            Ok(Event::End(_)) => {
                let (name, entries) = stack
                    .pop()
                    .ok_or_else(|| FlattenError::Xml("unbalanced end tag".to_string()))?;
                let top = stack
                    .last_mut()
                    .ok_or_else(|| FlattenError::Xml("unbalanced end tag".to_string()))?;
                top.1.push((name, DocNode::Mapping(entries)));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FlattenError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(FlattenError::Xml("unterminated element".to_string()));
    }
    let (_, roots) = stack.pop().unwrap_or_default();
    Ok(DocNode::Sequence(roots.into_iter().map(|(_, n)| n).collect()))
}

fn push_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    entries: &mut Vec<(String, DocNode)>,
) -> Result<(), FlattenError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FlattenError::Xml(e.to_string()))?;
        let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        let value = attr
            .unescape_value()
            .map_err(|e| FlattenError::Xml(e.to_string()))?
            .into_owned();
        entries.push((key, DocNode::Leaf(value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> DocNode {
        DocNode::Leaf(s.to_string())
    }

    #[test]
    fn flatten_single_leaf() {
        assert_eq!(flatten(&leaf("hello")).unwrap(), "hello");
    }

    #[test]
    fn flatten_preserves_depth_first_order() {
        let tree = DocNode::Mapping(vec![
            ("a".to_string(), leaf("one")),
            (
                "b".to_string(),
                DocNode::Sequence(vec![leaf("two"), leaf("three")]),
            ),
            ("c".to_string(), leaf("four")),
        ]);
        assert_eq!(flatten(&tree).unwrap(), "one two three four");
    }

    #[test]
    fn flatten_skips_empty_leaves() {
        let tree = DocNode::Sequence(vec![leaf(""), leaf("a"), leaf(""), leaf("b")]);
        assert_eq!(flatten(&tree).unwrap(), "a b");
    }

    #[test]
    fn flatten_empty_tree_is_empty_string() {
        assert_eq!(flatten(&DocNode::Sequence(vec![])).unwrap(), "");
        assert_eq!(flatten(&DocNode::Mapping(vec![])).unwrap(), "");
    }

    #[test]
    fn flatten_of_sequence_equals_joined_subtree_flattenings() {
        let subtrees = vec![
            DocNode::Mapping(vec![("x".to_string(), leaf("alpha beta"))]),
            leaf("gamma"),
            DocNode::Sequence(vec![leaf("delta"), leaf("epsilon")]),
        ];
        let joined = subtrees
            .iter()
            .map(|t| flatten(t).unwrap())
            .collect::<Vec<_>>()
            .join(" ");
        let whole = flatten(&DocNode::Sequence(subtrees)).unwrap();
        assert_eq!(whole, joined);
    }

    #[test]
    fn flatten_aborts_on_excessive_depth() {
        let mut tree = leaf("deep");
        for _ in 0..MAX_DEPTH + 10 {
            tree = DocNode::Sequence(vec![tree]);
        }
        let err = flatten(&tree).unwrap_err();
        assert!(matches!(err, FlattenError::DepthExceeded(_)));
    }

    #[test]
    fn parse_xml_mixed_scalar_and_repeated_fields() {
        let xml = r#"<TITLE><PART>one</PART><PART><SECTION>two</SECTION><SECTION>three</SECTION></PART></TITLE>"#;
        let tree = parse_xml(xml).unwrap();
        assert_eq!(flatten(&tree).unwrap(), "one two three");
    }

    #[test]
    fn parse_xml_includes_attribute_values() {
        let xml = r#"<DIV N="Part 5">body text</DIV>"#;
        let tree = parse_xml(xml).unwrap();
        assert_eq!(flatten(&tree).unwrap(), "Part 5 body text");
    }

    #[test]
    fn parse_xml_empty_elements_contribute_nothing() {
        let xml = r#"<A><B/><C>text</C><D/></A>"#;
        let tree = parse_xml(xml).unwrap();
        assert_eq!(flatten(&tree).unwrap(), "text");
    }

    #[test]
    fn parse_xml_malformed_is_error() {
        assert!(parse_xml("<A><B></A>").is_err());
    }

    #[test]
    fn parse_xml_unterminated_is_error() {
        assert!(parse_xml("<A><B>text").is_err());
    }
}
