//! DOT format utilities for graph visualization.
//!
//! Graphs in this crate render themselves with `to_dot`; [`escape_dot`] makes arbitrary
//! instruction text safe inside quoted labels. [`DotGraph::parse`] reads back the subset of
//! DOT that `to_dot` produces, so dumps can be checked structurally.

use std::collections::HashMap;

use crate::Result;

/// Escapes a string for safe use in DOT format labels and identifiers.
///
/// # Arguments
///
/// * `s` - The string to escape
///
/// # Returns
///
/// A new string with quotes, backslashes, newlines and angle brackets escaped.
///
/// # Examples
///
/// ```rust
/// use flowscope::utils::escape_dot;
///
/// let escaped = escape_dot("List<T>");
/// assert_eq!(escaped, "List\\<T\\>");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

fn unescape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'l') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// The structure of a parsed DOT digraph: node ids, their labels and the edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotGraph {
    /// Graph name following `digraph`
    pub name: String,
    /// Node ids in declaration order
    pub nodes: Vec<String>,
    /// Unescaped `label` attribute per node id
    pub labels: HashMap<String, String>,
    /// `(source, target)` pairs in declaration order
    pub edges: Vec<(String, String)>,
}

impl DotGraph {
    /// Parses a digraph in the layout produced by this crate's `to_dot` methods.
    ///
    /// One statement per line is expected. Graph-wide `graph`/`node`/`edge` attribute
    /// statements are skipped. Nodes referenced only by edges are added implicitly.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the input is not a `digraph` or a statement
    /// cannot be read.
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines = source.lines().map(str::trim).filter(|line| !line.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| malformed_error!("empty DOT input"))?;
        let name = header
            .strip_prefix("digraph")
            .and_then(|rest| rest.trim().strip_suffix('{'))
            .ok_or_else(|| malformed_error!("expected 'digraph <name> {{', found '{}'", header))?
            .trim()
            .trim_matches('"')
            .to_string();

        let mut graph = DotGraph {
            name,
            ..DotGraph::default()
        };
        let mut closed = false;

        for line in lines {
            if line == "}" {
                closed = true;
                break;
            }

            let (ident, rest) = split_identifier(line);
            if ident.is_empty() {
                return Err(malformed_error!("unexpected DOT statement '{}'", line));
            }
            if matches!(ident, "graph" | "node" | "edge") || rest.starts_with('=') {
                continue;
            }

            if let Some(after_arrow) = rest.strip_prefix("->") {
                let (target, _) = split_identifier(after_arrow.trim_start());
                if target.is_empty() {
                    return Err(malformed_error!("edge without target in '{}'", line));
                }
                graph.declare(ident);
                graph.declare(target);
                graph.edges.push((ident.to_string(), target.to_string()));
            } else {
                graph.declare(ident);
                if let Some(label) = label_attribute(rest) {
                    graph.labels.insert(ident.to_string(), label);
                }
            }
        }

        if !closed {
            return Err(malformed_error!("unterminated digraph '{}'", graph.name));
        }
        Ok(graph)
    }

    fn declare(&mut self, node: &str) {
        if !self.nodes.iter().any(|existing| existing == node) {
            self.nodes.push(node.to_string());
        }
    }

    /// Number of edges leaving `node`.
    #[must_use]
    pub fn out_degree(&self, node: &str) -> usize {
        self.edges.iter().filter(|(source, _)| source == node).count()
    }
}

fn split_identifier(line: &str) -> (&str, &str) {
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    (&line[..end], line[end..].trim_start())
}

fn label_attribute(attributes: &str) -> Option<String> {
    let start = attributes.find("label=\"")? + "label=\"".len();
    let body = &attributes[start..];

    let mut escaped = false;
    for (offset, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(unescape_dot(&body[..offset])),
            _ => escaped = false,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_dot_combined() {
        assert_eq!(
            escape_dot("Method<T>(\"arg\")"),
            "Method\\<T\\>(\\\"arg\\\")"
        );
        assert_eq!(escape_dot("line1\r\nline2"), "line1\\nline2");
    }

    #[test]
    fn test_parse_roundtrips_escaped_labels() {
        let text = "digraph \"C.M()\" {\n  node [shape=box];\n  B0 [label=\"a -> \\\"b\\\"\\n\\<T\\>\"];\n  B1;\n  B0 -> B1 [label=\"T\"];\n  B0 -> B2;\n}\n";
        let graph = DotGraph::parse(text).unwrap();

        assert_eq!(graph.name, "C.M()");
        assert_eq!(graph.nodes, vec!["B0", "B1", "B2"]);
        assert_eq!(graph.labels.get("B0").map(String::as_str), Some("a -> \"b\"\n<T>"));
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.out_degree("B0"), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DotGraph::parse("").is_err());
        assert!(DotGraph::parse("graph g {\n}").is_err());
        assert!(DotGraph::parse("digraph g {\n B0;\n").is_err());
    }
}
