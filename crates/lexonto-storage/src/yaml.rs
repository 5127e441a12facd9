//! YAML form.
//!
//! Reading accepts any YAML scalar as a field value and stringifies it, so
//! `freq: 5` and `freq: '5'` load the same. Writing keeps the layout compact
//! and diff-friendly: keys sorted, the legend and every entry on one line.
//!
//! ```text
//! legend: [lemma, POS, level, freq, origin]
//! ont:
//!   noun:
//!     common:
//!     - [ཁྱི, N, '1', '5', 'A1:5']
//! ```

use anyhow::{anyhow, bail, Context, Result};
use lexonto_core::{NestedOntology, OntNode};
use serde_yaml::Value;
use std::collections::BTreeMap;

// ============================================================================
// Reading
// ============================================================================

pub fn parse_nested(text: &str) -> Result<NestedOntology> {
    if text.trim().is_empty() {
        return Ok(NestedOntology::default());
    }
    let doc: Value = serde_yaml::from_str(text).context("invalid YAML")?;
    let map = match doc {
        Value::Null => return Ok(NestedOntology::default()),
        Value::Mapping(map) => map,
        _ => bail!("ontology YAML must be a mapping with `legend` and `ont` keys"),
    };

    let legend = match map.get("legend") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(fields)) => fields
            .iter()
            .map(scalar_text)
            .collect::<Result<Vec<_>>>()
            .context("legend")?,
        Some(_) => bail!("`legend` must be a list of field names"),
    };

    let ont = match map.get("ont") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Mapping(m)) => convert_map(m, &mut Vec::new())?,
        Some(_) => bail!("`ont` must be a mapping of categories"),
    };

    Ok(NestedOntology { legend, ont })
}

fn convert_map(map: &serde_yaml::Mapping, path: &mut Vec<String>) -> Result<BTreeMap<String, OntNode>> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        let key = scalar_text(key).with_context(|| format!("category key under {path:?}"))?;
        path.push(key.clone());
        let node = convert_node(value, path)?;
        path.pop();
        out.insert(key, node);
    }
    Ok(out)
}

fn convert_node(value: &Value, path: &mut Vec<String>) -> Result<OntNode> {
    match value {
        Value::Mapping(m) => Ok(OntNode::Branch(convert_map(m, path)?)),
        Value::Null => Ok(OntNode::Leaf(Vec::new())),
        Value::Sequence(items) => {
            let mut entries = Vec::with_capacity(items.len());
            for item in items {
                let Value::Sequence(fields) = item else {
                    bail!("entry under {path:?} is not a list: {item:?}");
                };
                let entry = fields
                    .iter()
                    .map(scalar_text)
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("entry under {path:?}"))?;
                entries.push(entry);
            }
            Ok(OntNode::Leaf(entries))
        }
        Value::Tagged(tagged) => convert_node(&tagged.value, path),
        other => Err(anyhow!("unexpected value under {path:?}: {other:?}")),
    }
}

fn scalar_text(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        other => Err(anyhow!("expected a scalar, found {other:?}")),
    }
}

// ============================================================================
// Writing
// ============================================================================

pub fn render_nested(nested: &NestedOntology) -> String {
    let mut out = format!("legend: {}\n", flow_list(&nested.legend));
    if nested.ont.is_empty() {
        out.push_str("ont: {}\n");
    } else {
        out.push_str("ont:\n");
        write_map(&mut out, &nested.ont, 1);
    }
    out
}

fn write_map(out: &mut String, map: &BTreeMap<String, OntNode>, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, node) in map {
        let key = scalar(key);
        match node {
            OntNode::Branch(children) if children.is_empty() => {
                out.push_str(&format!("{indent}{key}: {{}}\n"));
            }
            OntNode::Branch(children) => {
                out.push_str(&format!("{indent}{key}:\n"));
                write_map(out, children, depth + 1);
            }
            OntNode::Leaf(entries) if entries.is_empty() => {
                out.push_str(&format!("{indent}{key}: []\n"));
            }
            OntNode::Leaf(entries) => {
                out.push_str(&format!("{indent}{key}:\n"));
                for entry in entries {
                    out.push_str(&format!("{indent}- {}\n", flow_list(entry)));
                }
            }
        }
    }
}

pub(crate) fn flow_list(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|s| scalar(s)).collect();
    format!("[{}]", items.join(", "))
}

/// Plain when unambiguous, single-quoted otherwise; anything outside the
/// plain-safe character set forces a double-quoted string with escapes.
fn scalar(s: &str) -> String {
    if s.contains(|c: char| c == '\\' || !is_plain_safe(c)) {
        return double_quoted(s);
    }
    if needs_quotes(s) {
        format!("'{}'", s.replace('\'', "''"))
    } else {
        s.to_string()
    }
}

/// YAML printable characters minus the ones a reader folds as line breaks
/// (NEL, LS, PS) and the byte-order mark.
fn is_plain_safe(c: char) -> bool {
    match c as u32 {
        0x20..=0x7E => true,
        0x85 | 0x2028 | 0x2029 | 0xFEFF => false,
        0xA0..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF => true,
        _ => false,
    }
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if is_plain_safe(c) => out.push(c),
            c if (c as u32) <= 0xFFFF => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push_str(&format!("\\U{:08X}", c as u32)),
        }
    }
    out.push('"');
    out
}

fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s != s.trim() {
        return true;
    }
    if s.contains(|c: char| ":,[]{}#&*!|>'\"%@`".contains(c)) {
        return true;
    }
    if s.starts_with(|c: char| matches!(c, '-' | '?' | '~' | '.' | '+') || c.is_ascii_digit()) {
        return true;
    }
    matches!(
        s.to_ascii_lowercase().as_str(),
        "null" | "true" | "false" | "yes" | "no" | "on" | "off"
    )
}
