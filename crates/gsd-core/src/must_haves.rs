//! Extractor for the nested `must_haves` sub-block of a plan header: lists
//! of truths (plain strings), artifact descriptors, and key-link
//! descriptors. Indentation-relative rather than column-fixed — documents
//! in the wild nest with 2- or 3-space steps depending on which tool
//! version wrote them. Read-only: there is no serializer counterpart.

use crate::frontmatter::{decode_scalar, header_lines, indent_width, split_key_line};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

// ---------------------------------------------------------------------------
// Item model
// ---------------------------------------------------------------------------

/// One field of a descriptor. Integer-literal values are coerced; quoted
/// digits stay strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::Int(n) => serializer.serialize_i64(*n),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// An open field set — artifact and key-link entries carry whatever keys
/// the document declares (`path`/`provides`/`min_lines`, `from`/`to`/`via`,
/// `imports`/`names`, …). Field order follows the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    fields: Vec<(String, FieldValue)>,
}

impl Descriptor {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One entry of a must-haves list: a bare string for `truths`, a
/// descriptor for `artifacts` and `key_links`. Serializes to a JSON
/// string or object accordingly.
#[derive(Debug, Clone, PartialEq)]
pub enum MustHaveItem {
    Text(String),
    Descriptor(Descriptor),
}

impl MustHaveItem {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MustHaveItem::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_descriptor(&self) -> Option<&Descriptor> {
        match self {
            MustHaveItem::Descriptor(d) => Some(d),
            _ => None,
        }
    }
}

impl Serialize for MustHaveItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MustHaveItem::Text(s) => serializer.serialize_str(s),
            MustHaveItem::Descriptor(d) => d.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the named sub-block (`truths`, `artifacts`, or `key_links`)
/// from under the header's `must_haves:` key. Returns an empty vector when
/// the header, the key, or the block is absent. Malformed lines are
/// skipped, never errors.
pub fn parse_must_haves_block(text: &str, name: &str) -> Vec<MustHaveItem> {
    let Some(lines) = header_lines(text) else {
        return Vec::new();
    };

    let Some((base, after_key)) = find_must_haves(&lines) else {
        return Vec::new();
    };

    let Some(block) = isolate_block(&lines[after_key..], base, name) else {
        return Vec::new();
    };

    parse_items(&block)
}

/// Locate `must_haves:`; returns its indentation and the index of the line
/// after it.
fn find_must_haves(lines: &[&str]) -> Option<(usize, usize)> {
    for (i, line) in lines.iter().enumerate() {
        if let Some((key, value)) = split_key_line(line) {
            if key == "must_haves" && value.is_empty() {
                return Some((indent_width(line), i + 1));
            }
        }
    }
    None
}

/// Slice out the lines belonging to the named sub-block. The block's header
/// indentation is learned from the `<name>:` line itself; collection stops
/// at a sibling key at the same indentation or at a dedent past
/// `must_haves`.
fn isolate_block<'a>(lines: &[&'a str], base: usize, name: &str) -> Option<Vec<&'a str>> {
    let mut i = 0;
    let mut header_indent = None;

    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if line.trim().is_empty() {
            continue;
        }
        let w = indent_width(line);
        if w <= base {
            return None;
        }
        if let Some((key, value)) = split_key_line(line) {
            if key == name && value.is_empty() {
                header_indent = Some(w);
                break;
            }
        }
    }

    let h = header_indent?;
    let mut block = Vec::new();
    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        let w = indent_width(line);
        if w <= base {
            break;
        }
        if w == h && split_key_line(line).is_some() {
            // Sibling sub-block (truths/artifacts/key_links at the same level).
            break;
        }
        block.push(line);
        i += 1;
    }
    Some(block)
}

fn parse_items(block: &[&str]) -> Vec<MustHaveItem> {
    let mut items = Vec::new();
    let mut item_indent: Option<usize> = None;
    let mut j = 0;

    while j < block.len() {
        let line = block[j];
        let w = indent_width(line);
        let Some(rest) = line.trim_start().strip_prefix("- ") else {
            j += 1;
            continue;
        };
        match item_indent {
            None => item_indent = Some(w),
            Some(i) if w != i => {
                // A dash off the item baseline is a stray nested list line.
                j += 1;
                continue;
            }
            Some(_) => {}
        }
        j += 1;

        match split_key_line(rest) {
            Some((key, value)) => {
                let mut desc = Descriptor::default();
                if value.is_empty() {
                    // `- names:` opening a nested list as the first field.
                    desc.insert(key, FieldValue::List(collect_list(block, &mut j, w + 2)));
                } else {
                    desc.insert(key, coerce_field(value));
                }
                collect_fields(block, &mut j, w, &mut desc);
                items.push(MustHaveItem::Descriptor(desc));
            }
            None => items.push(MustHaveItem::Text(decode_scalar(rest))),
        }
    }

    items
}

/// Consume the remaining fields of a descriptor: more-deeply-indented
/// `key: value` lines until the next item (or end of block).
fn collect_fields(block: &[&str], j: &mut usize, item_indent: usize, desc: &mut Descriptor) {
    while *j < block.len() {
        let line = block[*j];
        let w = indent_width(line);
        if w <= item_indent {
            break;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("- ") {
            // Stray list line not attached to a field — skip.
            *j += 1;
            continue;
        }
        let Some((key, value)) = split_key_line(line) else {
            *j += 1;
            continue;
        };
        *j += 1;
        if value.is_empty() {
            desc.insert(key, FieldValue::List(collect_list(block, j, w)));
        } else {
            desc.insert(key, coerce_field(value));
        }
    }
}

/// Collect `- item` lines indented deeper than `field_indent`.
fn collect_list(block: &[&str], j: &mut usize, field_indent: usize) -> Vec<String> {
    let mut list = Vec::new();
    while *j < block.len() {
        let line = block[*j];
        if indent_width(line) <= field_indent {
            break;
        }
        if let Some(rest) = line.trim_start().strip_prefix("- ") {
            list.push(decode_scalar(rest));
        }
        *j += 1;
    }
    list
}

/// Unquoted integer literals become integers; everything else is decoded
/// as a string.
fn coerce_field(value: &str) -> FieldValue {
    let t = value.trim();
    if !t.is_empty()
        && t.strip_prefix('-')
            .unwrap_or(t)
            .chars()
            .all(|c| c.is_ascii_digit())
    {
        if let Ok(n) = t.parse::<i64>() {
            return FieldValue::Int(n);
        }
    }
    FieldValue::Str(decode_scalar(value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
