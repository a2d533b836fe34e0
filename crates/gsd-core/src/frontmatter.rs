//! Hand-written parser and serializer for the frontmatter dialect used by
//! planning documents: a restricted YAML-like grammar between `---`
//! delimiters. Deliberately not a YAML library — the dialect is flat keys,
//! inline/block string sequences, and shallow nested mappings, and it must
//! round-trip values containing colons, hashes, brackets, and dollar signs
//! exactly as written. Parsing is permissive: malformed lines are skipped,
//! absence is an empty result, nothing here returns an error.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

// ---------------------------------------------------------------------------
// Value / Mapping
// ---------------------------------------------------------------------------

/// A frontmatter value. Scalars stay strings — booleans and numbers are not
/// coerced; callers parse on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    Sequence(Vec<String>),
    Mapping(Mapping),
}

impl Value {
    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(s.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Convert a JSON value into a frontmatter value. Returns `None` for
    /// JSON null — callers treat null as "remove this key".
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Value::Scalar(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Scalar(b.to_string())),
            serde_json::Value::Number(n) => Some(Value::Scalar(n.to_string())),
            serde_json::Value::Array(items) => Some(Value::Sequence(
                items
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            serde_json::Value::Object(obj) => {
                let mut m = Mapping::new();
                for (k, v) in obj {
                    if let Some(value) = Value::from_json(v) {
                        m.insert(k.clone(), value);
                    }
                }
                Some(Value::Mapping(m))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(m) => m.serialize(serializer),
        }
    }
}

/// An insertion-ordered string-keyed map. Field order is structural here:
/// serialization must reproduce source order, so a hash map won't do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value, replacing in place if the key exists (last-write-wins,
    /// original position kept).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Scalar coercion
// ---------------------------------------------------------------------------

/// Strip one layer of matching single or double quotes, after trimming.
pub(crate) fn decode_scalar(raw: &str) -> String {
    let t = raw.trim();
    if t.len() >= 2 {
        let bytes = t.as_bytes();
        let first = bytes[0];
        let last = bytes[t.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return t[1..t.len() - 1].to_string();
        }
    }
    t.to_string()
}

/// A scalar must be quoted when its bare rendering would be misparsed: a
/// colon-space splits the line, `#` reads as structure, a leading `[` or `{`
/// reads as an inline collection. The grammar has no escaping, so embedded
/// double quotes stay as-is.
fn needs_quotes(value: &str) -> bool {
    value.contains(": ")
        || value.contains('#')
        || value.starts_with('[')
        || value.starts_with('{')
}

pub(crate) fn encode_scalar(value: &str) -> String {
    if needs_quotes(value) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

pub(crate) fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

/// Split `key: value` at the first colon, accepting keys of letters, digits,
/// hyphens, and underscores. Returns `None` for anything else — the caller
/// skips the line.
pub(crate) fn split_key_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    let colon = trimmed.find(':')?;
    let key = &trimmed[..colon];
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((key, trimmed[colon + 1..].trim()))
}

/// Split the inner text of an inline array on commas outside quotes.
fn split_inline_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    current.push(c);
                    quote = Some(c);
                }
                ',' => {
                    items.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    items.push(current);
    items
        .into_iter()
        .map(|s| decode_scalar(&s))
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Extract the `---`-delimited header of `text` into a [`Mapping`]. Returns
/// an empty mapping when the text does not start with a delimiter line. A
/// missing closing delimiter is tolerated: the remainder of the text is
/// treated as the header.
pub fn extract_frontmatter(text: &str) -> Mapping {
    let Some(lines) = header_lines(text) else {
        return Mapping::new();
    };
    let mut pos = 0;
    parse_mapping(&lines, &mut pos, None)
}

pub(crate) fn header_lines(text: &str) -> Option<Vec<&str>> {
    let mut lines = text.lines();
    if !is_delimiter(lines.next()?) {
        return None;
    }
    Some(lines.take_while(|l| !is_delimiter(l)).collect())
}

/// Parse one nesting level. The level's indentation width is learned from
/// the first key line encountered; lines indented less belong to an
/// ancestor, lines indented more are consumed by the value they follow (or
/// skipped as malformed).
fn parse_mapping(lines: &[&str], pos: &mut usize, parent_indent: Option<usize>) -> Mapping {
    let mut map = Mapping::new();
    let mut level_indent: Option<usize> = None;

    while *pos < lines.len() {
        let line = lines[*pos];
        if line.trim().is_empty() {
            *pos += 1;
            continue;
        }
        let w = indent_width(line);
        if let Some(parent) = parent_indent {
            if w <= parent {
                break;
            }
        }
        match level_indent {
            None => level_indent = Some(w),
            Some(level) => {
                if w < level {
                    break;
                }
                if w > level {
                    // Stray deeper line not claimed by a value above.
                    *pos += 1;
                    continue;
                }
            }
        }

        let Some((key, value)) = split_key_line(line) else {
            *pos += 1;
            continue;
        };
        let key = key.to_string();
        *pos += 1;

        if value.is_empty() {
            map.insert(key, parse_nested(lines, pos, w));
        } else if value.starts_with('[') && value.ends_with(']') {
            map.insert(
                key,
                Value::Sequence(split_inline_items(&value[1..value.len() - 1])),
            );
        } else if value.starts_with('[') {
            // Unterminated inline array, seen in hand-edited documents:
            // take anything after the bracket, then collect `- item` lines.
            let mut items = split_inline_items(&value[1..]);
            items.extend(collect_dash_items(lines, pos, w));
            map.insert(key, Value::Sequence(items));
        } else {
            map.insert(key, Value::Scalar(decode_scalar(value)));
        }
    }

    map
}

/// A `key:` with no value opens a nested construct; decide its shape from
/// the first more-deeply-indented line.
fn parse_nested(lines: &[&str], pos: &mut usize, key_indent: usize) -> Value {
    let next = lines[*pos..].iter().find(|l| !l.trim().is_empty());
    match next {
        Some(line) if indent_width(line) > key_indent => {
            if line.trim_start().starts_with("- ") || line.trim() == "-" {
                Value::Sequence(collect_dash_items(lines, pos, key_indent))
            } else {
                Value::Mapping(parse_mapping(lines, pos, Some(key_indent)))
            }
        }
        _ => Value::Scalar(String::new()),
    }
}

/// Collect `- item` lines indented deeper than `key_indent`. Deeper lines
/// that are not dash items are skipped, not errors.
fn collect_dash_items(lines: &[&str], pos: &mut usize, key_indent: usize) -> Vec<String> {
    let mut items = Vec::new();
    while *pos < lines.len() {
        let line = lines[*pos];
        if line.trim().is_empty() {
            *pos += 1;
            continue;
        }
        if indent_width(line) <= key_indent {
            break;
        }
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("- ") {
            items.push(decode_scalar(rest));
        }
        *pos += 1;
    }
    items
}

// ---------------------------------------------------------------------------
// Serializer
// ---------------------------------------------------------------------------

/// Render a mapping back to header body text, without the `---` delimiters.
/// Inverse of [`extract_frontmatter`]: re-parsing the output reproduces the
/// mapping for every value shape the parser emits.
pub fn reconstruct_frontmatter(map: &Mapping) -> String {
    let mut out = Vec::new();
    write_mapping(&mut out, map, 0);
    out.join("\n")
}

const INLINE_SEQ_MAX: usize = 60;

fn write_mapping(out: &mut Vec<String>, map: &Mapping, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in map.iter() {
        match value {
            Value::Scalar(s) => {
                if s.is_empty() {
                    out.push(format!("{pad}{key}:"));
                } else {
                    out.push(format!("{pad}{key}: {}", encode_scalar(s)));
                }
            }
            Value::Sequence(items) => {
                if items.is_empty() {
                    out.push(format!("{pad}{key}: []"));
                    continue;
                }
                let encoded: Vec<String> = items.iter().map(|i| encode_scalar(i)).collect();
                let inline = format!("{pad}{key}: [{}]", encoded.join(", "));
                if inline.len() <= INLINE_SEQ_MAX {
                    out.push(inline);
                } else {
                    out.push(format!("{pad}{key}:"));
                    for item in &encoded {
                        out.push(format!("{pad}  - {item}"));
                    }
                }
            }
            Value::Mapping(nested) => {
                out.push(format!("{pad}{key}:"));
                write_mapping(out, nested, indent + 2);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Splicer
// ---------------------------------------------------------------------------

/// Replace the header of `text` with `map`, or prepend one if absent. The
/// body after the closing delimiter is preserved byte-for-byte.
pub fn splice_frontmatter(text: &str, map: &Mapping) -> String {
    let body = reconstruct_frontmatter(map);
    match header_end(text) {
        Some(end) => format!("---\n{body}\n---{}", &text[end..]),
        None => format!("---\n{body}\n---\n{text}"),
    }
}

/// Byte offset just past the final dash of the closing `---` line, or past
/// the end of the text when the closing delimiter is missing. `None` when
/// the text has no header at all.
fn header_end(text: &str) -> Option<usize> {
    let mut offset = 0;
    let mut first = true;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n');
        if first {
            if !is_delimiter(bare) {
                return None;
            }
            first = false;
        } else if is_delimiter(bare) {
            return Some(offset + bare.len());
        }
        offset += line.len();
    }
    if first {
        None
    } else {
        Some(text.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
