use crate::output::{print_error, print_json};
use anyhow::{bail, Context};
use clap::Subcommand;
use gsd_core::frontmatter::{
    extract_frontmatter, splice_frontmatter, Value,
};
use gsd_core::io::atomic_write;
use gsd_core::schema;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum FrontmatterSubcommand {
    /// Read frontmatter as JSON, optionally a single field
    Get {
        file: PathBuf,
        #[arg(long)]
        field: Option<String>,
    },

    /// Set a single frontmatter field
    Set {
        file: PathBuf,
        #[arg(long)]
        field: String,
        /// Plain string, or a JSON array/object for structured values
        #[arg(long)]
        value: String,
    },

    /// Merge a JSON object into the frontmatter (null values remove keys)
    Merge {
        file: PathBuf,
        #[arg(long)]
        data: String,
    },

    /// Check required fields against a document schema
    Validate {
        file: PathBuf,
        #[arg(long)]
        schema: String,
    },
}

pub fn run(root: &Path, subcommand: FrontmatterSubcommand) -> anyhow::Result<()> {
    match subcommand {
        FrontmatterSubcommand::Get { file, field } => get(root, &file, field.as_deref()),
        FrontmatterSubcommand::Set { file, field, value } => set(root, &file, &field, &value),
        FrontmatterSubcommand::Merge { file, data } => merge(root, &file, &data),
        FrontmatterSubcommand::Validate { file, schema } => validate(root, &file, &schema),
    }
}

fn resolve(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        root.join(file)
    }
}

fn get(root: &Path, file: &Path, field: Option<&str>) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return print_error(format!("file not found: {}", file.display()));
    };
    let map = extract_frontmatter(&content);
    match field {
        Some(name) => match map.get(name) {
            Some(value) => {
                print_json(&serde_json::json!({ name: serde_json::to_value(value)? }))
            }
            None => print_error(format!("field '{name}' not found in frontmatter")),
        },
        None => print_json(&map),
    }
}

fn set(root: &Path, file: &Path, field: &str, raw_value: &str) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", file.display()))?;

    // A JSON array/object becomes a structured value; anything else is the
    // literal string, so `--value 3` stays the string "3".
    let value = match serde_json::from_str::<serde_json::Value>(raw_value) {
        Ok(json @ (serde_json::Value::Array(_) | serde_json::Value::Object(_))) => {
            Value::from_json(&json)
        }
        _ => Some(Value::scalar(raw_value)),
    };

    let mut map = extract_frontmatter(&content);
    match value {
        Some(value) => map.insert(field, value),
        None => {
            map.remove(field);
        }
    }
    atomic_write(&path, splice_frontmatter(&content, &map).as_bytes())?;
    print_json(&serde_json::json!({ "updated": true }))
}

fn merge(root: &Path, file: &Path, data: &str) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let json: serde_json::Value =
        serde_json::from_str(data).context("invalid JSON passed to --data")?;
    let serde_json::Value::Object(fields) = json else {
        bail!("--data must be a JSON object");
    };

    let mut map = extract_frontmatter(&content);
    for (key, value) in &fields {
        match Value::from_json(value) {
            Some(value) => map.insert(key.clone(), value),
            None => {
                map.remove(key);
            }
        }
    }
    atomic_write(&path, splice_frontmatter(&content, &map).as_bytes())?;
    print_json(&serde_json::json!({ "merged": true }))
}

fn validate(root: &Path, file: &Path, kind: &str) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return print_error(format!("file not found: {}", file.display()));
    };
    let report = schema::validate(&extract_frontmatter(&content), kind)?;
    print_json(&report)
}
