use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Soft failure: queries report absence as an `error` field in the output
/// rather than a nonzero exit, so agent callers always get JSON back.
pub fn print_error(message: impl std::fmt::Display) -> anyhow::Result<()> {
    print_json(&serde_json::json!({ "error": message.to_string() }))
}

/// `key=value` lines for shell consumers (`state load --raw`).
pub fn print_kv(pairs: &[(&str, String)]) {
    for (key, value) in pairs {
        println!("{key}={value}");
    }
}
