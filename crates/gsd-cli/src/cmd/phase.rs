use crate::output::print_json;
use gsd_core::phases;
use std::path::Path;

pub fn run(root: &Path, number: &str) -> anyhow::Result<()> {
    let info = phases::find_phase(root, number)?;
    print_json(&info)
}
