use std::path::Path;

use anyhow::Result;

use crate::common::{self, LoadOptions};

/// Print every theme as one JSON object keyed by theme name.
pub async fn run(path: &Path, options: &LoadOptions) -> Result<()> {
    let table = common::load_themes(path, options).await?;
    common::print_json(&table)
}
