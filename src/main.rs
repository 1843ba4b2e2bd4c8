use std::path::PathBuf;

use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    let Some(input) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: token-consensus <crawl-tokens.json>");
    };

    let result = token_consensus::run(&input)
        .with_context(|| format!("normalizing tokens from {}", input.display()))?;
    let serialized =
        serde_json::to_string_pretty(&result).context("serializing normalization result")?;
    println!("{serialized}");
    Ok(())
}
