#![deny(warnings)]

use anyhow::{bail, Context};
use persistence::{decode, to_json};

/// Print a save file (JSON or binary) as normalized JSON.
fn main() -> anyhow::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: save_inspect <save-file>");
    };
    let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
    let save = decode(&bytes).with_context(|| format!("decoding {path}"))?;
    let ledger = save.ledger()?;
    println!("{}", to_json(&save)?);
    for (kind, amount) in ledger.iter() {
        eprintln!("{:>15}: {amount}", kind.key());
    }
    Ok(())
}
