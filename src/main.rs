use std::io::{self, Read};

use anyhow::{Context, Result};

fn main() -> Result<()> {
    println!(
        "{} version: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Reading stdin")?;

    let stdout = io::stdout();
    mython::interpreter::run(&source, &mut stdout.lock())
}
