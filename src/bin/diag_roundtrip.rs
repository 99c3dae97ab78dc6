//! Roundtrip diagnostic: read an IGES file, summarize it, write it back
//! and read the output again to compare entity counts.
//!
//! Usage: diag_roundtrip <input.igs> [output.igs] [--units mm|in|...]

use anyhow::{bail, Context};
use igesrust::{IgesReader, IgesReaderConfiguration, IgesWriter, Unit};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut output = None;
    let mut target_units = None;

    while let Some(arg) = args.next() {
        if arg == "--units" {
            let name = args.next().context("--units needs a unit name")?;
            let unit = Unit::from_name(&name).with_context(|| format!("unknown unit '{}'", name))?;
            target_units = Some(unit);
        } else if input.is_none() {
            input = Some(arg);
        } else {
            output = Some(arg);
        }
    }
    let Some(input) = input else {
        bail!("usage: diag_roundtrip <input.igs> [output.igs] [--units NAME]");
    };
    let output = output.unwrap_or_else(|| format!("{}.roundtrip.igs", input));

    // 1. Read
    let config = IgesReaderConfiguration { target_units };
    let mut doc = IgesReader::from_file(&input)
        .with_context(|| format!("cannot open {}", input))?
        .with_configuration(config)
        .read()
        .with_context(|| format!("failed to read {}", input))?;

    println!("1. Read {}: {} entities, unit {}", input, doc.entity_count(), doc.global.unit);
    let mut by_type: BTreeMap<i32, usize> = BTreeMap::new();
    for (_, entity) in doc.entities() {
        *by_type.entry(entity.declared_type()).or_default() += 1;
    }
    for (entity_type, count) in &by_type {
        println!("   type {:>4}: {}", entity_type, count);
    }
    for notification in &doc.notifications {
        println!("   {}", notification);
    }

    // 2. Write
    let bytes = IgesWriter::new(&mut doc)
        .write_to_vec()
        .context("failed to write document")?;
    std::fs::write(&output, &bytes).with_context(|| format!("cannot write {}", output))?;
    println!("2. Wrote {} ({} lines)", output, bytes.iter().filter(|b| **b == b'\n').count());

    // 3. Read back
    let back = IgesReader::from_reader(bytes.as_slice())?
        .read()
        .context("failed to read the written file back")?;
    println!("3. Read back: {} entities", back.entity_count());
    if back.entity_count() != doc.entity_count() {
        bail!(
            "entity count changed: {} before, {} after",
            doc.entity_count(),
            back.entity_count()
        );
    }
    println!("   OK");
    Ok(())
}
