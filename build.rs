//! Turns the export listings under `exports/` into the generic forwarding table.
//!
//! Each listing is a plain text file with one export name per line. Blank lines and
//! lines starting with `#` are ignored. Names shared between listings are emitted once.
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn read_listing(path: &Path, names: &mut BTreeSet<String>) {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read export listing {}: {e}", path.display()));

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !is_identifier(line) {
            panic!(
                "{}:{}: `{line}` is not a valid export name",
                path.display(),
                line_no + 1
            );
        }

        names.insert(line.to_owned());
    }
}

fn main() {
    let listing_dir = PathBuf::from("exports");
    println!("cargo:rerun-if-changed={}", listing_dir.display());

    let mut listings: Vec<PathBuf> = std::fs::read_dir(&listing_dir)
        .expect("missing exports/ directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    listings.sort();

    let mut names = BTreeSet::new();
    for listing in &listings {
        println!("cargo:rerun-if-changed={}", listing.display());
        read_listing(listing, &mut names);
    }

    let mut out = String::from("generic_exports! {\n");
    for (index, name) in names.iter().enumerate() {
        writeln!(out, "    {index} => {name},").unwrap();
    }
    out.push_str("}\n");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    std::fs::write(out_dir.join("generic_exports.rs"), out).unwrap();
}
