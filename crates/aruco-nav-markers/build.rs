//! Embed `data/*_CODES.json` dictionaries as `builtins.rs` in `OUT_DIR`.

use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::{env, fs};

#[derive(Deserialize)]
struct DictionaryFile {
    name: String,
    marker_size: usize,
    max_correction_bits: u8,
    codes: Vec<u64>,
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let data_dir = manifest_dir.join("data");
    println!("cargo:rerun-if-changed={}", data_dir.display());

    let mut files: Vec<PathBuf> = fs::read_dir(&data_dir)
        .expect("read data dir")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_codes_file(p))
        .collect();
    files.sort();

    let mut out = String::new();
    let mut names = Vec::new();

    for path in &files {
        println!("cargo:rerun-if-changed={}", path.display());
        let text = fs::read_to_string(path).expect("read dictionary file");
        let dict: DictionaryFile = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("parse {}: {e}", path.display()));

        let bits = dict.marker_size * dict.marker_size;
        assert!(bits <= 64, "{}: {bits} bits do not fit in u64", dict.name);
        assert!(!dict.codes.is_empty(), "{}: no codes", dict.name);

        let const_name = dict.name.to_uppercase();
        let codes_name = format!("{const_name}_CODES");

        writeln!(out, "const {codes_name}: &[u64] = &[").unwrap();
        for code in &dict.codes {
            assert!(
                bits == 64 || *code >> bits == 0,
                "{}: code {code:#x} exceeds {bits} bits",
                dict.name
            );
            writeln!(out, "    0x{code:012x},").unwrap();
        }
        writeln!(out, "];\n").unwrap();

        writeln!(out, "/// Built-in `{}` dictionary.", dict.name).unwrap();
        writeln!(
            out,
            "pub const {const_name}: Dictionary = Dictionary::from_static(\"{}\", {}, {}, {codes_name});\n",
            dict.name, dict.marker_size, dict.max_correction_bits
        )
        .unwrap();

        names.push((dict.name, const_name));
    }

    writeln!(out, "/// Names of all embedded dictionaries.").unwrap();
    writeln!(out, "pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &[").unwrap();
    for (name, _) in &names {
        writeln!(out, "    \"{name}\",").unwrap();
    }
    writeln!(out, "];\n").unwrap();

    writeln!(out, "/// Look up an embedded dictionary by name (for example `DICT_6X6_250`).").unwrap();
    writeln!(out, "pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {{").unwrap();
    writeln!(out, "    match name {{").unwrap();
    for (name, const_name) in &names {
        writeln!(out, "        \"{name}\" => Some({const_name}),").unwrap();
    }
    writeln!(out, "        _ => None,").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "}}").unwrap();

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR")).join("builtins.rs");
    fs::write(out_path, out).expect("write builtins.rs");
}

fn is_codes_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_CODES.json"))
}
