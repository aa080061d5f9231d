use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub fn fixtures_dir() -> PathBuf {
    std::env::var("SCHEMATA_FIXTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/conformance/fixtures"))
}

/// Reads a YAML list of cases from the fixtures directory.
pub fn load_cases<T: DeserializeOwned>(file: &str) -> Vec<T> {
    let path = fixtures_dir().join(file);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    serde_saphyr::from_str(&content).unwrap_or_else(|e| panic!("cannot parse {}: {}", path.display(), e))
}
