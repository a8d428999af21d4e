use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::apportion::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Paths in a configuration file are relative to the directory of that file.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    let p: PathBuf = [root, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> ApportionResult<T> {
    info!("Attempting to read file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}
