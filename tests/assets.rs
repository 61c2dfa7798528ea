use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// `tests/tmp` under the crate root, if `dir` is the crate root
pub fn is_base_dir(dir: &Path) -> Option<PathBuf> {
    if ! dir.join("Cargo.toml").is_file() || ! dir.join("tests").is_dir() {
        return None;
    }
    let tmp = dir.join("tests").join("tmp");
    fs::create_dir_all(&tmp).ok()?;
    Some(tmp)
}

/// Scratch directory for images written by tests
pub fn scratch_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os("CARGO_MANIFEST_DIR") {
        if let Some(v) = is_base_dir(Path::new(&dir)) {
            return Some(v);
        }
    }
    let cwd = env::current_dir().ok()?;
    if let Some(v) = is_base_dir(&cwd) {
        return Some(v);
    }
    // Search backwards from current executable path
    let mut exec = env::current_exe().ok()?;
    while let Some(dir) = exec.parent() {
        if let Some(v) = is_base_dir(dir) {
            return Some(v);
        }
        exec = dir.to_path_buf();
    }
    None
}
