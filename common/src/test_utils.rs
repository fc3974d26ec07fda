use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn workspace_root() -> &'static Path {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("common crate lives inside the workspace")
            .to_path_buf()
    })
}

/// Path for a file written by a test under `test_output/`. The directory is
/// created on first use.
pub fn test_output_path(name: &str) -> PathBuf {
    static OUTPUT_DIR: OnceLock<PathBuf> = OnceLock::new();
    let dir = OUTPUT_DIR.get_or_init(|| {
        let dir = workspace_root().join("test_output");
        std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
        dir
    });
    dir.join(name)
}

/// Path of a checked-in fixture under `test_resources/`.
pub fn test_resource_path(name: &str) -> PathBuf {
    workspace_root().join("test_resources").join(name)
}
