use std::path::{Path, PathBuf};

use quarry_common::Name;

use crate::errors::VmError;

/// Guest modules live at `<wasm_dir>/<short_name>-server.wasm`.
pub fn module_path(wasm_dir: &Path, short_name: Name) -> PathBuf {
    wasm_dir.join(format!("{short_name}-server.wasm"))
}

pub fn read_module(path: &Path) -> Result<Vec<u8>, VmError> {
    std::fs::read(path).map_err(|source| VmError::ModuleRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_follows_the_filename_convention() {
        let path = module_path(Path::new("/var/wasm"), "block.info".parse().unwrap());
        assert_eq!(path, Path::new("/var/wasm/block.info-server.wasm"));
    }

    #[test]
    fn missing_module_reports_its_path() {
        let err = read_module(Path::new("/nonexistent/legacy-server.wasm")).unwrap_err();
        match err {
            VmError::ModuleRead { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/legacy-server.wasm"));
            }
            other => panic!("expected module read error, got {other:?}"),
        }
    }
}
