pub mod paths;
pub mod store;

use std::path::PathBuf;

pub use paths::PathManager;
pub use store::Configuration;

/// Read `.env` files into the process environment so `SCOPESHELL_*`
/// settings can live in a file. Call it before parsing the command line.
///
/// `./.env` is read before `~/.env`, and a variable is never overwritten
/// once set: the real environment wins over the working directory, which
/// wins over the home directory.
pub fn load_env_file() {
    let mut files = vec![PathBuf::from(".env")];
    if let Some(home) = dirs::home_dir() {
        files.push(home.join(".env"));
    }
    load_env_files(&files);
}

/// Load every readable file of `paths` in order, returning how many were
/// loaded. Earlier files take precedence.
pub fn load_env_files(paths: &[PathBuf]) -> usize {
    paths
        .iter()
        .filter(|path| path.is_file() && dotenv::from_path(path).is_ok())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earlier_env_files_win() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.env");
        let home = dir.path().join("home.env");
        std::fs::write(&local, "SCOPESHELL_ENV_ORDER_SHARED=local\n").unwrap();
        std::fs::write(
            &home,
            "SCOPESHELL_ENV_ORDER_SHARED=home\nSCOPESHELL_ENV_ORDER_HOME=only-home\n",
        )
        .unwrap();
        let missing = dir.path().join("missing.env");

        assert_eq!(load_env_files(&[local, missing, home]), 2);
        assert_eq!(std::env::var("SCOPESHELL_ENV_ORDER_SHARED").unwrap(), "local");
        assert_eq!(std::env::var("SCOPESHELL_ENV_ORDER_HOME").unwrap(), "only-home");
    }
}
