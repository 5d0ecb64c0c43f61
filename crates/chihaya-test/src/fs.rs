use std::io::Write;
use std::path::PathBuf;

pub type TempFile = PathBuf;

/// Writes `content` to a fresh file in the system temp directory.
///
/// The file outlives the call; remove it with `defer!` once the test is done.
pub fn create_file(name: &str, content: &str) -> TempFile {
    let mut file = tempfile::Builder::new()
        .prefix(name)
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");

    let (_, path) = file.keep().expect("Failed to keep temp file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defer;

    #[test]
    fn test_create_file() {
        let path = create_file("chihaya", "{}");
        defer! {
            let _ = std::fs::remove_file(&path);
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("chihaya"));
    }
}
