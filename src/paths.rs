use std::path::{Path, PathBuf};

/// Appends `suffix` to the full path, keeping the existing extension.
/// `posts/blah.txt` + `.fr` becomes `posts/blah.txt.fr`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Language-variant path: `<path>.<lang>`.
pub fn with_lang(path: &Path, lang: &str) -> PathBuf {
    with_suffix(path, &format!(".{}", lang))
}

/// Path without its final extension. `posts/blah.txt` becomes `posts/blah`.
pub fn without_extension(path: &Path) -> PathBuf {
    let mut stripped = path.to_path_buf();
    stripped.set_extension("");
    stripped
}

/// File name without its extension, as text.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_lang() {
        let p = PathBuf::from("posts/blah.txt");
        assert_eq!(with_lang(&p, "fr"), PathBuf::from("posts/blah.txt.fr"));
    }

    #[test]
    fn test_without_extension() {
        assert_eq!(without_extension(Path::new("posts/blah.txt")), PathBuf::from("posts/blah"));
        assert_eq!(without_extension(Path::new("posts/blah")), PathBuf::from("posts/blah"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("posts/how_to_cook.txt")), "how_to_cook");
    }
}
