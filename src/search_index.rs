use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use spdlog::info;

use crate::config::Config;
use crate::error::PostError;
use crate::timeline::Timeline;

/* Example of the document the client-side search expects:
{"pages": [
  {"title": "Hello World", "text": "<p>First paragraph...</p>",
   "tags": "rust,blogging", "loc": "/posts/hello.html"}
]}
*/

#[derive(Serialize)]
struct SearchPage {
    title: String,
    text: String,
    tags: String,
    loc: String,
}

#[derive(Serialize)]
struct SearchIndex {
    pages: Vec<SearchPage>,
}

/// Renders the whole timeline, across every translation, into the search
/// index JSON document.
pub fn render_search_index(timeline: &Timeline, config: &Config) -> Result<String, PostError> {
    let mut pages = vec![];
    for lang in config.translations.keys() {
        for post in &timeline.posts {
            pages.push(SearchPage {
                title: post.title(lang)?.to_string(),
                text: post.text(lang, false, false)?,
                tags: post.tags.join(","),
                loc: post.permalink(Some(lang), false, ".html")?,
            });
        }
    }

    let index = SearchIndex { pages };
    match serde_json::to_string_pretty(&index) {
        Ok(json) => Ok(json),
        Err(e) => Err(PostError::Io(e.into())),
    }
}

/// Writes the search index under the output directory, creating the asset
/// folders on the way. Returns the path written.
pub fn write_search_index(timeline: &Timeline, config: &Config) -> Result<PathBuf, PostError> {
    let json = render_search_index(timeline, config)?;

    let dst_path = config
        .paths
        .output_dir
        .join("assets")
        .join("js")
        .join("tipuesearch_content.json");
    if let Some(parent) = dst_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dst_path, json)?;

    info!("Search index written to {}", dst_path.display());
    Ok(dst_path)
}

#[cfg(test)]
mod tests {
    use std::env;

    use serde_json::Value;

    use crate::config::Config;
    use crate::test_data::SAMPLE_CONFIG_TOML;

    use super::*;

    fn sample_config() -> Config {
        toml::from_str(SAMPLE_CONFIG_TOML).unwrap()
    }

    #[test]
    fn test_render_search_index() {
        let config = sample_config();
        let timeline = Timeline::scan(&config).unwrap();
        let json = render_search_index(&timeline, &config).unwrap();

        let doc: Value = serde_json::from_str(&json).unwrap();
        let pages = doc["pages"].as_array().unwrap();
        // Three posts, once per language
        assert_eq!(pages.len(), 6);

        let hello_en = &pages[0];
        assert_eq!(hello_en["title"], "Hello World");
        assert_eq!(hello_en["tags"], "rust,blogging");
        assert_eq!(hello_en["loc"], "/posts/hello.html");
        assert!(hello_en["text"].as_str().unwrap().contains("/posts/img/one.png"));

        let hello_fr = &pages[3];
        assert_eq!(hello_fr["title"], "Bonjour le monde");
        assert_eq!(hello_fr["loc"], "/fr/posts/bonjour.html");
        assert!(hello_fr["text"].as_str().unwrap().contains("Premier paragraphe"));
    }

    #[test]
    fn test_write_search_index() {
        let mut config = sample_config();
        config.paths.output_dir =
            env::temp_dir().join(format!("pagemill-index-{}", std::process::id()));

        let timeline = Timeline::scan(&config).unwrap();
        let dst_path = write_search_index(&timeline, &config).unwrap();
        assert!(dst_path.ends_with("assets/js/tipuesearch_content.json"));

        let written = fs::read_to_string(&dst_path).unwrap();
        let doc: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(doc["pages"].as_array().unwrap().len(), 6);

        let _ = fs::remove_dir_all(&config.paths.output_dir);
    }
}
