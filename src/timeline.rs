use std::path::{Path, PathBuf};
use std::{fs, io};

use regex::Regex;
use spdlog::{info, warn};

use crate::config::{Config, MetadataPolicy};
use crate::error::PostError;
use crate::post::Post;

/// Source extensions the scan treats as posts. Language variants such as
/// `blah.txt.fr` and sidecar `.meta` files fall outside this list and are
/// picked up through their base post instead.
const SOURCE_EXTENSIONS: &[&str] = &["txt", "md", "rst", "html", "htm"];

/// All posts of the site, ordered by date, with neighbor links filled in.
#[derive(Debug)]
pub struct Timeline {
    pub posts: Vec<Post>,
}

impl Timeline {
    pub fn scan(config: &Config) -> Result<Timeline, PostError> {
        let filename_pattern: Option<Regex> = config.filename_regex()?;

        let mut sources = retrieve_sources(&config.paths.posts_dir)?;
        sources.sort();

        let mut posts = vec![];
        for source in sources {
            match Post::new(&source, config, filename_pattern.as_ref()) {
                Ok(post) => {
                    info!("Scanned post {}", source.display());
                    posts.push(post);
                }
                Err(e) => {
                    let per_post = matches!(
                        e,
                        PostError::MissingRequiredMetadata { .. } | PostError::InvalidDate { .. }
                    );
                    if per_post && config.metadata_policy() == MetadataPolicy::Skip {
                        warn!("Skipping post: {}", e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        posts.sort_by(|a, b| a.date.cmp(&b.date));

        let mut timeline = Timeline { posts };
        timeline.link_neighbors();
        Ok(timeline)
    }

    fn link_neighbors(&mut self) {
        let names: Vec<String> = self
            .posts
            .iter()
            .map(|p| p.default_pagename().to_string())
            .collect();
        for (i, post) in self.posts.iter_mut().enumerate() {
            post.prev_post = if i > 0 { Some(names[i - 1].clone()) } else { None };
            post.next_post = names.get(i + 1).cloned();
        }
    }
}

fn retrieve_sources(posts_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut sources = vec![];
    let entries = fs::read_dir(posts_dir)?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SOURCE_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if is_source {
            sources.push(path);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::test_data::SAMPLE_CONFIG_TOML;

    use super::*;

    fn sample_config() -> Config {
        toml::from_str(SAMPLE_CONFIG_TOML).unwrap()
    }

    #[test]
    fn test_scan_orders_by_date_and_links_neighbors() {
        let config = sample_config();
        let timeline = Timeline::scan(&config).unwrap();

        let names: Vec<&str> = timeline.posts.iter().map(|p| p.default_pagename()).collect();
        assert_eq!(names, vec!["hello", "sidecar-post", "draft-note"]);

        assert_eq!(timeline.posts[0].prev_post, None);
        assert_eq!(timeline.posts[0].next_post.as_deref(), Some("sidecar-post"));
        assert_eq!(timeline.posts[1].prev_post.as_deref(), Some("hello"));
        assert_eq!(timeline.posts[1].next_post.as_deref(), Some("draft-note"));
        assert_eq!(timeline.posts[2].prev_post.as_deref(), Some("sidecar-post"));
        assert_eq!(timeline.posts[2].next_post, None);
    }

    #[test]
    fn test_scan_skip_policy_drops_invalid_posts() {
        let config = sample_config();
        let timeline = Timeline::scan(&config).unwrap();
        // tags_only.txt has a sidecar with nothing but tags and cannot
        // resolve title, slug or date.
        assert!(timeline
            .posts
            .iter()
            .all(|p| p.source_path != PathBuf::from("res/posts/tags_only.txt")));
    }

    #[test]
    fn test_scan_halt_policy_aborts() {
        let mut config = sample_config();
        config.posts.on_missing_metadata = Some(MetadataPolicy::Halt);
        let err = Timeline::scan(&config).unwrap_err();
        assert!(matches!(err, PostError::MissingRequiredMetadata { .. }));
    }
}
