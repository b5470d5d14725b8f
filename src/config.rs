use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::{fs, io};

use regex::Regex;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Paths {
    /// Where the post sources (and their sidecar files) live
    pub posts_dir: PathBuf,
    /// Where the pre-rendered HTML fragments live
    pub cache_dir: PathBuf,
    /// Where generated artifacts are written
    pub output_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct Site {
    pub base_url: String,
    pub default_lang: String,
    /// Output folder segment under each language root, e.g. "posts"
    pub folder: String,
    pub template_name: String,
}

#[derive(Deserialize, Default)]
pub struct Posts {
    /// Regex with named capture groups, matched against post file names
    pub file_metadata_regexp: Option<String>,
    /// Custom destination template, rendered with language, language_location,
    /// slug, extension, title and date
    pub url_pattern: Option<String>,
    /// Fixed UTC offset in minutes applied to post dates
    pub utc_offset_minutes: Option<i32>,
    pub use_in_feeds: Option<bool>,
    pub on_missing_metadata: Option<MetadataPolicy>,
}

/// What to do when a post is missing title, slug or date.
#[derive(Deserialize, Copy, Clone, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// Abort the whole build at the first invalid post
    Halt,
    /// Log the invalid post and keep building the rest of the site
    Skip,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub site: Site,
    pub paths: Paths,
    #[serde(default)]
    pub posts: Posts,
    /// Language code to root path segment, e.g. "en" -> "", "fr" -> "fr"
    pub translations: BTreeMap<String, String>,
    /// Language code to localized phrases; must carry "Read more" per language
    pub messages: HashMap<String, HashMap<String, String>>,
    pub log: Option<Log>,
}

impl Config {
    pub fn filename_regex(&self) -> io::Result<Option<Regex>> {
        match &self.posts.file_metadata_regexp {
            None => Ok(None),
            Some(pattern) => match Regex::new(pattern) {
                Ok(re) => Ok(Some(re)),
                Err(e) => Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("Invalid file_metadata_regexp: {}", e),
                )),
            },
        }
    }

    pub fn metadata_policy(&self) -> MetadataPolicy {
        self.posts.on_missing_metadata.unwrap_or(MetadataPolicy::Halt)
    }

    pub fn use_in_feeds(&self) -> bool {
        self.posts.use_in_feeds.unwrap_or(true)
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(
            e.kind(),
            format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => Ok(cfg),
        Err(e) => Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    }
}
