use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fmt, io};

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use ramhorns::Template;
use regex::Regex;

use crate::config::Config;
use crate::error::PostError;
use crate::fragment;
use crate::metadata;
use crate::paths::with_lang;
use crate::text_utils::parse_date_time;

/// A blog post or page, built once from its source file at site-scan time.
/// Metadata is immutable after construction; only the timeline links are
/// filled in later by the collection that orders all posts.
#[derive(Debug)]
pub struct Post {
    pub source_path: PathBuf,
    /// Pre-rendered HTML fragment in the cache tree
    base_path: PathBuf,
    metadata_path: PathBuf,
    folder: String,
    translations: BTreeMap<String, String>,
    default_lang: String,
    base_url: String,
    messages: HashMap<String, HashMap<String, String>>,
    pub template_name: String,
    url_pattern: Option<String>,
    utc_offset: Option<i32>,

    pub date: NaiveDateTime,
    pub tags: Vec<String>,
    pub link: Option<String>,
    pub is_draft: bool,
    pub is_mathjax: bool,
    pub use_in_feeds: bool,
    /// Metadata keys with no structured field of their own
    pub extra: HashMap<String, String>,

    titles: HashMap<String, String>,
    pagenames: HashMap<String, String>,
    descriptions: HashMap<String, String>,
    /// Languages whose localized metadata is entirely borrowed from the
    /// default language
    inherits_default: HashSet<String>,
    translated_to: HashSet<String>,

    /// Default-language slug of the neighboring posts in the site timeline,
    /// set externally once all posts are ordered
    pub prev_post: Option<String>,
    pub next_post: Option<String>,
}

#[derive(ramhorns::Content)]
struct UrlPatternContext<'a> {
    language: &'a str,
    language_location: &'a str,
    slug: &'a str,
    extension: &'a str,
    title: &'a str,
    date: String,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.default_pagename(), self.source_path.display())
    }
}

impl Post {
    pub fn new(
        source_path: &Path,
        config: &Config,
        filename_pattern: Option<&Regex>,
    ) -> Result<Post, PostError> {
        let rel = match source_path.strip_prefix(&config.paths.posts_dir) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => PathBuf::from(source_path.file_name().unwrap_or_default()),
        };
        let mut base_path = config.paths.cache_dir.join(&config.site.folder).join(&rel);
        base_path.set_extension("html");
        let metadata_path = metadata::sidecar_path(source_path, None);

        let meta = metadata::resolve(source_path, filename_pattern, None);

        let default_title = meta.title.clone().unwrap_or_default();
        let default_pagename = meta.slug.clone().unwrap_or_default();
        let default_description = meta.description.clone().unwrap_or_default();
        let date_str = meta.date.clone().unwrap_or_default();

        let mut missing = vec![];
        if default_title.is_empty() {
            missing.push("title");
        }
        if default_pagename.is_empty() {
            missing.push("slug");
        }
        if date_str.is_empty() {
            missing.push("date");
        }
        if !missing.is_empty() {
            return Err(PostError::MissingRequiredMetadata {
                missing,
                source_path: source_path.to_path_buf(),
            });
        }

        let date = parse_date_time(&date_str).map_err(|message| PostError::InvalidDate {
            message,
            source_path: source_path.to_path_buf(),
        })?;

        let raw_tags = meta.tags.clone().unwrap_or_default();
        let mut tags: Vec<String> = raw_tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        // Draft comes in through the tags, but it is a flag, not a tag
        let is_draft = tags.iter().any(|t| t == "draft");
        let use_in_feeds = config.use_in_feeds() && !is_draft;
        tags.retain(|t| t != "draft");
        let is_mathjax = tags.iter().any(|t| t == "mathjax");

        let mut titles = HashMap::new();
        let mut pagenames = HashMap::new();
        let mut descriptions = HashMap::new();
        let mut inherits_default = HashSet::new();
        let mut translated_to = HashSet::new();
        translated_to.insert(config.site.default_lang.clone());

        for lang in config.translations.keys() {
            if *lang == config.site.default_lang {
                titles.insert(lang.clone(), default_title.clone());
                pagenames.insert(lang.clone(), default_pagename.clone());
                descriptions.insert(lang.clone(), default_description.clone());
                continue;
            }

            if with_lang(source_path, lang).is_file() {
                translated_to.insert(lang.clone());
            }

            let lang_meta = metadata::resolve_sources(source_path, filename_pattern, Some(lang));
            if lang_meta.title.is_none()
                && lang_meta.slug.is_none()
                && lang_meta.description.is_none()
            {
                // No localized metadata at all: the language borrows the
                // default-language values wholesale.
                inherits_default.insert(lang.clone());
            }
            titles.insert(lang.clone(), lang_meta.title.unwrap_or_else(|| default_title.clone()));
            pagenames.insert(lang.clone(), lang_meta.slug.unwrap_or_else(|| default_pagename.clone()));
            descriptions.insert(
                lang.clone(),
                lang_meta.description.unwrap_or_else(|| default_description.clone()),
            );
        }

        Ok(Post {
            source_path: source_path.to_path_buf(),
            base_path,
            metadata_path,
            folder: config.site.folder.clone(),
            translations: config.translations.clone(),
            default_lang: config.site.default_lang.clone(),
            base_url: config.site.base_url.clone(),
            messages: config.messages.clone(),
            template_name: config.site.template_name.clone(),
            url_pattern: config.posts.url_pattern.clone(),
            utc_offset: config.posts.utc_offset_minutes,
            date,
            tags,
            link: meta.link,
            is_draft,
            is_mathjax,
            use_in_feeds,
            extra: meta.extra,
            titles,
            pagenames,
            descriptions,
            inherits_default,
            translated_to,
            prev_post: None,
            next_post: None,
        })
    }

    pub fn title(&self, lang: &str) -> Result<&str, PostError> {
        self.titles
            .get(lang)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_language(lang))
    }

    pub fn description(&self, lang: &str) -> Result<&str, PostError> {
        self.descriptions
            .get(lang)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_language(lang))
    }

    pub fn pagename(&self, lang: &str) -> Result<&str, PostError> {
        self.pagenames
            .get(lang)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_language(lang))
    }

    pub fn default_pagename(&self) -> &str {
        self.pagenames
            .get(&self.default_lang)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_translation_available(&self, lang: &str) -> bool {
        self.translated_to.contains(lang)
    }

    /// True if the language carries no localized metadata of its own and
    /// reuses every default-language value.
    pub fn inherits_default_metadata(&self, lang: &str) -> bool {
        self.inherits_default.contains(lang)
    }

    pub fn source_ext(&self) -> Option<String> {
        self.source_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
    }

    pub fn date_rfc3339(&self) -> String {
        if let Some(minutes) = self.utc_offset {
            if let Some(offset) = FixedOffset::east_opt(minutes * 60) {
                if let Some(dt) = offset.from_local_datetime(&self.date).single() {
                    return dt.to_rfc3339();
                }
            }
        }
        self.date.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Files the build must treat as inputs for this post's page.
    pub fn deps(&self, lang: &str) -> Vec<PathBuf> {
        let mut deps = vec![self.base_path.clone()];
        if lang != self.default_lang {
            deps.push(with_lang(&self.base_path, lang));
        }
        deps.extend(self.fragment_deps(lang));
        deps
    }

    /// Files the build must treat as inputs for this post's fragment.
    pub fn fragment_deps(&self, lang: &str) -> Vec<PathBuf> {
        let mut deps = vec![self.source_path.clone()];
        if self.metadata_path.is_file() {
            deps.push(self.metadata_path.clone());
        }
        if lang != self.default_lang {
            let lang_deps: Vec<PathBuf> = deps
                .iter()
                .map(|p| with_lang(p, lang))
                .filter(|p| p.exists())
                .collect();
            deps.extend(lang_deps);
        }
        deps
    }

    /// Path of the fragment for that language, or the default one when no
    /// translated fragment exists on disk.
    fn translated_file_path(&self, lang: &str) -> PathBuf {
        if lang != self.default_lang {
            let lang_path = with_lang(&self.base_path, lang);
            if lang_path.exists() {
                return lang_path;
            }
        }
        self.base_path.clone()
    }

    fn read_more_message(&self, lang: &str) -> &str {
        self.messages
            .get(lang)
            .and_then(|m| m.get("Read more"))
            .or_else(|| self.messages.get(&self.default_lang).and_then(|m| m.get("Read more")))
            .map(String::as_str)
            .unwrap_or("Read more")
    }

    /// Reads the rendered fragment for `lang`, with every relative link made
    /// absolute against the permalink. `teaser_only` cuts at the teaser
    /// sentinel and appends a read-more link; `strip_html` reduces the result
    /// to trimmed plain text, after teaser extraction when both are set.
    pub fn text(&self, lang: &str, teaser_only: bool, strip_html: bool) -> Result<String, PostError> {
        let file_name = self.translated_file_path(lang);
        let data = fs::read_to_string(&file_name)?;
        if data.is_empty() {
            return Ok(data);
        }

        let permalink = self.permalink(Some(lang), false, ".html")?;
        let mut data = fragment::make_links_absolute(&data, &permalink);

        if teaser_only {
            let read_more = format!("{}...", self.read_more_message(lang));
            data = fragment::extract_teaser(&data, &permalink, &read_more);
        }

        if strip_html {
            data = fragment::strip_html(&data);
        }

        Ok(data)
    }

    /// URL path of the post: language root, output folder and localized slug
    /// joined with `/`, empty and `.` pieces dropped. `absolute` prefixes the
    /// site base URL instead of the leading slash.
    pub fn permalink(
        &self,
        lang: Option<&str>,
        absolute: bool,
        extension: &str,
    ) -> Result<String, PostError> {
        let lang = lang.unwrap_or(&self.default_lang);
        let root = self
            .translations
            .get(lang)
            .ok_or_else(|| self.unknown_language(lang))?;
        let pagename = self.pagename(lang)?;

        let page = format!("{}{}", pagename, extension);
        let pieces: Vec<&str> = root
            .split('/')
            .chain(self.folder.split('/'))
            .chain(std::iter::once(page.as_str()))
            .filter(|p| !p.is_empty() && *p != ".")
            .collect();

        let link = if absolute {
            format!("{}/{}", self.base_url.trim_end_matches('/'), pieces.join("/"))
        } else {
            format!("/{}", pieces.join("/"))
        };
        Ok(link)
    }

    /// Filesystem location of the output page, relative to the output
    /// directory. A configured URL pattern template takes over the whole
    /// composition.
    pub fn destination_path(&self, lang: &str, extension: &str) -> Result<PathBuf, PostError> {
        let root = self
            .translations
            .get(lang)
            .ok_or_else(|| self.unknown_language(lang))?;
        let slug = self.pagename(lang)?;

        if let Some(ref pattern) = self.url_pattern {
            let template = match Template::new(pattern.as_str()) {
                Ok(t) => t,
                Err(e) => {
                    return Err(PostError::Io(io::Error::new(
                        ErrorKind::InvalidInput,
                        format!("Error parsing url_pattern template: {}", e),
                    )))
                }
            };
            let rendered = template.render(&UrlPatternContext {
                language: lang,
                language_location: root,
                slug,
                extension,
                title: self.title(lang)?,
                date: self.date_rfc3339(),
            });
            return Ok(PathBuf::from(rendered));
        }

        let mut path = PathBuf::new();
        for piece in root.split('/').chain(self.folder.split('/')) {
            if !piece.is_empty() && piece != "." {
                path.push(piece);
            }
        }
        path.push(format!("{}{}", slug, extension));
        Ok(path)
    }

    fn unknown_language(&self, lang: &str) -> PostError {
        PostError::UnknownLanguage {
            lang: lang.to_string(),
            source_path: self.source_path.clone(),
        }
    }
}
