use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::paths::{base_name, with_lang, without_extension};
use crate::text_utils::slugify;

/// Resolved post metadata. The six fields every source can provide are
/// structured; anything else a header directive or filename pattern captures
/// lands in `extra` under its own key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub tags: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub extra: HashMap<String, String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.date.is_none()
            && self.tags.is_none()
            && self.link.is_none()
            && self.description.is_none()
            && self.extra.is_empty()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key {
            "title" => self.title = Some(value),
            "slug" => self.slug = Some(value),
            "date" => self.date = Some(value),
            "tags" => self.tags = Some(value),
            "link" => self.link = Some(value),
            "description" => self.description = Some(value),
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "title" => self.title.as_deref(),
            "slug" => self.slug.as_deref(),
            "date" => self.date.as_deref(),
            "tags" => self.tags.as_deref(),
            "link" => self.link.as_deref(),
            "description" => self.description.as_deref(),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Overlays every field present in `other` on top of `self`.
    pub fn merge(&mut self, other: Metadata) {
        if other.title.is_some() {
            self.title = other.title;
        }
        if other.slug.is_some() {
            self.slug = other.slug;
        }
        if other.date.is_some() {
            self.date = other.date;
        }
        if other.tags.is_some() {
            self.tags = other.tags;
        }
        if other.link.is_some() {
            self.link = other.link;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        self.extra.extend(other.extra);
    }
}

/// Path of the sidecar metadata file for a source: `<stem>.meta`, with the
/// language appended for translations (`<stem>.meta.fr`).
pub fn sidecar_path(source_path: &Path, lang: Option<&str>) -> PathBuf {
    let meta_path = PathBuf::from(format!("{}.meta", without_extension(source_path).display()));
    match lang {
        Some(lang) => with_lang(&meta_path, lang),
        None => meta_path,
    }
}

/// Reads a sidecar metadata file: exactly six newline-separated positional
/// fields (title, slug, date, tags, link, description). Missing trailing
/// lines count as empty; blank lines omit the field. A missing file yields
/// an empty record.
pub fn from_meta_file(meta_path: &Path) -> Metadata {
    let mut meta = Metadata::default();
    let Ok(content) = fs::read_to_string(meta_path) else {
        return meta;
    };

    let fields = ["title", "slug", "date", "tags", "link", "description"];
    let mut lines = content.lines();
    for key in fields {
        let value = lines.next().unwrap_or("").trim();
        if !value.is_empty() {
            meta.set(key, value);
        }
    }
    meta
}

/// Applies a filename pattern with named capture groups to the bare file
/// name. Group names are lowercased; no match yields an empty record.
pub fn from_filename(file_name: &str, pattern: &Regex) -> Metadata {
    let mut meta = Metadata::default();
    let Some(caps) = pattern.captures(file_name) else {
        return meta;
    };

    for name in pattern.capture_names().flatten() {
        if let Some(value) = caps.name(name) {
            meta.set(&name.to_lowercase(), value.as_str());
        }
    }
    meta
}

/// Scans the leading contiguous non-blank lines of a source file for
/// metadata. A missing file is not an error: multilingual sites routinely
/// lack some language variants.
pub fn from_source_file(source_path: &Path) -> Metadata {
    match fs::read_to_string(source_path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().map(str::trim).collect();
            from_header_lines(&lines)
        }
        Err(_) => Metadata::default(),
    }
}

/// Header heuristics, applied line by line until the first blank line:
/// - `.. key: value` directives set the key, later occurrences winning;
/// - a run of 4+ punctuation characters under a non-blank line takes the
///   previous line as the title (reST underline), never on the first line;
/// - `#Title` takes the remainder of the line as the title.
/// The heading heuristics only fire while no title is known yet.
pub fn from_header_lines(lines: &[&str]) -> Metadata {
    lazy_static! {
        static ref DIRECTIVE_REGEX: Regex = Regex::new(r"^\.\. (?P<key>.+?): (?P<value>.*)").unwrap();
        static ref MD_TITLE_REGEX: Regex = Regex::new(r"^#(?P<title>[^#].*)").unwrap();
        static ref RST_UNDERLINE_REGEX: Regex = Regex::new(r"^[[:punct:]]{4,}").unwrap();
    }

    let mut meta = Metadata::default();
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            break;
        }

        if let Some(caps) = DIRECTIVE_REGEX.captures(line) {
            let key = caps.name("key").map(|k| k.as_str()).unwrap_or("");
            let value = caps.name("value").map(|v| v.as_str().trim()).unwrap_or("");
            if !key.is_empty() {
                meta.set(key, value);
            }
            continue;
        }

        if meta.title.is_none() && i > 0 && RST_UNDERLINE_REGEX.is_match(line) {
            meta.title = Some(lines[i - 1].to_string());
            continue;
        }

        if meta.title.is_none() {
            if let Some(caps) = MD_TITLE_REGEX.captures(line) {
                if let Some(title) = caps.name("title") {
                    meta.title = Some(title.as_str().to_string());
                }
            }
        }
    }
    meta
}

/// Collects metadata from the sidecar file, the filename pattern and the
/// in-file header, without filename-derived defaults.
///
/// A sidecar file with any non-empty field wins outright: the filename
/// pattern and the in-file header are never consulted. This short-circuit
/// is deliberate and load-bearing; see `resolve` for the full contract.
pub fn resolve_sources(
    source_path: &Path,
    filename_pattern: Option<&Regex>,
    lang: Option<&str>,
) -> Metadata {
    resolve_inner(source_path, filename_pattern, lang).0
}

fn resolve_inner(
    source_path: &Path,
    filename_pattern: Option<&Regex>,
    lang: Option<&str>,
) -> (Metadata, bool) {
    let sidecar = from_meta_file(&sidecar_path(source_path, lang));
    if !sidecar.is_empty() {
        // Structural early return: even a partially filled sidecar file
        // suppresses every other metadata source.
        return (sidecar, true);
    }

    let mut meta = Metadata::default();
    if let Some(pattern) = filename_pattern {
        if let Some(file_name) = source_path.file_name().and_then(|n| n.to_str()) {
            meta.merge(from_filename(file_name, pattern));
        }
    }

    let in_file = match lang {
        Some(lang) => from_source_file(&with_lang(source_path, lang)),
        None => from_source_file(source_path),
    };
    meta.merge(in_file);

    (meta, false)
}

/// Full resolution for a source file: sources in priority order, then
/// filename-derived defaults for any still-missing slug and title. The
/// defaults never apply when a sidecar file answered: a sidecar missing its
/// title or slug line leaves those fields empty, and the post invalid.
pub fn resolve(
    source_path: &Path,
    filename_pattern: Option<&Regex>,
    lang: Option<&str>,
) -> Metadata {
    let (mut meta, sidecar_won) = resolve_inner(source_path, filename_pattern, lang);
    if sidecar_won {
        return meta;
    }

    if meta.slug.is_none() {
        meta.slug = Some(slugify(&base_name(source_path)));
    }
    if meta.title.is_none() {
        meta.title = Some(base_name(source_path));
    }
    meta
}
