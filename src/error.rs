use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::{error, fmt, io};

/// Errors raised while building a post or reading its localized views.
#[derive(Debug)]
pub enum PostError {
    /// Title, slug or date could not be resolved from any metadata source.
    MissingRequiredMetadata {
        missing: Vec<&'static str>,
        source_path: PathBuf,
    },
    /// A language was requested that was never registered in the site translations.
    UnknownLanguage {
        lang: String,
        source_path: PathBuf,
    },
    InvalidDate {
        message: String,
        source_path: PathBuf,
    },
    Io(io::Error),
}

impl Display for PostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PostError::MissingRequiredMetadata { missing, source_path } => {
                write!(f, "missing required metadata ({}) - file={}",
                       missing.join(", "), source_path.display())
            }
            PostError::UnknownLanguage { lang, source_path } => {
                write!(f, "unknown language '{}' - file={}", lang, source_path.display())
            }
            PostError::InvalidDate { message, source_path } => {
                write!(f, "{} - file={}", message, source_path.display())
            }
            PostError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for PostError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PostError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PostError {
    fn from(e: io::Error) -> Self {
        PostError::Io(e)
    }
}
