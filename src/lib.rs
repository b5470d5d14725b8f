pub mod config;
pub mod error;
pub mod fragment;
pub mod logger;
pub mod metadata;
pub mod paths;
pub mod post;
pub mod search_index;
#[cfg(test)]
mod test_data;
pub mod text_utils;
pub mod timeline;
