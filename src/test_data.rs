pub const SAMPLE_CONFIG_TOML: &str = r##"
[site]
base_url = "https://example.com"
default_lang = "en"
folder = "posts"
template_name = "post.tmpl"

[paths]
posts_dir = "res/posts"
cache_dir = "res/cache"
output_dir = "out"

[posts]
utc_offset_minutes = 120
on_missing_metadata = "skip"

[translations]
en = ""
fr = "fr"

[messages.en]
"Read more" = "Read more"

[messages.fr]
"Read more" = "Lire la suite"
"##;
