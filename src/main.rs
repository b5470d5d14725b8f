use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use pagemill::config::read_config;
use pagemill::logger::configure_logger;
use pagemill::search_index::write_search_index;
use pagemill::timeline::Timeline;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// List the posts in the site timeline
    Scan(CommonArgs),
    /// Render the full-text search index JSON
    Index(CommonArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CommonArgs {
    /// Path to the site configuration file
    #[arg(short, long, default_value = "pagemill.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args {
        Args::Scan(args) => scan_cmd(&args.config),
        Args::Index(args) => index_cmd(&args.config),
    }
}

fn scan_cmd(cfg_path: &PathBuf) -> anyhow::Result<()> {
    let config = read_config(cfg_path)?;
    configure_logger(&config).context("Error configuring logger")?;

    let timeline = Timeline::scan(&config)?;
    for post in &timeline.posts {
        println!(
            "{} {} [{}]",
            post.date_rfc3339(),
            post.default_pagename(),
            post.title(&config.site.default_lang)?
        );
    }
    Ok(())
}

fn index_cmd(cfg_path: &PathBuf) -> anyhow::Result<()> {
    let config = read_config(cfg_path)?;
    configure_logger(&config).context("Error configuring logger")?;

    let timeline = Timeline::scan(&config)?;
    let dst_path = write_search_index(&timeline, &config)?;
    println!("{}", dst_path.display());
    Ok(())
}
