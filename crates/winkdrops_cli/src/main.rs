//! Command-line tool for the contact directory.
//!
//! # Responsibility
//! - Build one directory session, run requested syncs and an optional manual
//!   entry, then print the resulting roster.
//! - Keep output deterministic apart from ids, for quick local sanity checks.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use winkdrops_core::{
    core_version, default_log_level, init_logging, parse_contact_method, parse_sync_channel,
    ContactMethod, DirectoryConfig, DirectorySession, DuplicatePolicy, HandleInput,
    UnsupportedDeviceContacts,
};

#[derive(Parser, Debug)]
#[command(name = "winkdrops")]
#[command(about = "Contact directory sync tool for WinkDrops")]
#[command(version)]
struct Args {
    /// Channels to sync in order (device, instagram, x, snapchat, tiktok)
    #[arg(short = 's', long = "sync", value_name = "CHANNEL")]
    channels: Vec<String>,

    /// JSON directory config; built-in defaults when omitted
    #[arg(short, long, env = "WINKDROPS_CONFIG")]
    config: Option<PathBuf>,

    /// Keep repeated (method, handle) pairs instead of skipping them
    #[arg(long)]
    allow_duplicates: bool,

    /// Manual contact name
    #[arg(long, requires = "handle")]
    name: Option<String>,

    /// Manual contact method (Phone, Email, Instagram, X, Snapchat, TikTok, WinkDrops)
    #[arg(long, default_value = "Phone")]
    method: String,

    /// Manual contact handle; the local number for Phone
    #[arg(long, requires = "name")]
    handle: Option<String>,

    /// Country code for a Phone contact; the config default when omitted
    #[arg(long)]
    country_code: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "WINKDROPS_LOG_DIR")]
    log_dir: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    run(Args::parse()).await
}

async fn run(args: Args) -> Result<()> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)
            .with_context(|| format!("initializing logging in {log_dir}"))?;
    }

    let mut config = match args.config.as_deref() {
        Some(path) => DirectoryConfig::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DirectoryConfig::default(),
    };
    if args.allow_duplicates {
        config.duplicate_policy = DuplicatePolicy::AllowDuplicates;
    }

    // No platform address book from a terminal; the device channel reports
    // itself as unsupported.
    let session = DirectorySession::builder(Arc::new(config))
        .device_api(Arc::new(UnsupportedDeviceContacts))
        .build()
        .context("building directory session")?;
    info!(
        "event=cli_run module=cli status=started channels={} manual={}",
        args.channels.len(),
        args.name.is_some()
    );

    println!("winkdrops_core version={}", core_version());

    for raw in &args.channels {
        let channel =
            parse_sync_channel(raw).with_context(|| format!("unknown sync channel `{raw}`"))?;
        match session.sync_channel(channel).await {
            Ok(report) => println!("{}", report.summary()),
            Err(err) => println!("{err}"),
        }
    }

    if let (Some(name), Some(handle)) = (args.name.as_deref(), args.handle.as_deref()) {
        let method = parse_contact_method(&args.method)
            .with_context(|| format!("unknown contact method `{}`", args.method))?;
        let input = match method {
            ContactMethod::Phone => HandleInput::phone(
                args.country_code
                    .clone()
                    .unwrap_or_else(|| session.config().default_country_code.clone()),
                handle,
            ),
            other => HandleInput::single(other, handle),
        };
        match session.submit(name, &input) {
            Ok(contact) => println!("Added {} ({})", contact.name, contact.id),
            Err(err) => println!("Not added: {err}"),
        }
    }

    for contact in session.contacts() {
        println!(
            "{}\t{}\t{}\t{}",
            contact.id, contact.method, contact.handle, contact.name
        );
    }

    Ok(())
}
