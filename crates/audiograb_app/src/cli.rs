//! `audiograb` command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use audiograb_core::{
    normalize_video_url, AppViewModel, Credentials, DeviceHints, Msg, SaveOutcome, StatusKind,
};
use audiograb_engine::{DirectorySaver, ReqwestBackend};
use grab_logging::grab_debug;

use crate::config::{AppConfig, PASSWORD_ENV};
use crate::controller::Controller;
use crate::logging::LogDestination;

/// Fetch audio from video links through an authenticated conversion service.
#[derive(Debug, Parser)]
#[command(name = "audiograb", version)]
#[command(about = "Session-aware audio downloads from a conversion service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./audiograb.ron when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Conversion service base URL; overrides config and environment.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory downloaded files are saved into.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Account used when the service reports no active session.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password for `--username`.
    #[arg(long, global = true, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::Terminal)]
    pub log_to: LogDestination,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the canonical form of a video URL.
    Normalize {
        url: String,
    },

    /// Show title, thumbnail and duration of a video.
    Info {
        url: String,
    },

    /// Download the audio of a video into the output directory.
    Fetch {
        url: String,
        /// Treat the client as a mobile device (keeps the manual save step).
        #[arg(long)]
        mobile: bool,
        /// Treat the client as iOS; implies `--mobile`.
        #[arg(long)]
        ios: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let url = match &self.command {
            Command::Normalize { url } => {
                println!("{}", normalize_video_url(url));
                return Ok(());
            }
            Command::Info { url } | Command::Fetch { url, .. } => url.clone(),
        };

        let config = AppConfig::load(self.config.as_deref())?
            .apply_env()
            .with_base_url(self.base_url.clone());
        grab_debug!("effective config: {:?}", config);

        let backend = ReqwestBackend::new(config.client_settings())
            .context("building the backend client")?;
        let output_dir = self.output_dir.clone().unwrap_or_else(|| config.output_dir());
        let saver = DirectorySaver::new(output_dir);
        let mut controller = Controller::new(Arc::new(backend), Arc::new(saver), config.timings());

        let username = self.username.clone().or_else(|| config.username.clone());
        sign_in(&mut controller, username, self.password.clone()).await?;
        let view = search(&mut controller, &url).await?;
        print_metadata(&view);

        if let Command::Fetch { mobile, ios, .. } = self.command {
            let hints = DeviceHints {
                mobile: mobile || ios,
                ios,
            };
            download(&mut controller, hints).await?;
        }
        Ok(())
    }
}

/// Runs the startup probe and, when there is no session, the login.
pub async fn sign_in(
    controller: &mut Controller,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    controller.dispatch(Msg::Started).await;
    if controller.view().session.authenticated {
        return Ok(());
    }

    let (Some(username), Some(password)) = (username, password) else {
        bail!("not signed in: pass --username and set {PASSWORD_ENV} or --password");
    };
    controller
        .dispatch(Msg::LoginSubmitted(Credentials::new(username, password)))
        .await;

    let view = controller.view();
    if view.session.authenticated {
        return Ok(());
    }
    Err(status_error(&view, "sign-in failed"))
}

/// Looks up the metadata of `url`; returns the view holding it.
pub async fn search(controller: &mut Controller, url: &str) -> Result<AppViewModel> {
    controller.dispatch(Msg::UrlEdited(url.to_string())).await;
    controller.dispatch(Msg::SearchSubmitted).await;
    let view = controller.view();
    if view.metadata.is_none() {
        return Err(status_error(&view, "no video information"));
    }
    Ok(view)
}

/// Downloads the current video, waits for the post-save steps and reports
/// where the file went.
pub async fn download(controller: &mut Controller, hints: DeviceHints) -> Result<()> {
    controller.dispatch(Msg::DownloadRequested(hints)).await;
    if let Some(status) = controller.view().status.filter(|s| s.kind == StatusKind::Error) {
        bail!("{}", status.text);
    }

    controller.settle().await;
    let view = controller.view();
    if let Some(status) = &view.status {
        println!("{status}");
    }
    if view.manual_download.is_some() {
        controller.dispatch(Msg::ManualSaveRequested).await;
    }

    match controller.view().last_saved {
        Some(SaveOutcome::Saved { location }) => {
            println!("Saved to {location}");
            Ok(())
        }
        Some(SaveOutcome::Failed { reason }) => bail!("could not save the download: {reason}"),
        None => Err(anyhow!("the download produced no file")),
    }
}

fn print_metadata(view: &AppViewModel) {
    let Some(meta) = &view.metadata else {
        return;
    };
    println!("Title:     {}", meta.title);
    println!("Thumbnail: {}", meta.thumbnail);
    if let Some(duration) = &meta.duration_label {
        println!("Duration:  {duration}");
    }
}

fn status_error(view: &AppViewModel, fallback: &str) -> anyhow::Error {
    match &view.status {
        Some(status) => anyhow!("{}", status.text),
        None => anyhow!("{fallback}"),
    }
}
