// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use jolt::app::AppModel;
use jolt::i18n;

mod cli;

#[derive(Parser)]
#[command(name = "jolt")]
#[command(about = "A two-page camera app: capture and gallery")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo into the photo folder
    Photo {
        /// Camera index to use (from 'jolt list'); defaults to the last used camera
        #[arg(short, long)]
        camera: Option<usize>,
    },

    /// List photos in the photo folder
    Gallery {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete photos by name (file name without extension)
    Delete {
        name: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=jolt=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Photo { camera }) => cli::take_photo(camera),
        Some(Commands::Gallery { json }) => cli::list_gallery(json),
        Some(Commands::Delete { name }) => cli::delete_photo(&name),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(360.0)
            .min_height(320.0),
    );

    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
