//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use hangar_core::config;
use hangar_core::logging;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "hangar")]
#[command(version)]
#[command(about = "Drone hangar: your fleet and the community feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[command(flatten)]
        account: AccountArgs,
    },
    /// Create an account
    Register {
        #[command(flatten)]
        account: AccountArgs,
    },
    /// Sign out (clear the stored session)
    Logout,
    /// Show the signed-in account
    Whoami,

    /// Manage your drones
    Drones {
        #[command(subcommand)]
        command: DroneCommands,
    },

    /// Browse and publish to the community
    Community {
        #[command(subcommand)]
        command: CommunityCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show or set the message language (es, en)
    Lang {
        #[arg(value_name = "CODE")]
        code: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct AccountArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "HANGAR_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Drone fields shared by create and update.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DroneFields {
    /// Free-form notes
    #[arg(long)]
    pub comment: Option<String>,
    /// Flight controller firmware (Betaflight, Kiss)
    #[arg(long)]
    pub controller: Option<String>,
    /// Video system (Analogico, Digital)
    #[arg(long)]
    pub video: Option<String>,
    #[arg(long)]
    pub radio: Option<String>,
    #[arg(long)]
    pub components: Option<String>,
}

#[derive(clap::Subcommand)]
enum DroneCommands {
    /// List your drones, newest first
    List {
        /// Filter text; `#12` matches by id
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Show one drone
    Show {
        #[arg(value_name = "DRONE_ID")]
        id: i64,
    },
    /// Create a drone
    Create {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: DroneFields,
    },
    /// Update a drone; omitted fields keep their value, empty ones clear it
    Update {
        #[arg(value_name = "DRONE_ID")]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: DroneFields,
    },
    /// Delete a drone
    Delete {
        #[arg(value_name = "DRONE_ID")]
        id: i64,
        /// Confirmation phrase, e.g. "DELETE #12" (or "BORRAR #12")
        #[arg(long)]
        confirm: String,
    },
    /// List a drone's dumps, newest first
    Dumps {
        #[arg(value_name = "DRONE_ID")]
        id: i64,
    },
    /// Upload a dump file (.sql, .dump, .gz, .zip, .txt) to a drone
    Upload {
        #[arg(value_name = "DRONE_ID")]
        id: i64,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Parse a stored dump and summarize its sections
    Parse {
        #[arg(value_name = "DRONE_ID")]
        drone_id: i64,
        #[arg(value_name = "DUMP_ID")]
        dump_id: i64,
        /// Print every setting of this profile
        #[arg(long, value_name = "PROFILE")]
        profile: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum CommunityCommands {
    /// Public drones
    Drones {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Public dumps across all posts, newest first
    Dumps {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Publish one of your drones (or hide it with --hide)
    Publish {
        #[arg(value_name = "DRONE_ID")]
        drone_id: i64,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        note: String,
        #[arg(long)]
        hide: bool,
    },
    /// Make one of your dumps public (or private with --hide)
    ShareDump {
        #[arg(value_name = "DUMP_ID")]
        dump_id: i64,
        #[arg(long)]
        hide: bool,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the backend base URL
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config commands must work even when the config file is broken.
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(url),
        };
    }

    let config = config::Config::load().context("load config")?;
    let ctx = Context::open(&config)?;

    match cli.command {
        Commands::Login { account } => {
            commands::auth::login(&ctx, &account.email, &account.password).await
        }
        Commands::Register { account } => {
            commands::auth::register(&ctx, &account.email, &account.password).await
        }
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx).await,

        Commands::Drones { command } => match command {
            DroneCommands::List { query } => commands::drones::list(&ctx, &query).await,
            DroneCommands::Show { id } => commands::drones::show(&ctx, id).await,
            DroneCommands::Create { name, fields } => {
                commands::drones::create(&ctx, &name, &fields).await
            }
            DroneCommands::Update { id, name, fields } => {
                commands::drones::update(&ctx, id, name.as_deref(), &fields).await
            }
            DroneCommands::Delete { id, confirm } => {
                commands::drones::delete(&ctx, id, &confirm).await
            }
            DroneCommands::Dumps { id } => commands::drones::dumps(&ctx, id).await,
            DroneCommands::Upload { id, file } => commands::drones::upload(&ctx, id, &file).await,
            DroneCommands::Parse {
                drone_id,
                dump_id,
                profile,
            } => commands::drones::parse(&ctx, drone_id, dump_id, profile.as_deref()).await,
        },

        Commands::Community { command } => match command {
            CommunityCommands::Drones { query } => commands::community::drones(&ctx, &query).await,
            CommunityCommands::Dumps { query } => commands::community::dumps(&ctx, &query).await,
            CommunityCommands::Publish {
                drone_id,
                title,
                note,
                hide,
            } => commands::community::publish(&ctx, drone_id, &title, &note, !hide).await,
            CommunityCommands::ShareDump { dump_id, hide } => {
                commands::community::share_dump(&ctx, dump_id, !hide).await
            }
        },

        Commands::Lang { code } => commands::lang::run(&ctx, code.as_deref()),

        // Handled before the session is opened.
        Commands::Config { .. } => Ok(()),
    }
}
