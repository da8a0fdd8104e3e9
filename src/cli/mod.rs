// CLI interface
pub mod commands;

use crate::error::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "locsites")]
#[command(about = "Manage Sophos Central Web Control local sites", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sophos Central API client ID
    #[arg(long, global = true, env = "SOPHOS_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Sophos Central API client secret
    #[arg(long, global = true, env = "SOPHOS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify credentials and show the resolved tenant identity
    Login,

    /// List local-site entries
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Fetch a single page instead of all pages
        #[arg(long)]
        page: Option<u64>,
    },

    /// Add a local-site entry
    Add {
        /// URL pattern to match, e.g. https://www.example.com
        url: String,

        /// Tags (comma separated); mutually exclusive with --category-id
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Web-control category ID (1-57); mutually exclusive with --tags
        #[arg(long)]
        category_id: Option<i64>,

        /// Optional comment (max 300 characters)
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a local-site entry by id
    Delete {
        /// Entry id as reported by `list`
        id: String,
    },

    /// Check that the configured credentials still authenticate
    Status {
        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Run the local JSON API proxy for a browser UI
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        listen: std::net::SocketAddr,
    },

    /// Generate a shell completion script on stdout
    ///
    /// For example: eval "$(locsites completions bash)"
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub async fn execute(args: Cli) -> Result<()> {
    match args.command {
        Commands::Login => commands::login::execute(args.client_id, args.client_secret).await,
        Commands::List { format, page } => {
            commands::list::execute(args.client_id, args.client_secret, format, page).await
        }
        Commands::Add {
            url,
            tags,
            category_id,
            comment,
        } => {
            commands::add::execute(
                args.client_id,
                args.client_secret,
                url,
                tags,
                category_id,
                comment,
            )
            .await
        }
        Commands::Delete { id } => {
            commands::delete::execute(args.client_id, args.client_secret, id).await
        }
        Commands::Status { json } => {
            commands::status::execute(args.client_id, args.client_secret, json).await
        }
        Commands::Serve { listen } => {
            commands::serve::execute(args.client_id, args.client_secret, listen).await
        }
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
    }
}
