//! Fernway CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (writes the session file)
//! fernway login -e shopper@example.com -p hunter2
//!
//! # Browse a product and its sizes
//! fernway product 12
//!
//! # Manage saved addresses
//! fernway addresses list
//! fernway addresses add --address "14 Garden Row" --city Portland --zipcode 97201
//!
//! # Check out end to end
//! fernway buy 12 --size 1 --quantity 2 --method 1
//!
//! # History
//! fernway order 301
//! fernway payments list
//! ```
//!
//! # Environment Variables
//!
//! - `FERNWAY_API_BASE_URL` - Base URL of the Fernway backend (required)
//! - `FERNWAY_ENV` - `development` or `production`
//! - `FERNWAY_SESSION_FILE` - Session store location

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use fernway_storefront::config::StorefrontConfig;
use fernway_storefront::services::Services;
use fernway_storefront::session::SessionStore;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "fernway")]
#[command(author, version, about = "Fernway storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Drop the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show a product with its sizes and stock
    Product {
        /// Product id
        id: i64,
    },
    /// Manage saved shipping addresses
    Addresses {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// List the available shipping methods
    Methods,
    /// Check out a product end to end
    Buy {
        /// Product id
        product: i64,

        /// Size index on the product page (0-based)
        #[arg(short, long)]
        size: usize,

        /// Units to order
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Saved address id (defaults to the account's default address)
        #[arg(long)]
        address: Option<i64>,

        /// Shipping method id
        #[arg(long)]
        method: i64,
    },
    /// Show one order
    Order {
        /// Order id
        id: i64,
    },
    /// Payment history
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        zipcode: String,
        #[arg(long, default_value = "")]
        country: String,
    },
    /// Delete a saved address
    Remove {
        /// Address id
        id: i64,
    },
}

#[derive(Subcommand)]
enum PaymentAction {
    /// List payment history
    List,
    /// Check one payment's settlement state
    Status {
        /// Payment id
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let session = SessionStore::open(&config)?;
    let services = Services::new(&config, session)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&services, &email, &password).await
        }
        Commands::Logout => commands::account::logout(&services),
        Commands::Whoami => commands::account::whoami(&services),
        Commands::Product { id } => commands::catalog::product(&services, id).await,
        Commands::Addresses { action } => match action {
            AddressAction::List => commands::catalog::addresses(&services).await,
            AddressAction::Add {
                address,
                city,
                zipcode,
                country,
            } => commands::catalog::add_address(&services, address, city, zipcode, country).await,
            AddressAction::Remove { id } => commands::catalog::remove_address(&services, id).await,
        },
        Commands::Methods => commands::catalog::methods(&services).await,
        Commands::Buy {
            product,
            size,
            quantity,
            address,
            method,
        } => commands::checkout::buy(services, product, size, quantity, address, method).await,
        Commands::Order { id } => commands::catalog::order(&services, id).await,
        Commands::Payments { action } => match action {
            PaymentAction::List => commands::catalog::payments(&services).await,
            PaymentAction::Status { id } => commands::catalog::payment_status(&services, id).await,
        },
    }
}
