//! Mambini CLI - developer tool for the storefront core.
//!
//! # Usage
//!
//! ```bash
//! # Inspect and edit the locally persisted cart
//! mambini cart show
//! mambini cart add 64f1c0ffee --size M --color black --quantity 2
//! mambini cart update 64f1c0ffee --size M --color black --delta -1
//! mambini cart clear
//!
//! # Browse the catalogue
//! mambini products list --query linen
//! mambini products show 64f1c0ffee
//!
//! # Orders (requires MAMBINI_API_TOKEN)
//! mambini orders list
//! mambini orders set-status 650a0b1c shipped
//!
//! # Reconcile a payment
//! mambini payments status pi_3Nx...
//! ```
//!
//! There is no checkout command: payment confirmation needs the card
//! processor's UI.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use mambini_core::OrderStatus;
use mambini_storefront::config::StorefrontConfig;
use mambini_storefront::{AppState, Result};

mod commands;

#[derive(Parser)]
#[command(name = "mambini")]
#[command(author, version, about = "Mambini storefront developer tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse the product catalogue
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// List and manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Look up payment intents
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },
}

/// Identifies one cart line.
#[derive(clap::Args)]
struct LineArgs {
    /// Product ID
    product_id: String,

    /// Size label
    #[arg(short, long)]
    size: String,

    /// Color, if the line has one
    #[arg(short, long)]
    color: Option<String>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add a product to the cart
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Change a line's quantity by a signed delta
    Update {
        #[command(flatten)]
        line: LineArgs,

        /// Amount to add (negative to subtract)
        #[arg(short, long, allow_hyphen_values = true)]
        delta: i64,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, optionally filtered by a search term
    List {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List the current user's orders
    List,
    /// List every order (admin)
    All,
    /// Show one order
    Show { id: String },
    /// Set an order's status (admin)
    SetStatus {
        id: String,

        /// One of pending, processing, shipped, delivered, cancelled
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum PaymentAction {
    /// Show a payment intent's current status
    Status { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Configuration error: {e}");
            std::process::exit(2);
        }
    };
    let _sentry_guard = mambini_storefront::telemetry::init(&config);

    match run(cli, config).await {
        Ok(output) => {
            let _ = writeln!(std::io::stdout().lock(), "{output}");
        }
        Err(e) => {
            let sentry_event_id = e.report();
            tracing::error!(error = %e, ?sentry_event_id, "Command failed");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<String> {
    let state = AppState::new(config)?;

    let output = match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add { line, quantity } => {
                commands::cart::add(&state, &line.product_id, &line.size, line.color.as_deref(), quantity)
                    .await?
            }
            CartAction::Remove { line } => {
                commands::cart::remove(&state, line.product_id, line.size, line.color)?
            }
            CartAction::Update { line, delta } => {
                commands::cart::update(&state, line.product_id, line.size, line.color, delta)?
            }
            CartAction::Clear => commands::cart::clear(&state)?,
        },
        Commands::Products { action } => match action {
            ProductAction::List { query } => {
                commands::products::list(&state, query.as_deref()).await?
            }
            ProductAction::Show { id } => commands::products::show(&state, &id.into()).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(&state).await?,
            OrderAction::All => commands::orders::list_all(&state).await?,
            OrderAction::Show { id } => commands::orders::show(&state, &id.into()).await?,
            OrderAction::SetStatus { id, status } => {
                commands::orders::set_status(&state, &id.into(), status).await?
            }
        },
        Commands::Payments { action } => match action {
            PaymentAction::Status { id } => commands::payments::status(&state, &id.into()).await?,
        },
    };
    Ok(output)
}
