//! Command line boundary for the marketplace daemon

pub mod products;
pub mod trades;
pub mod users;

use crate::cli::products::{
    execute_filter, execute_list_product, execute_product, execute_products,
    execute_user_products,
};
use crate::cli::trades::{
    execute_accept, execute_cancel, execute_propose, execute_reject, execute_trade,
    execute_trades,
};
use crate::cli::users::{execute_register, execute_reputation, read_password};
use crate::error::{CantDoReason, Result};
use crate::models::{Condition, NewProduct, User};
use crate::service::Marketplace;
use clap::{Parser, Subcommand};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "reused",
    about = "Item-for-item bartering marketplace",
    author,
    help_template = "\
{before-help}{name}

{about-with-newline}
{author-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
",
    version
)]
#[command(propagate_version = true)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    /// Set folder for the settings file - default is HOME/.reuse
    #[arg(short, long, global = true)]
    pub dirsettings: Option<String>,
    /// Email of the registered user performing the command
    #[arg(long = "as", value_name = "EMAIL", global = true)]
    pub identity: Option<String>,
    /// Password of that user, read from the terminal when omitted
    #[arg(long, global = true)]
    pub password: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Register a new user
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// Relative path of an uploaded profile picture
        #[arg(long)]
        profile_picture: Option<String>,
    },
    /// List a product of yours for trade
    ListProduct {
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// new, unmarked, marked or used
        #[arg(short, long, value_parser = parse_condition)]
        condition: Condition,
        /// Declared value
        #[arg(short, long)]
        value: i64,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        /// Comma separated categories wanted in exchange
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Photo path, may be repeated
        #[arg(long = "photo")]
        photos: Vec<String>,
    },
    /// Show available products, newest first
    Products {},
    /// Show a product and its owner's reputation
    Product {
        #[arg(short, long)]
        product_id: i64,
    },
    /// Search available products
    Filter {
        /// Case-insensitive part of the name
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        min: Option<i64>,
        #[arg(long)]
        max: Option<i64>,
    },
    /// Show every product of a user, traded ones included
    UserProducts {
        /// Defaults to your own
        #[arg(short, long)]
        user_id: Option<i64>,
    },
    /// Show a user's rounded average rating
    Reputation {
        #[arg(short, long)]
        user_id: i64,
    },
    /// Offer one of your products for someone else's
    Propose {
        /// Product you want
        #[arg(short, long)]
        product_id: Option<i64>,
        /// Product you give in exchange
        #[arg(short, long)]
        offered_product_id: Option<i64>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show all trades with both products
    Trades {},
    /// Show a single trade
    Trade {
        #[arg(short, long)]
        trade_id: i64,
    },
    /// Withdraw a pending trade you proposed
    Cancel {
        #[arg(short, long)]
        trade_id: i64,
    },
    /// Decline a pending trade for your product
    Reject {
        #[arg(short, long)]
        trade_id: i64,
    },
    /// Accept a pending trade for your product and rate the proposer
    Accept {
        #[arg(short, long)]
        trade_id: i64,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: i64,
    },
}

fn parse_condition(s: &str) -> std::result::Result<Condition, String> {
    Condition::from_str(s).map_err(|_| format!("unknown condition '{s}'"))
}

/// Resolve `--as` and `--password` to a registered user
async fn actor(cli: &Cli, market: &Marketplace) -> Result<User> {
    let Some(email) = cli.identity.as_deref() else {
        return Err(CantDoReason::Unauthorized.into());
    };
    let password = read_password(&cli.password, &format!("Password for {email}: "))?;
    market.authenticate(email, &password).await
}

/// Every command but `register` acts on behalf of an authenticated user
pub async fn run(cli: &Cli, market: &Marketplace) -> Result<()> {
    if let Commands::Register {
        name,
        email,
        profile_picture,
    } = &cli.command
    {
        let password = read_password(&cli.password, "Password: ")?;
        return execute_register(name, email, password, profile_picture, market).await;
    }

    let user = actor(cli, market).await?;
    match &cli.command {
        // handled before authentication
        Commands::Register { .. } => Ok(()),
        Commands::ListProduct {
            name,
            description,
            condition,
            value,
            city,
            state,
            tags,
            photos,
        } => {
            let listing = NewProduct {
                user_id: user.id,
                name: name.clone(),
                description: description.clone(),
                condition: Some(*condition),
                value: *value,
                city: city.clone(),
                state: state.clone(),
                tags: tags.clone(),
                photos: photos.clone(),
            };
            execute_list_product(&listing, market).await
        }
        Commands::Products {} => execute_products(market).await,
        Commands::Product { product_id } => execute_product(*product_id, market).await,
        Commands::Filter {
            name,
            city,
            state,
            min,
            max,
        } => execute_filter(name, city, state, *min, *max, market).await,
        Commands::UserProducts { user_id } => {
            execute_user_products(user_id.unwrap_or(user.id), market).await
        }
        Commands::Reputation { user_id } => execute_reputation(*user_id, market).await,
        Commands::Propose {
            product_id,
            offered_product_id,
            message,
        } => {
            execute_propose(
                &user,
                *product_id,
                *offered_product_id,
                message,
                market,
            )
            .await
        }
        Commands::Trades {} => execute_trades(market).await,
        Commands::Trade { trade_id } => execute_trade(*trade_id, market).await,
        Commands::Cancel { trade_id } => execute_cancel(&user, *trade_id, market).await,
        Commands::Reject { trade_id } => execute_reject(&user, *trade_id, market).await,
        Commands::Accept { trade_id, rating } => {
            execute_accept(&user, *trade_id, *rating, market).await
        }
    }
}
