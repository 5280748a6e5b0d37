use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gramkit::config::{Config, LogFormat};
use gramkit::credentials::EnvOrPrompt;
use gramkit::giveaway::{self, GiveawayOptions, GiveawayResult};
use gramkit::insights::{self, AccountPerformance, InsightsOptions};
use gramkit::platform::http::HttpPlatform;
use gramkit::session::LoginOptions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gramkit")]
#[command(about = "Pick giveaway winners and measure account engagement", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: <config dir>/gramkit/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct LoginArgs {
    /// Account to log in as
    #[arg(short, long)]
    username: String,

    /// The account does not use two-factor authentication
    #[arg(long)]
    no_two_factor: bool,

    /// Log in again even if the session is still valid
    #[arg(long)]
    refresh_login: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a winner among followers who liked a post
    Giveaway {
        #[command(flatten)]
        login: LoginArgs,

        /// Post URL, e.g. https://www.instagram.com/p/<code>/
        #[arg(long)]
        post_url: String,

        /// Maximum number of direct-message threads scanned for story mentions
        #[arg(long)]
        thread_limit: Option<usize>,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Average engagement over recent posts
    Insights {
        #[command(flatten)]
        login: LoginArgs,

        /// Number of recent posts to analyse
        #[arg(long)]
        num_posts: Option<usize>,

        /// Share of comments assumed to be the owner's own replies (0-1)
        #[arg(long)]
        comment_pct: Option<f64>,
    },
}

impl LoginArgs {
    fn options(&self, config: &Config) -> LoginOptions {
        LoginOptions {
            two_factor: config.login.two_factor && !self.no_two_factor,
            refresh: self.refresh_login,
        }
    }
}

fn init_tracing(config: &Config, verbose: bool) {
    let default_filter = if verbose {
        "gramkit=debug".to_string()
    } else {
        config.logging.filter.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout carries only the result
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_giveaway(result: &GiveawayResult) {
    println!("Followers:   {}", result.followers.len());
    println!("Likers:      {}", result.likers.len());
    println!("Commenters:  {}", result.commenters.len());
    println!("Mentioners:  {}", result.mentioners.len());
    println!("Entries:     {}", result.entries.len());
    println!();
    println!("Winner: @{}", result.winner);
}

fn print_performance(performance: &AccountPerformance) {
    println!(
        "Posts analysed:        {} of {}",
        performance.posts_with_insights, performance.posts
    );
    println!("Followers:             {}", performance.current_follower_count);
    println!("Engagement rate:       {:.2}%", performance.engagement * 100.0);
    println!("Reach per post:        {:.1}", performance.per_post_reach);
    println!("Impressions per post:  {:.1}", performance.per_post_impressions);
    println!("Shares per post:       {:.1}", performance.per_post_shares);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config, cli.verbose);

    let platform =
        HttpPlatform::new(&config.platform).context("Failed to build platform client")?;
    let mut credentials = EnvOrPrompt::new();

    match cli.command {
        Commands::Giveaway {
            login,
            post_url,
            thread_limit,
            seed,
        } => {
            let options = GiveawayOptions {
                post_url,
                thread_limit: thread_limit.unwrap_or(config.giveaway.thread_limit),
                login: login.options(&config),
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let result = giveaway::run(
                &platform,
                &login.username,
                &mut credentials,
                &options,
                &mut rng,
            )
            .await
            .context("Giveaway failed")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_giveaway(&result);
            }
        }

        Commands::Insights {
            login,
            num_posts,
            comment_pct,
        } => {
            let options = InsightsOptions {
                num_posts: num_posts.unwrap_or(config.insights.num_posts),
                comment_pct: comment_pct.unwrap_or(config.insights.comment_pct),
                login: login.options(&config),
            };

            let performance =
                insights::run(&platform, &login.username, &mut credentials, &options)
                    .await
                    .context("Insights failed")?;

            match performance {
                Some(p) if cli.json => println!("{}", serde_json::to_string_pretty(&p)?),
                Some(p) => print_performance(&p),
                None if cli.json => println!("null"),
                None => println!("No insights available."),
            }
        }
    }

    Ok(())
}
