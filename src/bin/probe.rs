use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "probe")]
#[command(about = "Command-line client for the enhanced sample app", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Correlation id to send as X-Correlation-ID.
    #[arg(short, long)]
    correlation_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service information
    Info,
    /// Health check
    Health,
    /// List users, or fetch one
    Users { id: Option<i64> },
    /// List orders, optionally for one user
    Orders {
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Create an order
    CreateOrder {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        product: String,
        #[arg(long)]
        amount: f64,
    },
    /// Trigger the test error endpoint
    Error,
    /// Print the raw metrics scrape
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(id) = &cli.correlation_id {
        headers.insert("x-correlation-id", HeaderValue::from_str(id)?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Info => client.get(format!("{base}/info")),
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Users { id: Some(id) } => client.get(format!("{base}/users/{id}")),
        Commands::Users { id: None } => client.get(format!("{base}/users")),
        Commands::Orders { user_id } => {
            let request = client.get(format!("{base}/orders"));
            match user_id {
                Some(user_id) => request.query(&[("user_id", user_id)]),
                None => request,
            }
        }
        Commands::CreateOrder {
            user_id,
            product,
            amount,
        } => client
            .post(format!("{base}/orders"))
            .json(&json!({"user_id": user_id, "product": product, "amount": amount})),
        Commands::Error => client.get(format!("{base}/error")),
        Commands::Metrics => {
            let text = client
                .get(format!("{base}/metrics"))
                .headers(headers)
                .send()
                .await?
                .text()
                .await?;
            print!("{text}");
            return Ok(());
        }
    };

    print_response(request.headers(headers).send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let correlation_id = res
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    eprintln!("HTTP {status} (correlation id {correlation_id})");
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
