use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the clinic gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gate status
    Status,
    /// Show the active locale, access and exclusion settings
    Config,
    /// Inspect the path classification cache
    Cache,
    /// Show what the gate would do with a request
    Resolve {
        #[arg(long)]
        path: String,
        #[arg(long)]
        query: Option<String>,
        /// Value of the language cookie
        #[arg(long)]
        cookie: Option<String>,
        /// Pretend a session cookie is present
        #[arg(long)]
        session: bool,
        #[arg(long)]
        accept_language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Config => client.get(format!("{}/admin/config", cli.url)),
        Commands::Cache => client.get(format!("{}/admin/cache", cli.url)),
        Commands::Resolve {
            path,
            query,
            cookie,
            session,
            accept_language,
        } => client
            .post(format!("{}/admin/resolve", cli.url))
            .json(&json!({
                "path": path,
                "query": query,
                "language_cookie": cookie,
                "session": session,
                "accept_language": accept_language,
            })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
