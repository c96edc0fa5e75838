use clap::{Parser, Subcommand};
use reqwest::header::LOCATION;
use reqwest::redirect;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "snippets-cli")]
#[command(about = "Command line client for the Smart Snippets resources", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every entity of a resource (snippets, categories, roles, users)
    List { resource: String },
    /// Show one entity
    Get { resource: String, id: i64 },
    /// Create an entity from a JSON document
    Create { resource: String, json: String },
    /// Replace an entity; the JSON must carry the current Version
    Update { resource: String, id: i64, json: String },
    /// Delete an entity
    Delete { resource: String, id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()?;
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::List { resource } => {
            let res = client.get(format!("{}/{}", base, resource)).send().await?;
            print_response(res).await?;
        }
        Commands::Get { resource, id } => {
            let res = client.get(format!("{}/{}/{}", base, resource, id)).send().await?;
            print_response(res).await?;
        }
        Commands::Create { resource, json } => {
            let body: Value = serde_json::from_str(&json)?;
            let res = client.post(format!("{}/{}", base, resource)).json(&body).send().await?;
            let location = res
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            match location {
                Some(location) if res.status().is_redirection() => println!("created {}", location),
                _ => print_response(res).await?,
            }
        }
        Commands::Update { resource, id, json } => {
            let body: Value = serde_json::from_str(&json)?;
            let res = client
                .put(format!("{}/{}/{}", base, resource, id))
                .json(&body)
                .send()
                .await?;
            print_status(res).await?;
        }
        Commands::Delete { resource, id } => {
            let res = client.delete(format!("{}/{}/{}", base, resource, id)).send().await?;
            print_status(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_status(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        println!("ok");
    } else {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", res.text().await?);
    }
    Ok(())
}
