use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "user-cli")]
#[command(about = "Command-line client for the user service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "USER_SERVICE_URL", default_value = "http://localhost:4000")]
    url: String,

    /// Bearer token for authenticated commands
    #[arg(short, long, env = "USER_SERVICE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness and version
    Health,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Exchange credentials for a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the authenticated account
    Me,
    /// Change fields of an account; omitted fields are left as they are
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Dump process metrics
    Vars,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = |method: Method, path: &str| {
        let builder = client.request(method, format!("{base}{path}"));
        match &cli.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    };

    let res = match cli.command {
        Commands::Health => request(Method::GET, "/service/users/health").send().await?,
        Commands::Register {
            ref email,
            ref password,
            ref first_name,
            ref last_name,
        } => {
            let body = json!({
                "email": email,
                "password": password,
                "first_name": first_name,
                "last_name": last_name,
            });
            request(Method::POST, "/service/users").json(&body).send().await?
        }
        Commands::Login { ref email, ref password } => {
            let body = json!({ "email": email, "password": password });
            request(Method::POST, "/service/users/authentication")
                .json(&body)
                .send()
                .await?
        }
        Commands::Me => request(Method::GET, "/service/users/me").send().await?,
        Commands::Update {
            ref id,
            ref email,
            ref password,
            ref first_name,
            ref last_name,
        } => {
            let mut body = Map::new();
            for (key, value) in [
                ("email", email),
                ("password", password),
                ("first_name", first_name),
                ("last_name", last_name),
            ] {
                if let Some(value) = value {
                    body.insert(key.to_string(), Value::String(value.clone()));
                }
            }
            request(Method::PATCH, &format!("/service/users/{id}"))
                .json(&body)
                .send()
                .await?
        }
        Commands::Vars => request(Method::GET, "/debug/vars").send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
