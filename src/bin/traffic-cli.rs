use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Method;
use serde_json::{json, Value};

const USERNAMES: [&str; 5] = ["juan_perez", "maria_garcia", "admin", "test_user", "developer"];
const BRUTE_FORCE_PASSWORDS: [&str; 6] = ["123456", "password", "admin", "qwerty", "letmein", "password123"];

#[derive(Parser)]
#[command(name = "traffic-cli")]
#[command(about = "Generate demo traffic against the event-feed API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Pause between calls, in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hit the home and health endpoints
    Health,
    /// Register users and log them in
    Users {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },
    /// Submit data processing batches
    Data {
        #[arg(short, long, default_value_t = 3)]
        count: usize,
    },
    /// Trigger system warnings and errors
    System,
    /// Rapid login attempts against one account
    BruteForce {
        #[arg(long, default_value = "admin")]
        user: String,
    },
    /// Everything above, in order
    All,
}

struct Traffic {
    client: reqwest::Client,
    url: String,
    delay: Duration,
}

impl Traffic {
    async fn call(&self, method: Method, endpoint: &str, body: Option<Value>, description: &str) {
        println!("\n{description}");
        println!("   {method} {endpoint}");

        let mut request = self.client.request(method, format!("{}{}", self.url, endpoint));
        if let Some(body) = body {
            request = request.json(&body);
        }

        match request.send().await {
            Ok(res) => {
                if let Err(e) = print_response(res).await {
                    eprintln!("   Error: {e}");
                }
            }
            Err(e) if e.is_connect() => {
                eprintln!("   Error: could not connect to {}. Is the service running?", self.url)
            }
            Err(e) => eprintln!("   Error: {e}"),
        }
    }

    async fn pause(&self, factor: f64) {
        tokio::time::sleep(self.delay.mul_f64(factor)).await;
    }

    async fn health(&self) {
        println!("\n== Health checks");
        self.call(Method::GET, "/", None, "Home endpoint").await;
        self.call(Method::GET, "/health", None, "Health check").await;
    }

    async fn users(&self, count: usize) {
        println!("\n== User activity");
        for i in 1..=count {
            let username = pick(&USERNAMES);
            self.call(
                Method::POST,
                "/api/user/register",
                Some(json!({"username": username, "email": format!("{username}@example.com")})),
                &format!("User registration #{i}"),
            )
            .await;
            self.pause(1.0).await;

            let password = if rand::thread_rng().gen_bool(0.8) {
                "password123"
            } else {
                "wrong_password"
            };
            self.call(
                Method::POST,
                "/api/user/login",
                Some(json!({"username": username, "password": password})),
                &format!("User login #{i}"),
            )
            .await;
            self.pause(1.0).await;
        }
    }

    async fn data(&self, count: usize) {
        println!("\n== Data processing");
        for i in 1..=count {
            let records: Vec<String> = (0..rand::thread_rng().gen_range(10..=100))
                .map(|j| format!("record_{j}"))
                .collect();
            let batch = json!({
                "operation": "process_batch",
                "data": records,
                "priority": pick(&["high", "medium", "low"]),
            });
            self.call(
                Method::POST,
                "/api/data/process",
                Some(batch),
                &format!("Data processing #{i}"),
            )
            .await;
            self.pause(2.0).await;
        }
    }

    async fn system(&self) {
        println!("\n== System events");
        for i in 1..=2 {
            self.call(Method::GET, "/api/system/warning", None, &format!("System warning #{i}"))
                .await;
            self.pause(1.0).await;
        }
        for i in 1..=2 {
            self.call(Method::GET, "/api/system/error", None, &format!("System error #{i}"))
                .await;
            self.pause(1.0).await;
        }
    }

    async fn brute_force(&self, user: &str) {
        println!("\n== Brute force simulation against {user}");
        for (i, password) in BRUTE_FORCE_PASSWORDS.iter().enumerate() {
            self.call(
                Method::POST,
                "/api/user/login",
                Some(json!({"username": user, "password": password})),
                &format!("Brute force attempt #{} - {user}:{password}", i + 1),
            )
            .await;
            self.pause(0.5).await;
        }
    }
}

fn pick<'a>(options: &[&'a str]) -> &'a str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or("unknown")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let traffic = Traffic {
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?,
        url: cli.url.trim_end_matches('/').to_string(),
        delay: Duration::from_millis(cli.delay_ms),
    };

    match cli.command {
        Commands::Health => traffic.health().await,
        Commands::Users { count } => traffic.users(count).await,
        Commands::Data { count } => traffic.data(count).await,
        Commands::System => traffic.system().await,
        Commands::BruteForce { user } => traffic.brute_force(&user).await,
        Commands::All => {
            traffic.health().await;
            traffic.users(5).await;
            traffic.data(3).await;
            traffic.system().await;
            traffic.brute_force("admin").await;
            println!("\nDone. Inspect logs/api_all.log, logs/api_errors.log and logs/api_security.log");
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("   Status: {}", status.as_u16());

    let is_json = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        let json: Value = res.json().await?;
        println!("   Response: {}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("   Response: {}", res.text().await?);
    }
    Ok(())
}
