use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-proxy")]
#[command(about = "Chat proxy CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the proxy server. Upstream credentials come from ABACUS_API_KEY / ABACUS_API_URL or the config file and are read on every request.
    Serve {
        /// Config file path (default: CHAT_PROXY_CONFIG_PATH or ~/.chat-proxy/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8888)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Chat through a running proxy (interactive).
    Chat {
        /// Proxy chat endpoint.
        #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8888/chat")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chat-proxy {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { url }) => {
            if let Err(e) = run_chat(&url).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = proxy::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(b) = bind {
        config.server.bind = b;
    }
    log::info!("starting proxy on {}:{}", config.server.bind, config.server.port);
    proxy::gateway::run_gateway(config).await
}

async fn run_chat(url: &str) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let client = reqwest::Client::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        match send_message(&client, url, input).await {
            Ok(reply) => println!("< {}", reply.trim()),
            Err(e) => eprintln!("chat error: {}", e),
        }
    }

    Ok(())
}

/// POST one message to the proxy. Returns the reply text, or the proxy's error body.
async fn send_message(client: &reqwest::Client, url: &str, message: &str) -> Result<String, String> {
    let res = client
        .post(url)
        .json(&serde_json::json!({ "message": message }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = res.status();
    let text = res.text().await.map_err(|e| e.to_string())?;
    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(text);
        return Err(format!("{} {}", status.as_u16(), detail));
    }
    let payload: serde_json::Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    let mut reply = payload
        .get("reply")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    for key in ["intent", "booking_url", "product_url"] {
        if let Some(v) = payload.get(key).and_then(|v| v.as_str()) {
            reply.push_str(&format!("\n  [{}] {}", key, v));
        }
    }
    Ok(reply)
}
