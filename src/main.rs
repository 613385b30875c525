use anyhow::Context;
use device_advisor::{AdvisorConfig, DialogueController};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn load_config() -> anyhow::Result<AdvisorConfig> {
    let config = match std::env::var("ADVISOR_CONFIG") {
        Ok(path) => AdvisorConfig::load(&path).with_context(|| format!("loading config from {}", path))?,
        Err(_) => AdvisorConfig::default(),
    };
    config.apply_env().context("applying environment overrides")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    tracing::info!(gateway = ?config.gateway.kind, top_k = config.engine.top_k, "Advisor booting...");
    let controller = DialogueController::with_defaults(config);
    let session_id = Uuid::new_v4().to_string();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"Tell me what phone you are looking for. Commands: /summary, /telemetry, /quit\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let output = match line {
            "" => String::new(),
            "/quit" | "/exit" => break,
            "/summary" => match controller.session_summary(&session_id) {
                Some(summary) => serde_json::to_string_pretty(&summary)?,
                None => "No turns yet.".to_string(),
            },
            "/telemetry" => serde_json::to_string_pretty(&controller.telemetry_snapshot())?,
            text => {
                let response = controller.handle_turn(&session_id, text).await;
                let mut out = response.message.clone();
                for (rank, item) in response.recommendations.iter().enumerate() {
                    out.push_str(&format!(
                        "\n  {}. {} ({}) ¥{:.0}  match {:.2}",
                        rank + 1,
                        item.name,
                        item.brand,
                        item.price,
                        item.match_score
                    ));
                }
                out
            }
        };
        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    tracing::info!(session = %session_id, "Advisor shutting down");
    Ok(())
}
