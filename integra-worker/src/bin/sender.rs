//! One-shot operator CLI: publishes a message to the work queue.
//!
//! ```bash
//! integra-sender --kind promocao
//! integra-sender --kind produto
//! integra-sender --body '{"type_message":"mover"}'
//! ```

use clap::Parser;
use serde_json::json;

use integra_shared::config::SenderConfig;
use integra_shared::constants::WORK_QUEUE;
use integra_shared::logging;
use integra_shared::messaging::BrokerClient;

#[derive(Parser, Debug)]
#[command(name = "integra-sender", about = "Publish a message to the integration queue")]
struct Args {
    /// Message kind: promocao, produto, promocao_normalizacao or mover
    #[arg(long, default_value = "promocao")]
    kind: String,

    /// Raw message body; overrides --kind when set
    #[arg(long)]
    body: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let args = Args::parse();
    let config = SenderConfig::from_env()?;

    let body = match args.body {
        Some(body) => body,
        None => sample_body(&args.kind)?,
    };

    let broker = BrokerClient::new(config.broker_url);
    broker.publish(WORK_QUEUE, body.as_bytes()).await?;

    println!("message sent to queue '{WORK_QUEUE}':\n{body}");
    Ok(())
}

fn sample_body(kind: &str) -> anyhow::Result<String> {
    let body = match kind {
        "promocao" => "promocao".to_string(),
        "produto" => "produto".to_string(),
        "promocao_normalizacao" => json!({
            "type_message": "promocao_normalizacao",
        })
        .to_string(),
        "mover" | "productNetworkMain" | "product_network_main" => "mover".to_string(),
        other => anyhow::bail!("unknown message kind: {other}"),
    };
    Ok(body)
}
