use streamchat::adapters::ReqwestHttpClient;
use streamchat::cli::{self, parse_args, CliCommand, USAGE};
use streamchat::client::{ChatApi, StreamMessage, StreamOutcome};
use streamchat::config::ClientConfig;
use streamchat::models::{ChatDetail, MessageSendReq};
use streamchat::session::ChatSession;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "STREAMCHAT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let (chat_id, content) = match parse_args(std::env::args()) {
        CliCommand::Version => {
            cli::print_version();
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(reason) => {
            eprintln!("streamchat: {}\n{}", reason, USAGE);
            std::process::exit(2);
        }
        CliCommand::Send { chat_id, content } => (chat_id, content),
    };

    color_eyre::install()?;
    init_tracing();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(send(chat_id, content))
}

async fn send(chat_id: i64, content: String) -> Result<()> {
    let config = ClientConfig::from_env();
    let http = ReqwestHttpClient::from_config(&config)?;
    let api = ChatApi::new(Arc::new(http), config);
    let mut session = ChatSession::new(api);

    if let Err(e) = session.load_chat(chat_id).await {
        tracing::warn!("Could not load chat {}: {}", chat_id, e);
        session.select_chat(ChatDetail::empty(chat_id));
    }

    let active = session.send_message(MessageSendReq::new(content))?;

    let cancel = active.handle.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let outcome = session
        .drive_with(active, |message, _| {
            if let StreamMessage::Delta(text) = message {
                let _ = write!(stdout, "{}", text);
                let _ = stdout.flush();
            }
        })
        .await;
    interrupt.abort();
    println!();

    match outcome {
        StreamOutcome::Completed(Some(usage)) => {
            eprintln!(
                "[tokens: {} in / {} out]",
                usage.input_tokens, usage.output_tokens
            );
            Ok(())
        }
        StreamOutcome::Completed(None) | StreamOutcome::Cancelled => Ok(()),
        StreamOutcome::Ended => {
            eprintln!("streamchat: reply ended before completion");
            Ok(())
        }
        StreamOutcome::Failed(error) => Err(eyre!("{}", error)),
    }
}
