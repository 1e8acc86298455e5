//! Interactive terminal chat against a running relay server.

use std::env;
use std::io::{self, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_relay::styles::DEFAULT_STYLE;
use chat_relay::{ChatClient, ChatSession, DEFAULT_MODEL};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = env::var("RELAY_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let model = env::var("MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let style = env::var("RESPONSE_STYLE").unwrap_or_else(|_| DEFAULT_STYLE.to_string());

    let client = ChatClient::new(base_url)?;
    let mut session = ChatSession::default();

    println!("Connected. Type a message, or /quit to exit.");
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        if session.excluded_count() > 0 {
            println!(
                "({} earlier messages are no longer in model memory)",
                session.excluded_count()
            );
        }

        print!("bot> ");
        io::stdout().flush()?;

        // The renderer receives the full accumulated text; print only the
        // suffix we have not shown yet.
        let mut printed = 0usize;
        let outcome = session
            .send(&client, &model, &style, text, |full| {
                print!("{}", &full[printed..]);
                printed = full.len();
                let _ = io::stdout().flush();
            })
            .await;

        match outcome {
            Ok(_) => println!(),
            Err(err) => println!("\n{}", err.user_message()),
        }
    }

    Ok(())
}
