//! A terminal assistant that answers questions with the DeepSeek API.
//!
//! Pass a question as arguments for a one-shot answer, or run without
//! arguments to ask questions line by line. `--models` and `--balance`
//! print account information instead.

#[macro_use]
extern crate tracing;

use std::env;
use std::fmt::Display;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use seekloop::core::ModelTier;
use seekloop::deepseek::{API_KEY_ENV, DeepSeekClient, DeepSeekConfig};
use seekloop::tools::WeatherTool;
use seekloop::{DEFAULT_MODEL, Session, SessionBuilder};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

const MODEL_ENV: &str = "DEEPSEEK_MODEL";

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(config) = DeepSeekConfig::from_env() else {
        eprintln!("{API_KEY_ENV} environment variable is not set");
        return;
    };
    let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
    let client = DeepSeekClient::new(config);

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--models") => {
            list_models(&client).await;
            return;
        }
        Some("--balance") => {
            show_balance(&client).await;
            return;
        }
        _ => {}
    }

    let mut builder = SessionBuilder::with_transport(client).with_system_prompt(
        include_str!("./system_prompt.md").replace("{{HOST_OS}}", host_os()),
    );
    if ModelTier::of(&model).supports_tools() {
        builder = builder.with_tool(WeatherTool::new());
    } else {
        info!("model `{model}` does not support tools, asking without them");
    }
    let session = builder.with_model(model).build();

    if !args.is_empty() {
        ask(&session, &args.join(" ")).await;
        return;
    }

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        ask(&session, question).await;
    }
}

async fn ask(session: &Session, question: &str) {
    let progress_bar = ProgressBar::new_spinner();
    match ProgressStyle::with_template("{spinner} {wide_msg}") {
        Ok(style) => {
            progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        }
        Err(err) => warn!("invalid progress template: {err}"),
    }
    progress_bar.set_message("🤔 Thinking...");

    let answer = session.ask(question);
    tokio::pin!(answer);
    let result = loop {
        progress_bar.inc(1);
        select! {
            result = &mut answer => break result,
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };

    // Finish the progress bar before printing anything else.
    progress_bar.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), answer.bright_white());
        }
        Err(err) => print_error(err),
    }
}

async fn list_models(client: &DeepSeekClient) {
    match client.list_models().await {
        Ok(list) => {
            for model in list.data {
                println!(
                    "{}{} {}",
                    BAR_CHAR.bright_cyan(),
                    model.id.bright_white().bold(),
                    format!("({})", model.owned_by).dimmed()
                );
            }
        }
        Err(err) => print_error(err),
    }
}

async fn show_balance(client: &DeepSeekClient) {
    match client.user_balance().await {
        Ok(balance) => {
            let bar = if balance.is_available {
                BAR_CHAR.bright_green().to_string()
            } else {
                BAR_CHAR.bright_yellow().to_string()
            };
            if balance.balance_infos.is_empty() {
                println!("{bar}No balance information");
            }
            for info in balance.balance_infos {
                println!(
                    "{bar}{} {} {}",
                    info.total_balance.bright_white().bold(),
                    info.currency,
                    format!(
                        "(granted {}, topped up {})",
                        info.granted_balance, info.topped_up_balance
                    )
                    .dimmed()
                );
            }
        }
        Err(err) => print_error(err),
    }
}

fn print_error(err: impl Display) {
    eprintln!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_red());
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[inline]
fn host_os() -> &'static str {
    let os = std::env::consts::OS;
    match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}
