use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing as log;

use notifeed::api::{ApiClient, NotificationApi as _};
use notifeed::channel::ChannelConfig;
use notifeed::config::Config;
use notifeed::presenter::{PanelState, TerminalPresenter};
use notifeed::service::NotificationService;
use notifeed::store::NotificationStore;
use notifeed::{listing, logger};

/// Live notification feed for the HR portal.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Print the current notifications and exit.
    #[arg(long)]
    listing: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let token = config
        .token
        .clone()
        .expect("NOTIFEED_TOKEN must be set to a session token");
    let api = ApiClient::new(token.clone(), config.api_url.clone());

    if cli.listing {
        let records = api.notifications().await?;
        print!("{}", listing::render(&records));
        return Ok(());
    }

    let store = Arc::new(NotificationStore::new(Arc::new(api)));
    let presenter = Arc::new(TerminalPresenter::new());
    let mut service = NotificationService::new(store, presenter, config.app_title.clone());
    service
        .init(ChannelConfig::new(config.ws_url.clone(), Some(token)))
        .await;

    println!("commands: open | read <id> | read-all | refresh | list | quit");
    let mut panel = PanelState::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["open" | "o"] => {
                if panel.toggle() {
                    print!("{}", listing::render(&service.snapshot()));
                } else {
                    println!("panel closed");
                }
            }
            ["list"] => {
                panel.dismiss();
                print!("{}", listing::render(&service.snapshot()));
            }
            ["read", id] => {
                panel.dismiss();
                match id.parse() {
                    Ok(id) => {
                        if let Err(e) = service.mark_read(id).await {
                            log::error!("mark-read failed: {:?}", e);
                        }
                    }
                    Err(_) => println!("usage: read <id>"),
                }
            }
            ["read-all"] => {
                panel.dismiss();
                service.mark_all_read().await;
            }
            ["refresh"] => {
                panel.dismiss();
                if let Err(e) = service.refresh().await {
                    log::error!("refresh failed: {:?}", e);
                }
            }
            ["quit" | "q"] => break,
            [] => {}
            _ => println!("unknown command"),
        }
    }

    service.dispose();
    Ok(())
}
