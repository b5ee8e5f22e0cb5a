//! Stdin-driven FIX initiator.
//!
//! Reads a credentials file, keeps a session up through the persistent
//! connector, turns stdin lines into orders, and prints decoded server
//! messages. Exits 0 on a clean logout, nonzero on transport or auth
//! failure.
//!
//! ```text
//! cargo run --example console -- credentials.json
//!
//! > buy BTC-PERPETUAL 10 42000.5
//! > sell BTC-PERPETUAL 5
//! > quit
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use fixwire::connector::{FixHandler, PersistentConnector};
use fixwire::session::{DisconnectReason, InboundMessage, SessionConfig, SessionHandle};
use fixwire::types::{MsgType, OrdType, Side, UtcTimestamp, Version};
use fixwire::venues::Venue;
use fixwire::{ConsoleConfig, FieldRegistry, FieldValue, FixMessage};

enum Command {
    Order(FixMessage),
    Quit,
}

struct ConsoleApp {
    registry: Arc<FieldRegistry>,
    commands: Arc<Mutex<mpsc::UnboundedReceiver<Command>>>,
}

#[async_trait]
impl FixHandler for ConsoleApp {
    async fn on_session_active(&mut self, session: &SessionHandle) {
        println!("# session active");
        let sender = session.sender();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let mut rx = commands.lock().await;
            while let Some(cmd) = rx.recv().await {
                let result = match cmd {
                    Command::Order(msg) => sender.send(msg).await,
                    Command::Quit => {
                        let _ = sender.logout().await;
                        break;
                    }
                };
                if result.is_err() {
                    break;
                }
            }
        });
    }

    async fn on_message(&mut self, _session: &SessionHandle, msg: InboundMessage) {
        let dup = if msg.possible_duplicate { " (possdup)" } else { "" };
        println!("< seq {} {}{dup}", msg.seq, msg.message.msg_type);
        for field in msg.message.fields() {
            println!("    {}", self.registry.render(field));
        }
    }

    async fn on_disconnect(&mut self, reason: DisconnectReason) {
        eprintln!("# disconnected: {reason:?}");
    }
}

fn parse_order(line: &str) -> Option<FixMessage> {
    let mut words = line.split_whitespace();
    let side = match words.next()? {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        _ => return None,
    };
    let symbol = words.next()?;
    let qty: f64 = words.next()?.parse().ok()?;
    let price: Option<f64> = words.next().map(|w| w.parse().ok()).unwrap_or(None);

    let mut msg = FixMessage::new(MsgType::NewOrderSingle);
    msg.push_field(11, FieldValue::Str(Uuid::new_v4().to_string()))
        .push_field(55, FieldValue::Str(symbol.to_string()))
        .push_field(54, FieldValue::Side(side))
        .push_field(38, FieldValue::Float(qty))
        .push_field(
            40,
            FieldValue::OrdType(if price.is_some() {
                OrdType::Limit
            } else {
                OrdType::Market
            }),
        );
    if let Some(px) = price {
        msg.push_field(44, FieldValue::Float(px));
    }
    msg.push_field(60, FieldValue::Timestamp(UtcTimestamp::now()));
    Some(msg)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: console <credentials.json>");
            return ExitCode::from(2);
        }
    };
    let config = match ConsoleConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config: {err}");
            return ExitCode::from(2);
        }
    };

    let venue = match &config.venue {
        Some(name) => match Venue::parse(name) {
            Ok(venue) => Some(venue),
            Err(err) => {
                eprintln!("config: {err}");
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let mut builder = FieldRegistry::builder().with_fix44_fields();
    if let Some(venue) = venue {
        if let Err(err) = venue.register_fields(&mut builder) {
            eprintln!("registry: {err}");
            return ExitCode::from(2);
        }
    }
    let registry = match builder.build() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("registry: {err}");
            return ExitCode::from(2);
        }
    };

    let logon_fields = match venue {
        Some(venue) => match venue.logon_fields(
            &config.credentials,
            UtcTimestamp::now(),
            &config.sender_comp_id,
            &config.target_comp_id,
        ) {
            Ok(fields) => fields,
            Err(err) => {
                eprintln!("logon signing: {err}");
                return ExitCode::from(2);
            }
        },
        None => Vec::new(),
    };

    let begin_string = match config.begin_string.as_deref() {
        Some(s) => match Version::parse(s) {
            Ok(version) => version,
            Err(err) => {
                eprintln!("config: {err}");
                return ExitCode::from(2);
            }
        },
        None => Version::FIX44,
    };

    let session_config = match SessionConfig::builder()
        .sender_comp_id(&config.sender_comp_id)
        .target_comp_id(&config.target_comp_id)
        .begin_string(begin_string)
        .heartbeat_interval(Duration::from_secs(config.heartbeat_secs.unwrap_or(30)))
        .logon_fields(logon_fields)
        .build()
    {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config: {err}");
            return ExitCode::from(2);
        }
    };

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let mut app = ConsoleApp {
        registry: registry.clone(),
        commands: Arc::new(Mutex::new(cmd_rx)),
    };

    let connector = PersistentConnector::new(config.endpoint.clone(), session_config, registry);
    let connector_task = tokio::spawn(async move { connector.run(&mut app).await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            let _ = cmd_tx.send(Command::Quit);
            break;
        }
        match parse_order(&line) {
            Some(order) => {
                let _ = cmd_tx.send(Command::Order(order));
            }
            None => eprintln!("# unrecognized command: {line}"),
        }
    }

    match connector_task.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            eprintln!("session: {err}");
            ExitCode::FAILURE
        }
        Err(_) => ExitCode::FAILURE,
    }
}
