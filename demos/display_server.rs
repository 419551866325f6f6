//! Demo race display server
//!
//! Run with: cargo run --example display_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example display_server                    # binds to 127.0.0.1:61611
//!   cargo run --example display_server 0.0.0.0:61611
//!
//! Starts the timing listener in pre-race mode with a tiny demo roster and
//! prints every live-stream frame as a server-sent event. Point a timing
//! appliance (or `nc`) at the port and paste data lines like:
//!
//!   CT01_33~1~start~9478~14:02:15.31~0~0F2A38~1
//!
//! Unknown bibs are auto-provisioned, so any bib shows something.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use racedisplay::{
    DirectoryMode, ParticipantRecord, RaceDisplayService, ServerConfig, StreamFrame, TimingServer,
};

fn demo_roster() -> HashMap<String, ParticipantRecord> {
    let mut jane = ParticipantRecord::named("Jane", "Doe");
    jane.age = "34".into();
    jane.gender = "F".into();
    jane.city = "Austin".into();
    jane.state = "TX".into();
    jane.division = "Women 30-39".into();
    jane.reg_choice = "Marathon".into();

    let mut marco = ParticipantRecord::named("Marco", "Rossi");
    marco.age = "41".into();
    marco.gender = "M".into();
    marco.city = "Houston".into();
    marco.state = "TX".into();
    marco.division = "Men 40-49".into();
    marco.reg_choice = "Half Marathon".into();

    HashMap::from([("1234".to_owned(), jane), ("9478".to_owned(), marco)])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("racedisplay=debug".parse()?),
        )
        .init();

    let bind_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:61611".to_owned())
        .parse()?;

    let config = ServerConfig::with_addr(bind_addr);
    let service = RaceDisplayService::new(&config);
    service.directory().set_mode(DirectoryMode::PreRace);
    service.directory().set_race_name("Demo City Marathon").await;
    service
        .directory()
        .replace_all(DirectoryMode::PreRace, demo_roster())
        .await;

    let server = Arc::new(TimingServer::new(config, Arc::clone(&service)));
    server.start();

    let addr = server.wait_bound().await.expect("listener failed to bind");
    println!("Timing listener on {}", addr);
    println!("Feed lines like: CT01_33~1~start~9478~14:02:15.31~0~0F2A38~1");
    println!();

    // Print the live stream the way an SSE endpoint would serve it
    let mut subscriber = service.live().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            let frame = subscriber.next_frame().await;
            if let StreamFrame::Event(_) = frame {
                print!("{}", frame.to_sse());
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");
    server.shutdown();
    printer.abort();

    Ok(())
}
