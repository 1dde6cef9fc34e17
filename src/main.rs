use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process;

use timetabled::config::Config;
use timetabled::directory::HttpTeacherDirectory;
use timetabled::ipc;

fn main() {
    // stdout carries the protocol; logs must stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    tracing::info!(
        api_base_url = %config.api_base_url,
        workspace = ?config.workspace,
        timeout_secs = config.request_timeout_secs,
        "timetabled starting"
    );

    let directory = match HttpTeacherDirectory::new(
        &config.api_base_url,
        config.api_token.clone(),
        config.request_timeout(),
    ) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("failed to build teacher directory client: {:#}", e);
            process::exit(1);
        }
    };

    let mut state = ipc::AppState::new(Box::new(directory));
    if let Some(path) = &config.workspace {
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            tracing::error!("failed to open workspace {}: {:#}", path.display(), e);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!("unparseable request: {}", e);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
}
