//! Interactive terminal front end for triaging a remote photo folder.
//!
//! Keeps are local and instant. Deletes are issued optimistically: the
//! quarantine move runs as a background task and its outcome is delivered
//! back to the engine through a channel, so the prompt never waits on the
//! network.

mod config;
mod error;
mod remote;
mod store;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::remote::{DavConfig, DavRemote};
use crate::store::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use triage_session::{
    DeleteTicket, EngineState, KeyValueStore, QuarantineRecord, RemoteError, RemoteMutations,
    StartOutcome, TriageEngine,
};

type Completion = (DeleteTicket, Result<QuarantineRecord, RemoteError>);

struct CliArgs {
    folder: String,
    config_path: PathBuf,
    fresh: bool,
}

fn parse_args() -> Result<CliArgs, AppError> {
    let mut folder = None;
    let mut config_path = PathBuf::from("photo-triage.toml");
    let mut fresh = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| AppError::Config("--config needs a path".to_string()))?;
                config_path = PathBuf::from(path);
            }
            "--fresh" => fresh = true,
            other if folder.is_none() && !other.starts_with('-') => {
                folder = Some(other.to_string());
            }
            other => {
                return Err(AppError::Config(format!("unexpected argument: {}", other)));
            }
        }
    }

    let folder = folder.ok_or_else(|| {
        AppError::Config("usage: photo-triage [--config <file>] [--fresh] <remote-folder>".to_string())
    })?;
    Ok(CliArgs {
        folder,
        config_path,
        fresh,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = parse_args()?;
    let config = AppConfig::load(&args.config_path)?;

    let store = SqliteStore::open(&config.database_path)?;
    let mut engine = TriageEngine::new(config.triage_config(), store);
    let remote = Arc::new(DavRemote::new(DavConfig {
        server_url: config.server_url.clone(),
        username: config.username.clone(),
        app_password: config.app_password.clone(),
        quarantine_dir: config.quarantine_dir.clone(),
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !args.fresh {
        if let Some(info) = engine.resumable(&args.folder) {
            println!(
                "Found an interrupted session at photo {} of {}. Resume? [y/N]",
                info.index + 1,
                info.total
            );
            if let Some(answer) = lines.next_line().await? {
                if answer.trim().eq_ignore_ascii_case("y") {
                    engine.resume(&args.folder)?;
                }
            }
        }
    }

    if engine.state() == EngineState::Idle {
        println!("Listing photos in {} ...", args.folder);
        let entries = remote.list_photos(&args.folder).await?;
        match engine.start(&args.folder, entries, args.fresh) {
            StartOutcome::Started { total, truncation } => match truncation {
                Some(t) => println!("Reviewing {} of {} photos (queue capped).", t.capped, t.total),
                None => println!("{} photos to review.", total),
            },
            StartOutcome::NothingToReview(reason) => {
                println!("{}", reason);
                return Ok(());
            }
        }
    }

    review_loop(&mut engine, &remote, &mut lines).await?;

    if let Some(counts) = engine.counts() {
        println!(
            "Session: {} reviewed, {} kept, {} deleted, {} remaining.",
            counts.reviewed, counts.kept, counts.deleted, counts.remaining
        );
    }
    Ok(())
}

async fn review_loop<S: KeyValueStore>(
    engine: &mut TriageEngine<S>,
    remote: &Arc<DavRemote>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut pending = 0usize;
    let mut failed: Vec<DeleteTicket> = Vec::new();

    print_current(engine);
    loop {
        if engine.state() == EngineState::Complete && pending == 0 {
            break;
        }
        tokio::select! {
            Some((ticket, result)) = rx.recv() => {
                pending -= 1;
                apply_completion(engine, &mut failed, ticket, result);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "k" => {
                        if let Err(e) = engine.keep() {
                            println!("{}", e);
                        }
                    }
                    "d" => match engine.delete() {
                        Ok(ticket) => {
                            pending += 1;
                            spawn_quarantine(remote.clone(), ticket, tx.clone());
                        }
                        Err(e) => println!("{}", e),
                    },
                    "u" => match engine.undo(remote.as_ref()).await {
                        Ok(entry) => println!("Restored {}, it is up next.", entry.path),
                        Err(e) => println!("Undo failed: {}", e),
                    },
                    "r" => {
                        if failed.is_empty() {
                            println!("No failed deletes to retry.");
                        }
                        for ticket in failed.drain(..) {
                            pending += 1;
                            spawn_quarantine(remote.clone(), ticket, tx.clone());
                        }
                    }
                    "s" => {
                        if let Some(c) = engine.counts() {
                            println!(
                                "{} of {} reviewed ({} kept, {} deleted), {} delete(s) in flight",
                                c.reviewed, c.total, c.kept, c.deleted, pending
                            );
                        }
                    }
                    "q" => break,
                    "" => {}
                    _ => println!("commands: k=keep d=delete u=undo r=retry s=status q=quit"),
                }
                print_current(engine);
            }
        }
    }

    // Quarantine calls are never cancelled; collect what is still in flight
    // so failures are reported before exit.
    while pending > 0 {
        match rx.recv().await {
            Some((ticket, result)) => {
                pending -= 1;
                apply_completion(engine, &mut failed, ticket, result);
            }
            None => break,
        }
    }
    for ticket in &failed {
        println!("Not quarantined (kept remotely): {}", ticket.path);
    }
    Ok(())
}

fn spawn_quarantine(
    remote: Arc<DavRemote>,
    ticket: DeleteTicket,
    tx: mpsc::UnboundedSender<Completion>,
) {
    tokio::spawn(async move {
        let result = remote.quarantine(&ticket.path, &ticket.session_id).await;
        let _ = tx.send((ticket, result));
    });
}

fn apply_completion<S: KeyValueStore>(
    engine: &mut TriageEngine<S>,
    failed: &mut Vec<DeleteTicket>,
    ticket: DeleteTicket,
    result: Result<QuarantineRecord, RemoteError>,
) {
    match result {
        Ok(record) => {
            engine.quarantine_confirmed(ticket, record);
        }
        Err(e) => {
            println!("Delete failed: {} (press r to retry)", e);
            let ticket = engine.quarantine_failed(ticket);
            failed.push(ticket);
        }
    }
}

fn print_current<S: KeyValueStore>(engine: &TriageEngine<S>) {
    match engine.state() {
        EngineState::Active => {
            if let (Some(entry), Some(counts)) = (engine.current(), engine.counts()) {
                println!(
                    "[{}/{}] {} ({} kB)  k/d/u/s/q?",
                    counts.reviewed + 1,
                    counts.total,
                    entry.path,
                    entry.size / 1024
                );
            }
        }
        EngineState::Complete => println!("All photos reviewed."),
        EngineState::Idle => {}
    }
}
