//! Wardlink: hospital staff front end core.
//!
//! Demo shell entry point: a line-oriented driver for the application
//! core wired to the bundled adapters. Rendering proper is left to the
//! embedding front end; this shell only prints the projection.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wardlink::adapters::memory::InMemoryRemoteStore;
use wardlink::adapters::sanitize::SanitizingMakeWriter;
use wardlink::adapters::sqlite::SqliteIdentityService;
use wardlink::application::{RecordClient, SessionStore};
use wardlink::ui::{App, FormMode};

type ShellApp = App<SqliteIdentityService, InMemoryRemoteStore>;

fn main() -> Result<()> {
    let _guard = init_logging()?;
    tracing::info!("Starting Wardlink...");

    let db_path =
        std::env::var("WARDLINK_DB_PATH").unwrap_or_else(|_| "wardlink.db".to_string());
    let provider = Arc::new(SqliteIdentityService::new(&db_path)?);
    let store = Arc::new(InMemoryRemoteStore::new());

    let session = Arc::new(SessionStore::new(provider));
    let records = Arc::new(RecordClient::new(store));
    let mut app = App::new(session, records);

    run_shell(&mut app)?;

    tracing::info!("Wardlink shutdown complete.");
    Ok(())
}

/// Initialize logging.
///
/// Log output is wrapped in the PII sanitizer so emails and credentials
/// never reach the sink in clear text. Destination is controlled by
/// `WARDLINK_LOG_MODE` (`stdout`, `file`, or `auto` which defaults to a
/// file so log lines do not interleave with the shell prompt).
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_mode =
        std::env::var("WARDLINK_LOG_MODE").unwrap_or_else(|_| "auto".to_string());
    let use_file = !matches!(log_mode.as_str(), "stdout");

    let (writer, guard) = if use_file {
        let log_file = std::env::var("WARDLINK_LOG_FILE")
            .unwrap_or_else(|_| "wardlink.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn run_shell(app: &mut ShellApp) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("Wardlink shell. Commands:");
    println!("  login <email> <password>");
    println!("  register <email> <password> <confirm>");
    println!("  add <id> <name> <email> <age> <disease>");
    println!("  toggle | list | status | logout | quit");

    loop {
        render(app);
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            ["quit"] | ["exit"] => break,
            ["login", email, password] => {
                // The primary control cancels while registering; leave
                // that mode first so this actually signs in.
                if app.auth_form().mode() == FormMode::Registering {
                    app.cancel_registration();
                }
                app.auth_form_mut().set_email(*email);
                app.auth_form_mut().set_password(*password);
                app.login();
                settle(app);
            }
            ["register", email, password, confirm] => {
                if app.auth_form().mode() == FormMode::Login {
                    app.register();
                }
                app.auth_form_mut().set_email(*email);
                app.auth_form_mut().set_password(*password);
                app.auth_form_mut().set_confirm(*confirm);
                app.register();
                settle(app);
            }
            ["logout"] => {
                app.logout();
                settle(app);
            }
            ["add", id, name, email, age, disease] => {
                let form = app.patient_form_mut();
                form.id = (*id).to_string();
                form.name = (*name).to_string();
                form.email = (*email).to_string();
                form.age = (*age).to_string();
                form.disease = (*disease).to_string();
                app.add_patient();
                settle(app);
            }
            ["toggle"] => {
                app.toggle_records();
                settle(app);
            }
            ["list"] => {
                app.poll();
            }
            ["status"] => {}
            [] => continue,
            other => println!("Unknown command: {}", other.join(" ")),
        }
    }

    Ok(())
}

/// Drive `poll()` until in-flight work completes and pending snapshot
/// deliveries have had a moment to arrive.
fn settle(app: &mut ShellApp) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.is_busy() && Instant::now() < deadline {
        app.poll();
        std::thread::sleep(Duration::from_millis(5));
    }

    // Subscription deliveries are pushed shortly after the triggering
    // write; give them one delivery boundary.
    let grace = Instant::now() + Duration::from_millis(100);
    while Instant::now() < grace {
        app.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn render(app: &mut ShellApp) {
    if let Some(notice) = app.take_notice() {
        println!("* {notice}");
    }

    let projection = app.projection();
    if projection.login_card_visible {
        println!("[{}]", projection.form_title);
        if let Some(hint) = projection.mismatch_hint {
            println!("  ! {hint}");
        }
    } else {
        println!("[Patient Management] ({})", projection.records_button_label);
        if projection.records_visible {
            if app.records().is_empty() {
                println!("  (no records)");
            }
            for record in app.records() {
                println!(
                    "  {} | {} | {} | {} | {}",
                    record.id, record.name, record.email, record.age, record.disease
                );
            }
        }
    }
}
