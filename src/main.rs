//! Entry point for the briefcast client shell.
//!
//! Responsibilities here are intentionally minimal:
//! - Initialize logging with a runtime-reloadable level filter.
//! - Load configuration from `conf/config.toml`.
//! - Wire disk storage and the HTTP catalog into the app facade.
//! - Drive the facade from a line-oriented command shell.

use anyhow::Result;
use briefcast::app::{App, Plan, PlayerSession};
use briefcast::catalog::{Book, HttpCatalog};
use briefcast::config::{self, load_config};
use briefcast::player::SKIP_SECONDS;
use briefcast::storage::DiskStorage;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let config_path = config::config_path();
    let config = load_config(&config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        base_url = %config.catalog_base_url,
        data_dir = %config.data_dir().display(),
        level = %config.log_level,
        "Starting briefcast shell"
    );
    let storage = Arc::new(DiskStorage::new(config.data_dir()));
    let catalog = HttpCatalog::new(&config.catalog_base_url)?;
    let app = App::new(storage, Box::new(catalog));
    shell(app)
}

fn init_tracing() -> ReloadHandle {
    let env_filter =
        EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if std::env::var(config::LOG_ENV).is_ok() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

const SHELL_HELP: &str = "\
commands:
  guest                       sign in as the shared guest identity
  register <email> <pass>     create an account and sign in
  login <email> <pass>        sign in with saved credentials
  logout                      clear the session
  foryou                      spotlight pick and rails
  search <query>              author-or-title search
  book <id>                   book detail
  save <id>                   add a book to the library
  unsave <id>                 remove a book from the library
  unfinish <id>               remove a book from the finished shelf
  library                     saved and finished shelves
  player <id>                 open the player for a book
  play | pause                transport controls
  seek <seconds>              jump to a position
  fwd | back                  skip ten seconds either way
  end                         let the audio reach its natural end
  status                      transport snapshot
  settings                    account summary
  pricing                     plan state
  subscribe <monthly|yearly>  upgrade the account
  quit";

fn shell(app: App) -> Result<()> {
    println!("briefcast shell; type 'help' for commands");
    let stdin = io::stdin();
    let mut player: Option<PlayerSession> = None;
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "" => {}
            "help" => println!("{SHELL_HELP}"),
            "quit" | "exit" => break,
            "guest" => {
                let user = app.session().login_as_guest();
                println!("signed in as {}", user.display_name);
            }
            "register" => {
                let mut args = rest.split_whitespace();
                match (args.next(), args.next()) {
                    (Some(email), Some(password)) => match app.session().register(email, password)
                    {
                        Ok(user) => println!("welcome, {}", user.display_name),
                        Err(err) => println!("error: {err}"),
                    },
                    _ => println!("usage: register <email> <password>"),
                }
            }
            "login" => {
                let mut args = rest.split_whitespace();
                match (args.next(), args.next()) {
                    (Some(email), Some(password)) => {
                        match app.session().login_with_credentials(email, password) {
                            Ok(user) => println!("signed in as {}", user.display_name),
                            Err(err) => println!("error: {err}"),
                        }
                    }
                    _ => println!("usage: login <email> <password>"),
                }
            }
            "logout" => {
                app.logout();
                player = None;
                println!("signed out");
            }
            "foryou" => match app.for_you() {
                Ok(view) => {
                    match &view.selected {
                        Some(book) => println!("spotlight: {} - {}", book.title, book.author),
                        None => println!("spotlight: (none)"),
                    }
                    if view.recommended.is_empty() {
                        println!(
                            "recommended: {} placeholder cards",
                            view.recommended_placeholders
                        );
                    } else {
                        println!("recommended:");
                        print_books(&view.recommended);
                    }
                    println!("suggested:");
                    print_books(&view.suggested);
                }
                Err(err) => println!("error: {err}"),
            },
            "search" => match app.search(rest) {
                Ok(books) if books.is_empty() => println!("no matches"),
                Ok(books) => print_books(&books),
                Err(err) => println!("error: {err}"),
            },
            "book" => match app.book_detail(rest) {
                Ok(view) => {
                    let book = &view.book;
                    println!("{} - {}", book.title, book.author);
                    if !book.sub_title.is_empty() {
                        println!("{}", book.sub_title);
                    }
                    println!(
                        "rating {:.1} ({} ratings), {}",
                        book.average_rating,
                        book.total_rating,
                        briefcast::format_time(book.audio_length)
                    );
                    println!("in library: {}", if view.in_library { "yes" } else { "no" });
                }
                Err(err) => println!("error: {err}"),
            },
            "save" => match app.book_detail(rest) {
                Ok(view) => match app.save_book(&view.book) {
                    Ok(true) => println!("saved {}", view.book.title),
                    Ok(false) => println!("already in the library"),
                    Err(err) => println!("error: {err}"),
                },
                Err(err) => println!("error: {err}"),
            },
            "unsave" => match app.remove_saved(rest) {
                Ok(true) => println!("removed"),
                Ok(false) => println!("not in the library"),
                Err(err) => println!("error: {err}"),
            },
            "unfinish" => match app.remove_finished(rest) {
                Ok(true) => println!("removed"),
                Ok(false) => println!("not on the finished shelf"),
                Err(err) => println!("error: {err}"),
            },
            "library" => match app.library_view() {
                Ok(view) => {
                    println!("saved ({}):", view.saved.len());
                    for entry in &view.saved {
                        println!("  {}  {} - {}", entry.id, entry.title, entry.author);
                    }
                    println!("finished ({}):", view.finished.len());
                    for entry in &view.finished {
                        println!(
                            "  {}  {} - finished {}",
                            entry.id,
                            entry.title,
                            entry.finished_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(err) => println!("error: {err}"),
            },
            "player" => match app.player(rest) {
                Ok(mut session) => {
                    // The shell stands in for the media layer; metadata
                    // comes from the catalog's audio length.
                    let duration = session.book().audio_length;
                    session.metadata_loaded(duration);
                    println!("{} - {}", session.book().title, session.book().author);
                    print_snapshot(&session);
                    player = Some(session);
                }
                Err(err) => println!("error: {err}"),
            },
            "play" | "pause" | "fwd" | "back" | "end" | "status" => match player.as_mut() {
                Some(session) => {
                    match command {
                        "play" => session.play(),
                        "pause" => session.pause(),
                        "fwd" => session.skip(SKIP_SECONDS),
                        "back" => session.skip(-SKIP_SECONDS),
                        "end" => session.ended(),
                        _ => {}
                    }
                    session.poll();
                    print_snapshot(session);
                }
                None => println!("no open player; use 'player <id>'"),
            },
            "seek" => match (player.as_mut(), rest.parse::<f64>()) {
                (Some(session), Ok(target)) => {
                    session.seek(target);
                    session.poll();
                    print_snapshot(session);
                }
                (None, _) => println!("no open player; use 'player <id>'"),
                (_, Err(_)) => println!("usage: seek <seconds>"),
            },
            "settings" => {
                let view = app.settings();
                match &view.user {
                    Some(user) => println!(
                        "{} <{}> - {} plan",
                        user.display_name,
                        user.email,
                        view.plan_label().unwrap_or("Basic")
                    ),
                    None => println!("signed out; log in to manage the account"),
                }
            }
            "pricing" => {
                let view = app.pricing();
                println!(
                    "signed in: {}; premium: {}",
                    view.signed_in, view.already_premium
                );
            }
            "subscribe" => match rest {
                "monthly" => subscribe(&app, Plan::Monthly),
                "yearly" => subscribe(&app, Plan::Yearly),
                _ => println!("usage: subscribe <monthly|yearly>"),
            },
            _ => println!("unknown command; try 'help'"),
        }
    }
    Ok(())
}

fn subscribe(app: &App, plan: Plan) {
    match app.subscribe(plan) {
        Ok(user) => println!("subscribed to the {plan} plan as {}", user.display_name),
        Err(err) => println!("error: {err}"),
    }
}

fn print_books(books: &[Book]) {
    for book in books {
        println!("  {}  {} - {}", book.id, book.title, book.author);
    }
}

fn print_snapshot(session: &PlayerSession) {
    let snapshot = session.snapshot();
    println!(
        "[{:?}] {} / {}",
        snapshot.phase, snapshot.position_label, snapshot.duration_label
    );
}
