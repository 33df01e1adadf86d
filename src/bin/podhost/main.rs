extern crate clap;
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
extern crate isatty;
extern crate openssl_probe;
extern crate podhost;
extern crate r2d2;
extern crate r2d2_diesel;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_term;

use podhost::api;
use podhost::error_helpers;
use podhost::errors::*;
use podhost::http_requester::HttpRequesterFactoryLive;
use podhost::mediators::account_creator;
use podhost::mediators::cleaner;
use podhost::mediators::episode_size_backfiller;

use clap::{App, ArgMatches, SubCommand};
use diesel::pg::PgConnection;
use r2d2::Pool;
use r2d2_diesel::ConnectionManager;
use slog::{Drain, Logger};
use std::env;
use std::io;
use std::process;

embed_migrations!();

//
// Main
//

fn main() {
    // Use OpenSSL certificates installed wherever this is running instead of
    // whatever was on the build machine.
    openssl_probe::init_ssl_cert_env_vars();

    let mut app = App::new("podhost")
        .version("0.1")
        .about("A general utility command for the podhost project")
        .arg_from_usage("-q --quiet 'Quiets all output'")
        .subcommand(
            SubCommand::with_name("backfill-audio-sizes")
                .about("Fills in episode audio sizes that were never recorded"),
        )
        .subcommand(SubCommand::with_name("clean").about("Removes expired database rows"))
        .subcommand(
            SubCommand::with_name("create-account")
                .about("Creates an account (useful for bootstrapping an admin)")
                .arg_from_usage("--admin 'Makes the new account an administrator'")
                // <arg> is required and [arg] is optional
                .arg_from_usage("<EMAIL> 'Email address for the new account'")
                .arg_from_usage("<PASSWORD> 'Password for the new account'"),
        )
        .subcommand(SubCommand::with_name("migrate").about("Runs database migrations"))
        .subcommand(
            SubCommand::with_name("serve")
                .about("Starts the API server")
                .arg_from_usage("-p, --port [PORT] 'Port to bind server to'"),
        );

    let matches = app.clone().get_matches();
    let quiet = matches.is_present("quiet");

    let res = match matches.subcommand_name() {
        Some("backfill-audio-sizes") => backfill_audio_sizes(&log(quiet)),
        Some("clean") => clean(&log(quiet)),
        Some("create-account") => create_account(&log(quiet), &matches),
        Some("migrate") => migrate(&log(quiet)),
        Some("serve") => serve(&log(quiet), &matches),
        None => {
            app.print_help().unwrap();
            return;
        }
        _ => unreachable!(),
    };

    if let Err(ref e) = res {
        error_helpers::print_error(&log(quiet), e);
        process::exit(1);
    }
}

//
// Subcommands
//

fn backfill_audio_sizes(log: &Logger) -> Result<()> {
    let res = episode_size_backfiller::Mediator {
        num_workers:            num_connections() - 1,
        http_requester_factory: Box::new(HttpRequesterFactoryLive {}),
        pool:                   pool()?,
    }.run(log)?;

    info!(log, "Finished backfill"; "num_episodes" => res.num_episodes);
    Ok(())
}

fn clean(log: &Logger) -> Result<()> {
    let res = cleaner::Mediator { pool: pool()? }.run(log)?;

    info!(log, "Finished cleaning"; "num_cleaned" => res.num_cleaned);
    Ok(())
}

fn create_account(log: &Logger, matches: &ArgMatches) -> Result<()> {
    let matches = matches.subcommand_matches("create-account").unwrap();

    let pool = pool()?;
    let conn = pool.get()?;

    let res = account_creator::Mediator {
        admin:        matches.is_present("admin"),
        conn:         &*conn,
        create_key:   true,
        email:        matches.value_of("EMAIL").unwrap(),
        last_ip:      "127.0.0.1",
        password:     matches.value_of("PASSWORD").unwrap(),
        scrypt_log_n: SCRYPT_LOG_N,
    }.run(log)?;

    // The secret is the only way into the account over the API, so it has to
    // be shown once here.
    info!(log, "Created account"; "id" => res.account.id,
        "email" => res.account.email.as_str(),
        "admin" => res.account.admin,
        "secret" => res.key.unwrap().secret.as_str());
    Ok(())
}

fn migrate(log: &Logger) -> Result<()> {
    let pool = pool()?;
    let conn = pool.get()?;

    info!(log, "Running migrations");
    embedded_migrations::run_with_output(&*conn, &mut io::stdout())
        .chain_err(|| "Error running migrations")?;
    Ok(())
}

fn serve(log: &Logger, matches: &ArgMatches) -> Result<()> {
    let matches = matches.subcommand_matches("serve").unwrap();

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_owned());
    let port = matches.value_of("PORT").unwrap_or_else(|| port.as_str());

    let server = api::Server {
        log:                log.clone(),
        num_sync_executors: num_connections(),
        pool:               pool()?,
        port:               port.to_owned(),
    };
    server.run()
}

//
// Private constants
//

// Scrypt cost parameter for accounts created from the command line.
const SCRYPT_LOG_N: u8 = 15;

//
// Private functions
//

fn log(quiet: bool) -> Logger {
    if quiet {
        Logger::root(slog::Discard, o!())
    } else if isatty::stdout_isatty() {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        let decorator = slog_term::PlainDecorator::new(io::stdout());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    }
}

fn num_connections() -> u32 {
    match env::var("NUM_CONNECTIONS") {
        Ok(n) => n.parse::<u32>().unwrap_or(DEFAULT_NUM_CONNECTIONS),
        Err(_) => DEFAULT_NUM_CONNECTIONS,
    }
}

fn pool() -> Result<Pool<ConnectionManager<PgConnection>>> {
    let database_url = env::var("DATABASE_URL").chain_err(|| "DATABASE_URL must be set")?;
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(num_connections())
        .build(manager)
        .chain_err(|| "Error creating connection pool")
}

const DEFAULT_NUM_CONNECTIONS: u32 = 10;
