use error_helpers;
use errors::*;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::types::BigInt;
use r2d2::Pool;
use r2d2_diesel::ConnectionManager;
use slog::Logger;
use std::thread;

/// Removes rows that no longer serve any purpose: invitations that expired
/// without ever being accepted, and keys that expired long enough ago that
/// nothing will ever present them again. Each cleaner runs on its own thread
/// and deletes in bounded batches.
pub struct Mediator {
    pub pool: Pool<ConnectionManager<PgConnection>>,
}

impl Mediator {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let mut workers = vec![];

        for cleaner in &[CleanerKind::ExpiredInvitations, CleanerKind::ExpiredKeys] {
            let cleaner = *cleaner;
            let thread_name = cleaner.name().to_owned();
            let log = log.new(o!("thread" => thread_name.clone()));
            let pool_clone = self.pool.clone();

            workers.push(thread::Builder::new()
                .name(thread_name)
                .spawn(move || clean(&log, &pool_clone, cleaner))
                .chain_err(|| "Failed to spawn thread")?);
        }

        let mut num_cleaned = 0;
        for worker in workers {
            num_cleaned += worker.join().unwrap_or(0);
        }

        info!(log, "Finished cleaning"; "num_cleaned" => num_cleaned);
        Ok(RunResult { num_cleaned })
    }
}

pub struct RunResult {
    pub num_cleaned: i64,
}

//
// Private constants
//

// The maximum number of rows to try and delete as part of one batch. It's a
// good idea to constrain batch sizes so that we don't have any queries in the
// system that are too long-lived and affect replication and other critical
// facilities.
const DELETE_LIMIT: i64 = 1000;

// How long an expired key is kept around before the cleaner takes it. Gives
// operators a window to inspect recently revoked credentials.
const KEY_RETENTION_HOURS: i64 = 24 * 7;

//
// Private types
//

#[derive(Clone, Copy, Debug)]
enum CleanerKind {
    ExpiredInvitations,
    ExpiredKeys,
}

impl CleanerKind {
    fn name(&self) -> &'static str {
        match *self {
            CleanerKind::ExpiredInvitations => "expired_invitation_cleaner",
            CleanerKind::ExpiredKeys => "expired_key_cleaner",
        }
    }

    fn query(&self) -> String {
        match *self {
            CleanerKind::ExpiredInvitations => format!(
                "
                    WITH batch AS (
                        DELETE FROM content_invitation
                        WHERE id IN (
                            SELECT id
                            FROM content_invitation
                            WHERE accepted_at IS NULL
                                AND expires_at IS NOT NULL
                                AND expires_at < NOW()
                            LIMIT {}
                        )
                        RETURNING id
                    )
                    SELECT COUNT(*)
                    FROM batch
                    ",
                DELETE_LIMIT
            ),
            CleanerKind::ExpiredKeys => format!(
                "
                    WITH batch AS (
                        DELETE FROM key
                        WHERE id IN (
                            SELECT id
                            FROM key
                            WHERE expire_at IS NOT NULL
                                AND expire_at < NOW() - '{} hours'::interval
                            LIMIT {}
                        )
                        RETURNING id
                    )
                    SELECT COUNT(*)
                    FROM batch
                    ",
                KEY_RETENTION_HOURS, DELETE_LIMIT
            ),
        }
    }
}

// Exists because `sql_query` doesn't support querying into a tuple, only a
// struct.
#[derive(Clone, Debug, QueryableByName)]
struct DeleteBatchResults {
    #[sql_type = "BigInt"]
    count: i64,
}

//
// Private functions
//

fn clean(log: &Logger, pool: &Pool<ConnectionManager<PgConnection>>, kind: CleanerKind) -> i64 {
    let conn = match pool.try_get() {
        Some(conn) => conn,
        None => {
            error!(
                log,
                "Error acquiring connection from connection pool (too few max connections?)"
            );
            return 0;
        }
    };
    debug!(log, "Thread acquired a connection");

    let mut num_cleaned = 0;
    loop {
        let res = delete_batch(log, &*conn, kind);

        if let Err(e) = res {
            error_helpers::print_error(log, &e);
            break;
        }

        let batch = res.unwrap();
        if batch.count < 1 {
            info!(log, "Nothing left to clean -- finishing"; "num_cleaned" => num_cleaned);
            break;
        }
        info!(log, "Cleaned batch"; "num_cleaned" => batch.count);
        num_cleaned += batch.count;
    }

    num_cleaned
}

fn delete_batch(
    log: &Logger,
    conn: &PgConnection,
    kind: CleanerKind,
) -> Result<DeleteBatchResults> {
    time_helpers::log_timed(
        &log.new(o!("step" => "delete_batch", "limit" => DELETE_LIMIT)),
        |_log| {
            diesel::sql_query(kind.query())
                .get_result::<DeleteBatchResults>(conn)
                .chain_err(|| "Error deleting batch")
        },
    )
}

//
// Tests
//
