use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use chrono::{DateTime, Utc};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand::EntropyRng;
use rand::distributions::Alphanumeric;
use slog::Logger;
use std::iter;

pub struct Mediator<'a> {
    pub account:   &'a model::Account,
    pub conn:      &'a PgConnection,
    pub expire_at: Option<DateTime<Utc>>,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let secret = self.generate_secret(log);
        let key = self.insert_key(log, secret)?;
        Ok(RunResult { key })
    }

    //
    // Steps
    //

    fn generate_secret(&mut self, _log: &Logger) -> String {
        use rand::Rng;

        // `EntropyRng` collects secure random data from the OS if available (it almost
        // always is), and falls back to the `JitterRng` entropy collector
        // otherwise. It panics if no secure source of entropy is available.
        let mut rng = EntropyRng::new();

        iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .take(KEY_LENGTH)
            .collect()
    }

    fn insert_key(&mut self, log: &Logger, secret: String) -> Result<model::Key> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_key")), |_log| {
            diesel::insert_into(schema::key::table)
                .values(&insertable::Key {
                    account_id: self.account.id,
                    expire_at: self.expire_at,
                    secret,
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting key")
        })
    }
}

pub struct RunResult {
    pub key: model::Key,
}

//
// Private constants
//

// Note that there's a check constraint in the database that the length of
// secrets stays exactly this size, so if changing this value, that constraint
// needs to be modified as well.
const KEY_LENGTH: usize = 50;

//
// Tests
//
