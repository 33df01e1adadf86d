use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use slog::Logger;

/// Subscribes an account to a podcast, putting it in their library. The
/// operation is an upsert so that subscribing twice (or resubscribing after
/// an unsubscribe) is idempotent and reuses the original row.
pub struct Mediator<'a> {
    pub account: &'a model::Account,
    pub conn:    &'a PgConnection,
    pub podcast: &'a model::Podcast,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let subscription = self.upsert_subscription(log)?;
        Ok(RunResult { subscription })
    }

    //
    // Steps
    //

    fn upsert_subscription(&mut self, log: &Logger) -> Result<model::Subscription> {
        let ins_subscription = insertable::Subscription {
            account_id:      self.account.id,
            podcast_id:      self.podcast.id,
            subscribed_at:   Some(Utc::now()),
            unsubscribed_at: None,
        };

        time_helpers::log_timed(&log.new(o!("step" => "upsert_subscription")), |_log| {
            diesel::insert_into(schema::subscription::table)
                .values(&ins_subscription)
                .on_conflict((
                    schema::subscription::account_id,
                    schema::subscription::podcast_id,
                ))
                .do_update()
                .set((
                    schema::subscription::subscribed_at
                        .eq(excluded(schema::subscription::subscribed_at)),
                    schema::subscription::unsubscribed_at
                        .eq(excluded(schema::subscription::unsubscribed_at)),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error upserting subscription")
        })
    }
}

pub struct RunResult {
    pub subscription: model::Subscription,
}

//
// Tests
//
