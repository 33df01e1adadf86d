use errors::*;
use model;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

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
        // Shortcut so that we can skip writing anything in the case where an
        // unsubscribe was requested, but the account was never subscribed in
        // the first place.
        if !self.subscription_exists(log)? {
            return Ok(RunResult { subscription: None });
        }

        let subscription = self.update_subscription(log)?;
        Ok(RunResult {
            subscription: Some(subscription),
        })
    }

    //
    // Steps
    //

    fn subscription_exists(&mut self, log: &Logger) -> Result<bool> {
        time_helpers::log_timed(&log.new(o!("step" => "check_subscription")), |_log| {
            diesel::select(diesel::dsl::exists(
                schema::subscription::table
                    .filter(schema::subscription::account_id.eq(self.account.id))
                    .filter(schema::subscription::podcast_id.eq(self.podcast.id)),
            )).get_result(self.conn)
                .chain_err(|| "Error checking subscription existence")
        })
    }

    fn update_subscription(&mut self, log: &Logger) -> Result<model::Subscription> {
        time_helpers::log_timed(&log.new(o!("step" => "update_subscription")), |_log| {
            diesel::update(schema::subscription::table)
                .filter(schema::subscription::account_id.eq(self.account.id))
                .filter(schema::subscription::podcast_id.eq(self.podcast.id))
                // Don't touch `subscribed_at` -- we want to keep its original value around
                .set(schema::subscription::unsubscribed_at.eq(Some(Utc::now())))
                .get_result(self.conn)
                .chain_err(|| "Error updating subscription")
        })
    }
}

pub struct RunResult {
    pub subscription: Option<model::Subscription>,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::podcast_subscriber;
    use mediators::podcast_unsubscriber::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_podcast_unsubscribe() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.subscribe();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        let subscription = res.subscription.unwrap();
        assert!(!subscription.is_active());
        assert!(subscription.subscribed_at.is_some());
    }

    #[test]
    fn test_podcast_unsubscribe_never_subscribed() {
        let mut bootstrap = TestBootstrap::new();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert!(res.subscription.is_none());
    }

    #[test]
    fn test_podcast_unsubscribe_idempotent() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.subscribe();

        {
            let (mut mediator, log) = bootstrap.mediator();
            mediator.run(&log).unwrap();
        }

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();
        assert!(!res.subscription.unwrap().is_active());
    }

    //
    // Private types/functions
    //

    struct TestBootstrap {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        log:     Logger,
        podcast: model::Podcast,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account: test_data::account::insert(&log, &conn),
                podcast: test_data::podcast::insert(&log, &conn),

                // Only move these after filling the above
                conn: conn,
                log:  log,
            }
        }

        fn subscribe(&mut self) {
            podcast_subscriber::Mediator {
                account: &self.account,
                conn:    &*self.conn,
                podcast: &self.podcast,
            }.run(&self.log)
                .unwrap();
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    account: &self.account,
                    conn:    &*self.conn,
                    podcast: &self.podcast,
                },
                self.log.clone(),
            )
        }
    }
}
