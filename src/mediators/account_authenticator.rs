use errors::*;
use model;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Authenticates a request by its bearer key secret. Produces `None` (rather
/// than an error) if the secret didn't match anything so that callers can
/// decide how to respond.
pub struct Mediator<'a> {
    pub conn:    &'a PgConnection,
    pub last_ip: &'a str,
    pub secret:  &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let key = self.select_key(log)?;
        if key.is_none() {
            info!(log, "No valid key matched secret");
            return Ok(RunResult {
                account: None,
                key:     None,
            });
        }

        let key = key.unwrap();
        let account = self.touch_account(log, key.account_id)?;
        Ok(RunResult {
            account: Some(account),
            key:     Some(key),
        })
    }

    //
    // Steps
    //

    fn select_key(&mut self, log: &Logger) -> Result<Option<model::Key>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_key")), |_log| {
            schema::key::table
                .filter(schema::key::secret.eq(self.secret))
                .filter(
                    schema::key::expire_at
                        .is_null()
                        .or(schema::key::expire_at.gt(Utc::now())),
                )
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting key")
        })
    }

    fn touch_account(&mut self, log: &Logger, account_id: i64) -> Result<model::Account> {
        time_helpers::log_timed(&log.new(o!("step" => "touch_account")), |_log| {
            diesel::update(schema::account::table)
                .filter(schema::account::id.eq(account_id))
                .set((
                    schema::account::last_ip.eq(self.last_ip),
                    schema::account::last_seen_at.eq(Utc::now()),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error touching account")
        })
    }
}

pub struct RunResult {
    pub account: Option<model::Account>,
    pub key:     Option<model::Key>,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::account_authenticator::*;
    use test_data;
    use test_helpers;

    use chrono::Duration;
    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_account_authenticate_ok() {
        let mut bootstrap = TestBootstrap::new();
        let secret = bootstrap.key.secret.clone();

        let (mut mediator, log) = bootstrap.mediator(&secret);
        let res = mediator.run(&log).unwrap();

        let account = res.account.unwrap();
        assert_eq!(bootstrap.account.id, account.id);
        assert_eq!(TEST_NEW_IP, account.last_ip);
        assert_eq!(bootstrap.key.id, res.key.unwrap().id);
    }

    #[test]
    fn test_account_authenticate_bad_secret() {
        let mut bootstrap = TestBootstrap::new();

        let (mut mediator, log) = bootstrap.mediator("not-a-secret");
        let res = mediator.run(&log).unwrap();

        assert!(res.account.is_none());
        assert!(res.key.is_none());
    }

    #[test]
    fn test_account_authenticate_expired_key() {
        let mut bootstrap = TestBootstrap::new();
        let secret = bootstrap.key.secret.clone();

        diesel::update(schema::key::table)
            .filter(schema::key::id.eq(bootstrap.key.id))
            .set(schema::key::expire_at.eq(Some(Utc::now() - Duration::hours(1))))
            .execute(&*bootstrap.conn)
            .unwrap();

        let (mut mediator, log) = bootstrap.mediator(&secret);
        let res = mediator.run(&log).unwrap();

        assert!(res.account.is_none());
        assert!(res.key.is_none());
    }

    //
    // Private types/functions
    //

    static TEST_NEW_IP: &str = "4.5.6.7";

    struct TestBootstrap {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        key:     model::Key,
        log:     Logger,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert(&log, &conn);
            let key = test_data::key::insert_args(
                &log,
                &conn,
                test_data::key::Args {
                    account:   Some(&account),
                    expire_at: None,
                },
            );

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                conn,
                key,
                log,
            }
        }

        fn mediator<'b>(&'b mut self, secret: &'b str) -> (Mediator<'b>, Logger) {
            (
                Mediator {
                    conn:    &*self.conn,
                    last_ip: TEST_NEW_IP,
                    secret:  secret,
                },
                self.log.clone(),
            )
        }
    }
}
