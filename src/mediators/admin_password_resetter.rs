use errors::*;
use model;
use schema;
use time_helpers;

use chrono::Utc;
use crypto::scrypt;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Emergency reset of an administrator's password, guarded by a shared token
/// that operators configure out-of-band (`ADMIN_RESET_TOKEN`). All of the
/// account's keys are expired as part of the reset.
pub struct Mediator<'a> {
    pub conn:           &'a PgConnection,
    pub email:          &'a str,
    pub expected_token: &'a str,
    pub new_password:   &'a str,
    pub scrypt_log_n:   u8,
    pub token:          &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.params_check()?;
        self.params_validate()?;

        let account = self.select_admin_account(log)?;
        if account.is_none() {
            info!(log, "No admin account with that email");
            bail!(user_errors::validation(
                "No admin account matched that email address."
            ));
        }
        let account = account.unwrap();

        let password_scrypt = self.scrypt_password(log);
        let account = self.update_account(log, &account, password_scrypt)?;
        let num_keys_expired = self.expire_keys(log, &account)?;

        info!(log, "Reset admin password"; "id" => account.id,
            "num_keys_expired" => num_keys_expired);

        Ok(RunResult {
            account,
            num_keys_expired,
        })
    }

    //
    // Steps
    //

    fn expire_keys(&mut self, log: &Logger, account: &model::Account) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "expire_keys")), |_log| {
            diesel::update(schema::key::table)
                .filter(schema::key::account_id.eq(account.id))
                .filter(schema::key::expire_at.is_null())
                .set(schema::key::expire_at.eq(Utc::now()))
                .execute(self.conn)
                .chain_err(|| "Error expiring keys")
        })
    }

    fn select_admin_account(&mut self, log: &Logger) -> Result<Option<model::Account>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_admin_account")), |_log| {
            schema::account::table
                .filter(schema::account::email.eq(self.email))
                .filter(schema::account::admin.eq(true))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting admin account")
        })
    }

    fn update_account(
        &mut self,
        log: &Logger,
        account: &model::Account,
        password_scrypt: String,
    ) -> Result<model::Account> {
        time_helpers::log_timed(&log.new(o!("step" => "update_account")), |_log| {
            diesel::update(schema::account::table)
                .filter(schema::account::id.eq(account.id))
                .set(schema::account::password_scrypt.eq(password_scrypt))
                .get_result(self.conn)
                .chain_err(|| "Error updating account password")
        })
    }

    //
    // Private functions
    //

    /// Performs general checks on parameters. Not intended to be user-facing.
    fn params_check(&mut self) -> Result<()> {
        if self.expected_token.is_empty() {
            bail!("`expected_token` is required -- refusing to reset without one configured.");
        }

        Ok(())
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        if self.token != self.expected_token {
            bail!(user_errors::unauthorized());
        }

        if self.new_password.len() < 8 {
            bail!(user_errors::validation(
                "Password must be at least 8 characters long."
            ));
        }

        Ok(())
    }

    fn scrypt_password(&self, log: &Logger) -> String {
        time_helpers::log_timed(&log.new(o!("step" => "scrypt_password")), |_log| {
            scrypt::scrypt_simple(
                self.new_password,
                &scrypt::ScryptParams::new(self.scrypt_log_n, 8, 1),
            ).unwrap()
        })
    }
}

pub struct RunResult {
    pub account:          model::Account,
    pub num_keys_expired: usize,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::admin_password_resetter::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_admin_password_reset_ok() {
        let mut bootstrap = TestBootstrap::new(Args {
            email: TEST_EMAIL,
            token: TEST_TOKEN,
        });
        let old_scrypt = bootstrap.account.password_scrypt.clone();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(bootstrap.account.id, res.account.id);
        assert_ne!(old_scrypt, res.account.password_scrypt);
        assert_eq!(1, res.num_keys_expired);
    }

    #[test]
    fn test_admin_password_reset_bad_token() {
        let mut bootstrap = TestBootstrap::new(Args {
            email: TEST_EMAIL,
            token: "not-the-token",
        });

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Unauthorized: You need to present valid credentials to access this endpoint.",
            format!("{}", e).as_str()
        );
    }

    #[test]
    fn test_admin_password_reset_not_admin() {
        let mut bootstrap = TestBootstrap::new(Args {
            email: "listener@example.com",
            token: TEST_TOKEN,
        });

        test_data::account::insert_args(
            &bootstrap.log,
            &bootstrap.conn,
            test_data::account::Args {
                admin: false,
                email: Some("listener@example.com"),
            },
        );

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Validation failed: No admin account matched that email address.",
            format!("{}", e).as_str()
        );
    }

    //
    // Private types/functions
    //

    static TEST_EMAIL: &str = "admin@example.com";
    static TEST_TOKEN: &str = "emergency-reset-token";

    struct Args<'a> {
        email: &'a str,
        token: &'a str,
    }

    struct TestBootstrap<'a> {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        args:    Args<'a>,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        log:     Logger,
    }

    impl<'a> TestBootstrap<'a> {
        fn new(args: Args) -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert_args(
                &log,
                &*conn,
                test_data::account::Args {
                    admin: true,
                    email: Some(TEST_EMAIL),
                },
            );

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                args,
                conn,
                log,
            }
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    conn:           &*self.conn,
                    email:          self.args.email,
                    expected_token: TEST_TOKEN,
                    new_password:   "a-brand-new-password",
                    scrypt_log_n:   test_helpers::SCRYPT_LOG_N,
                    token:          self.args.token,
                },
                self.log.clone(),
            )
        }
    }
}
