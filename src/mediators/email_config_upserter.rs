use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use regex::Regex;
use slog::Logger;

/// Writes the platform's SMTP settings. The table holds exactly one row (a
/// unique partial-index on `singleton` enforces it), so writes are upserts
/// against that row. Admin only.
pub struct Mediator<'a> {
    pub account:       &'a model::Account,
    pub conn:          &'a PgConnection,
    pub from_address:  &'a str,
    pub smtp_host:     &'a str,
    pub smtp_password: Option<&'a str>,
    pub smtp_port:     i32,
    pub smtp_username: Option<&'a str>,
    pub use_tls:       bool,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_admin()?;
        self.params_validate()?;
        let email_config = self.upsert_email_config(log)?;
        Ok(RunResult { email_config })
    }

    //
    // Steps
    //

    fn upsert_email_config(&mut self, log: &Logger) -> Result<model::EmailConfig> {
        let ins_config = insertable::EmailConfig {
            from_address:  self.from_address.to_owned(),
            smtp_host:     self.smtp_host.to_owned(),
            smtp_password: self.smtp_password.map(|s| s.to_owned()),
            smtp_port:     self.smtp_port,
            smtp_username: self.smtp_username.map(|s| s.to_owned()),
            updated_at:    Utc::now(),
            use_tls:       self.use_tls,
        };

        time_helpers::log_timed(&log.new(o!("step" => "upsert_email_config")), |_log| {
            diesel::insert_into(schema::email_config::table)
                .values(&ins_config)
                .on_conflict(schema::email_config::singleton)
                .do_update()
                .set(&ins_config)
                .get_result(self.conn)
                .chain_err(|| "Error upserting email config")
        })
    }

    //
    // Private functions
    //

    fn check_admin(&self) -> Result<()> {
        if !self.account.admin {
            bail!(user_errors::unauthorized());
        }
        Ok(())
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        lazy_static! {
            // See: https://www.w3.org/TR/html51/sec-forms.html#valid-e-mail-address
            static ref EMAIL_REGEX: Regex = Regex::new("^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap();
        }

        if self.smtp_host.is_empty() {
            bail!(user_errors::validation("Please specify an SMTP host."));
        }

        if self.smtp_port < 1 || self.smtp_port > 65_535 {
            bail!(user_errors::validation(
                "SMTP port must be between 1 and 65535."
            ));
        }

        if !EMAIL_REGEX.is_match(self.from_address) {
            bail!(user_errors::validation(
                "Please specify a valid from address."
            ));
        }

        Ok(())
    }
}

pub struct RunResult {
    pub email_config: model::EmailConfig,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::email_config_upserter::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_email_config_upsert() {
        let mut bootstrap = TestBootstrap::new(true);
        let (mut mediator, log) = bootstrap.mediator("smtp.example.com");
        let res = mediator.run(&log).unwrap();

        assert_ne!(0, res.email_config.id);
        assert_eq!("smtp.example.com", res.email_config.smtp_host);
        assert!(res.email_config.use_tls);
    }

    #[test]
    fn test_email_config_upsert_twice_keeps_one_row() {
        let mut bootstrap = TestBootstrap::new(true);

        let id = {
            let (mut mediator, log) = bootstrap.mediator("smtp.example.com");
            mediator.run(&log).unwrap().email_config.id
        };

        let (mut mediator, log) = bootstrap.mediator("smtp2.example.com");
        let res = mediator.run(&log).unwrap();

        assert_eq!(id, res.email_config.id);
        assert_eq!("smtp2.example.com", res.email_config.smtp_host);
    }

    #[test]
    fn test_email_config_upsert_not_admin() {
        let mut bootstrap = TestBootstrap::new(false);
        let (mut mediator, log) = bootstrap.mediator("smtp.example.com");
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Unauthorized: You need to present valid credentials to access this endpoint.",
            format!("{}", e).as_str()
        );
    }

    #[test]
    fn test_email_config_upsert_invalid_port() {
        let mut bootstrap = TestBootstrap::new(true);

        let res = {
            let (mut mediator, log) = bootstrap.mediator("smtp.example.com");
            mediator.smtp_port = 0;
            mediator.run(&log)
        };

        assert!(res.is_err());
    }

    //
    // Private types/functions
    //

    struct TestBootstrap {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        log:     Logger,
    }

    impl TestBootstrap {
        fn new(admin: bool) -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert_args(
                &log,
                &conn,
                test_data::account::Args { admin, email: None },
            );

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                conn,
                log,
            }
        }

        fn mediator<'b>(&'b mut self, smtp_host: &'b str) -> (Mediator<'b>, Logger) {
            (
                Mediator {
                    account:       &self.account,
                    conn:          &*self.conn,
                    from_address:  "no-reply@example.com",
                    smtp_host:     smtp_host,
                    smtp_password: Some("hunter2-but-longer"),
                    smtp_port:     587,
                    smtp_username: Some("mailer"),
                    use_tls:       true,
                },
                self.log.clone(),
            )
        }
    }
}
