use errors::*;
use mediators;
use model;
use model::insertable;
use schema;
use time_helpers;

use crypto::scrypt;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use regex::Regex;
use slog::Logger;

pub struct Mediator<'a> {
    pub admin:        bool,
    pub conn:         &'a PgConnection,
    pub create_key:   bool,
    pub email:        &'a str,
    pub last_ip:      &'a str,
    pub password:     &'a str,
    pub scrypt_log_n: u8,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.params_validate()?;
        self.check_existing_account(log)?;
        let password_scrypt = self.scrypt_password(log);
        let account = self.insert_account(log, password_scrypt)?;
        let key = self.create_key(log, &account)?;
        Ok(RunResult { account, key })
    }

    //
    // Steps
    //

    fn create_key(&mut self, log: &Logger, account: &model::Account) -> Result<Option<model::Key>> {
        if !self.create_key {
            return Ok(None);
        }

        let res = mediators::key_creator::Mediator {
            account,
            conn: self.conn,
            expire_at: None,
        }.run(log)?;
        Ok(Some(res.key))
    }

    fn insert_account(&mut self, log: &Logger, password_scrypt: String) -> Result<model::Account> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_account")), |_log| {
            diesel::insert_into(schema::account::table)
                .values(&insertable::Account {
                    admin: self.admin,
                    email: self.email.to_owned(),
                    last_ip: self.last_ip.to_owned(),
                    password_scrypt,
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting account")
        })
    }

    //
    // Private functions
    //

    /// Checks whether an account with the given email address already exists.
    ///
    /// This isn't strictly necessary because our `UNIQUE` constraint will
    /// protect us regardless, but this gives the user a much better error.
    fn check_existing_account(&self, log: &Logger) -> Result<()> {
        let email_exists =
            time_helpers::log_timed(&log.new(o!("step" => "select_existing_account")), |_log| {
                diesel::select(diesel::dsl::exists(
                    schema::account::table.filter(schema::account::email.eq(self.email)),
                )).get_result(self.conn)
                    .chain_err(|| "Error checking account existence")
            })?;

        if email_exists {
            bail!(user_errors::validation(
                "An account with that email already exists."
            ));
        }

        Ok(())
    }

    /// Scrypts the account's password.
    ///
    /// Written as a separate step because scrypting can be a very expensive
    /// operation (easily on the order of full seconds with a high enough
    /// `log_n` value), and this gives us some timing insight into an scrypt
    /// that might be taking a long time.
    fn scrypt_password(&self, log: &Logger) -> String {
        time_helpers::log_timed(&log.new(o!("step" => "scrypt_password")), |log| {
            debug!(log, "Scrypting password"; "log_n" => self.scrypt_log_n);

            // We use some unwraps here with the logic that if something is wrong with our
            // scrypt generation, let's just blow up and find out about it.
            scrypt::scrypt_simple(
                self.password,
                &scrypt::ScryptParams::new(self.scrypt_log_n, 8, 1),
            ).unwrap()
        })
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        lazy_static! {
            // See: https://www.w3.org/TR/html51/sec-forms.html#valid-e-mail-address
            static ref EMAIL_REGEX: Regex = Regex::new("^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap();
        }

        if self.email.is_empty() {
            bail!(user_errors::validation("Please specify an email address."))
        }

        if !EMAIL_REGEX.is_match(self.email) {
            bail!(user_errors::validation(
                "Please specify a valid email address."
            ))
        }

        if self.password.is_empty() {
            bail!(user_errors::validation("Please specify a password."))
        }

        // Obviously we want to put in more sophisticated rules around password
        // complexity ...
        if self.password.len() < 8 {
            bail!(user_errors::validation(
                "Password must be at least 8 characters long."
            ))
        }

        Ok(())
    }
}

pub struct RunResult {
    pub account: model::Account,

    /// A newly minted key for the account. A key is only created if the
    /// `create_key` parameter was set to `true`.
    pub key: Option<model::Key>,
}

//
// Tests
//
