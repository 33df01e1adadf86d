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

pub struct Mediator<'a> {
    pub conn:     &'a PgConnection,
    pub email:    &'a str,
    pub last_ip:  &'a str,
    pub password: &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.params_validate()?;

        let account = self.select_account(log)?;
        if account.is_none() {
            info!(log, "No account with that email");
            bail!(user_errors::validation("No account matched that email address."));
        };

        let account = account.unwrap();
        info!(log, "Found account"; "id" => account.id);

        if !scrypt_check(log, &account, self.password) {
            info!(log, "Password did not match scrypt hash");
            bail!(user_errors::validation(
                "That password doesn't match the account's."
            ));
        }

        info!(log, "Password matched scrypt hash");
        let account = self.touch_account(log, &account)?;
        let key = self.select_key(log, &account)?;

        Ok(RunResult { account, key })
    }

    //
    // Steps
    //

    fn select_account(&mut self, log: &Logger) -> Result<Option<model::Account>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_account")), |_log| {
            schema::account::table
                .filter(schema::account::email.eq(self.email))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting account")
        })
    }

    fn select_key(&self, log: &Logger, account: &model::Account) -> Result<model::Key> {
        time_helpers::log_timed(&log.new(o!("step" => "select_key")), |_log| {
            schema::key::table
                .filter(schema::key::account_id.eq(account.id))
                .filter(schema::key::expire_at.is_null())
                .first(self.conn)
                .chain_err(|| "Error selecting key")
        })
    }

    fn touch_account(&mut self, log: &Logger, account: &model::Account) -> Result<model::Account> {
        time_helpers::log_timed(&log.new(o!("step" => "touch_account")), |_log| {
            diesel::update(schema::account::table)
                .filter(schema::account::id.eq(account.id))
                .set((
                    schema::account::last_ip.eq(self.last_ip),
                    schema::account::last_seen_at.eq(Utc::now()),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error touching account")
        })
    }

    //
    // Private functions
    //

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&mut self) -> Result<()> {
        if self.email.is_empty() {
            bail!(user_errors::validation("Please specify an email address."))
        }
        if self.password.is_empty() {
            bail!(user_errors::validation("Please specify a password."))
        }

        Ok(())
    }
}

pub struct RunResult {
    pub account: model::Account,
    pub key:     model::Key,
}

//
// Private functions
//

/// Checks a password against an Scrypted hash. Returns `true` if the
/// password matched successfully.
fn scrypt_check(log: &Logger, account: &model::Account, password: &str) -> bool {
    time_helpers::log_timed(&log.new(o!("step" => "scrypt_check")), |_log| {
        // We use some unwraps here with the logic that if something is wrong with our
        // scrypt verification, let's just blow up and find out about it.
        scrypt::scrypt_check(password, account.password_scrypt.as_str()).unwrap()
    })
}

//
// Tests
//
