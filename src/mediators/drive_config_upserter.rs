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

/// Writes the platform's cloud storage (Drive) settings. Single-row upsert
/// like `email_config_upserter`. Admin only. Talking to the Drive API is the
/// storage integration's job; we only persist its configuration.
pub struct Mediator<'a> {
    pub account:               &'a model::Account,
    pub conn:                  &'a PgConnection,
    pub enabled:               bool,
    pub folder_id:             &'a str,
    pub service_account_email: &'a str,
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
        let drive_config = self.upsert_drive_config(log)?;
        Ok(RunResult { drive_config })
    }

    //
    // Steps
    //

    fn upsert_drive_config(&mut self, log: &Logger) -> Result<model::DriveConfig> {
        let ins_config = insertable::DriveConfig {
            enabled:               self.enabled,
            folder_id:             self.folder_id.to_owned(),
            service_account_email: self.service_account_email.to_owned(),
            updated_at:            Utc::now(),
        };

        time_helpers::log_timed(&log.new(o!("step" => "upsert_drive_config")), |_log| {
            diesel::insert_into(schema::drive_config::table)
                .values(&ins_config)
                .on_conflict(schema::drive_config::singleton)
                .do_update()
                .set(&ins_config)
                .get_result(self.conn)
                .chain_err(|| "Error upserting drive config")
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

        if self.folder_id.is_empty() {
            bail!(user_errors::validation("Please specify a folder ID."));
        }

        if !EMAIL_REGEX.is_match(self.service_account_email) {
            bail!(user_errors::validation(
                "Please specify a valid service account email."
            ));
        }

        Ok(())
    }
}

pub struct RunResult {
    pub drive_config: model::DriveConfig,
}

//
// Tests
//
