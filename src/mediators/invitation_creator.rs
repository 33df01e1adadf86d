use errors::*;
use model;
use model::Visibility;
use model::insertable;
use schema;
use time_helpers;

use chrono::{DateTime, Utc};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand::EntropyRng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use slog::Logger;
use std::iter;

/// Issues an invitation that grants access to an unlisted or private
/// podcast. The token is the secret that the invitee presents to accept;
/// actually mailing it out is the mail relay's job, not ours.
pub struct Mediator<'a> {
    pub account:    &'a model::Account,
    pub conn:       &'a PgConnection,
    pub email:      &'a str,
    pub expires_at: Option<DateTime<Utc>>,
    pub podcast:    &'a model::Podcast,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_owner()?;
        self.params_validate()?;
        let token = self.generate_token(log);
        let invitation = self.insert_invitation(log, token)?;
        Ok(RunResult { invitation })
    }

    //
    // Steps
    //

    fn generate_token(&mut self, _log: &Logger) -> String {
        use rand::Rng;

        // Tokens are bearer secrets just like keys, so use an entropy-backed
        // generator rather than the thread-local one.
        let mut rng = EntropyRng::new();

        iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .take(TOKEN_LENGTH)
            .collect()
    }

    fn insert_invitation(
        &mut self,
        log: &Logger,
        token: String,
    ) -> Result<model::ContentInvitation> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_invitation")), |_log| {
            diesel::insert_into(schema::content_invitation::table)
                .values(&insertable::ContentInvitation {
                    email:      self.email.to_owned(),
                    expires_at: self.expires_at,
                    podcast_id: self.podcast.id,
                    token:      token,
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting invitation")
        })
    }

    //
    // Private functions
    //

    fn check_owner(&self) -> Result<()> {
        if self.podcast.account_id != self.account.id {
            bail!(user_errors::not_found("podcast", self.podcast.id));
        }
        Ok(())
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        lazy_static! {
            // See: https://www.w3.org/TR/html51/sec-forms.html#valid-e-mail-address
            static ref EMAIL_REGEX: Regex = Regex::new("^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap();
        }

        if Visibility::parse(self.podcast.visibility.as_str())? == Visibility::Public {
            bail!(user_errors::validation(
                "Public podcasts don't need invitations."
            ));
        }

        if !EMAIL_REGEX.is_match(self.email) {
            bail!(user_errors::validation(
                "Please specify a valid email address."
            ));
        }

        if let Some(expires_at) = self.expires_at {
            if expires_at <= Utc::now() {
                bail!(user_errors::validation(
                    "Expiry must be a time in the future."
                ));
            }
        }

        Ok(())
    }
}

pub struct RunResult {
    pub invitation: model::ContentInvitation,
}

//
// Private constants
//

// Note that there's a check constraint in the database that the length of
// tokens stays exactly this size, so if changing this value, that constraint
// needs to be modified as well.
const TOKEN_LENGTH: usize = 50;

//
// Tests
//
