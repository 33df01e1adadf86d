use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

pub struct Mediator<'a> {
    pub account:     &'a model::Account,
    pub conn:        &'a PgConnection,
    pub description: Option<&'a str>,
    pub image_url:   Option<&'a str>,
    pub language:    Option<&'a str>,
    pub link_url:    Option<&'a str>,
    pub title:       &'a str,
    pub visibility:  Option<&'a str>,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let visibility = self.params_validate()?;
        let podcast = self.insert_podcast(log, visibility)?;
        Ok(RunResult { podcast })
    }

    //
    // Steps
    //

    fn insert_podcast(
        &mut self,
        log: &Logger,
        visibility: model::Visibility,
    ) -> Result<model::Podcast> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_podcast")), |_log| {
            diesel::insert_into(schema::podcast::table)
                .values(&insertable::Podcast {
                    account_id:  self.account.id,
                    description: self.description.map(|s| s.to_owned()),
                    image_url:   self.image_url.map(|s| s.to_owned()),
                    language:    self.language.map(|s| s.to_owned()),
                    link_url:    self.link_url.map(|s| s.to_owned()),
                    status:      model::ModerationStatus::Draft.as_str().to_owned(),
                    title:       self.title.to_owned(),
                    visibility:  visibility.as_str().to_owned(),
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting podcast")
        })
    }

    //
    // Private functions
    //

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<model::Visibility> {
        if self.title.is_empty() {
            bail!(user_errors::validation("Please specify a title."));
        }

        if self.title.len() > TITLE_MAX_LENGTH {
            bail!(user_errors::validation(format!(
                "Title is too long (maximum is {} characters).",
                TITLE_MAX_LENGTH
            )));
        }

        // New podcasts start private unless the creator said otherwise.
        match self.visibility {
            Some(visibility) => model::Visibility::parse(visibility),
            None => Ok(model::Visibility::Private),
        }
    }
}

pub struct RunResult {
    pub podcast: model::Podcast,
}

//
// Private constants
//

// Mirrors the check constraint on the `podcast` table.
const TITLE_MAX_LENGTH: usize = 200;

//
// Tests
//
