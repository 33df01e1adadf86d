use errors::*;
use model;
use schema;
use schema::podcast;
use time_helpers;

use chrono::{DateTime, Utc};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Partial update of a podcast's metadata. `None` fields are left untouched.
pub struct Mediator<'a> {
    pub account:     &'a model::Account,
    pub conn:        &'a PgConnection,
    pub description: Option<&'a str>,
    pub image_url:   Option<&'a str>,
    pub language:    Option<&'a str>,
    pub link_url:    Option<&'a str>,
    pub podcast:     &'a model::Podcast,
    pub title:       Option<&'a str>,
    pub visibility:  Option<&'a str>,
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
        let podcast = self.update_podcast(log)?;
        Ok(RunResult { podcast })
    }

    //
    // Steps
    //

    fn update_podcast(&mut self, log: &Logger) -> Result<model::Podcast> {
        let changes = PodcastChanges {
            description: self.description.map(|s| s.to_owned()),
            image_url:   self.image_url.map(|s| s.to_owned()),
            language:    self.language.map(|s| s.to_owned()),
            link_url:    self.link_url.map(|s| s.to_owned()),
            title:       self.title.map(|s| s.to_owned()),
            updated_at:  Utc::now(),
            visibility:  self.visibility.map(|s| s.to_owned()),
        };

        time_helpers::log_timed(&log.new(o!("step" => "update_podcast")), |_log| {
            diesel::update(schema::podcast::table)
                .filter(schema::podcast::id.eq(self.podcast.id))
                .set(&changes)
                .get_result(self.conn)
                .chain_err(|| "Error updating podcast")
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
        if let Some(title) = self.title {
            if title.is_empty() {
                bail!(user_errors::validation("Please specify a title."));
            }
        }

        if let Some(visibility) = self.visibility {
            model::Visibility::parse(visibility)?;
        }

        Ok(())
    }
}

pub struct RunResult {
    pub podcast: model::Podcast,
}

//
// Private types
//

// `None` fields are skipped by the changeset, which is what makes partial
// updates work.
#[derive(AsChangeset)]
#[table_name = "podcast"]
struct PodcastChanges {
    description: Option<String>,
    image_url:   Option<String>,
    language:    Option<String>,
    link_url:    Option<String>,
    title:       Option<String>,
    updated_at:  DateTime<Utc>,
    visibility:  Option<String>,
}

//
// Tests
//
