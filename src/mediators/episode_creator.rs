use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use chrono::{DateTime, Utc};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand;
use rand::distributions::Alphanumeric;
use slog::Logger;
use std::iter;
use url::Url;

pub struct Mediator<'a> {
    pub account:          &'a model::Account,
    pub conn:             &'a PgConnection,
    pub description:      Option<&'a str>,
    pub duration_seconds: Option<i32>,
    pub explicit:         Option<bool>,
    pub guid:             Option<&'a str>,
    pub image_url:        Option<&'a str>,
    pub media_type:       Option<&'a str>,
    pub media_url:        &'a str,
    pub podcast:          &'a model::Podcast,
    pub published_at:     Option<DateTime<Utc>>,
    pub title:            &'a str,
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
        let guid = self.resolve_guid(log)?;
        let episode = self.insert_episode(log, guid)?;
        Ok(RunResult { episode })
    }

    //
    // Steps
    //

    fn insert_episode(&mut self, log: &Logger, guid: String) -> Result<model::Episode> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_episode")), |_log| {
            diesel::insert_into(schema::episode::table)
                .values(&insertable::Episode {
                    description:      self.description.map(|s| s.to_owned()),
                    duration_seconds: self.duration_seconds,
                    explicit:         self.explicit,
                    guid:             guid,
                    image_url:        self.image_url.map(|s| s.to_owned()),
                    media_type:       self.media_type.map(|s| s.to_owned()),
                    media_url:        self.media_url.to_owned(),
                    podcast_id:       self.podcast.id,
                    published_at:     self.published_at.unwrap_or_else(Utc::now),
                    status:           model::ModerationStatus::Draft.as_str().to_owned(),
                    title:            self.title.to_owned(),
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting episode")
        })
    }

    /// Either takes the GUID handed in by the publisher or generates a random
    /// one. GUIDs only need to be unique within their podcast, but random
    /// ones are generated long enough to be globally unique in practice.
    fn resolve_guid(&mut self, log: &Logger) -> Result<String> {
        use rand::Rng;

        if let Some(guid) = self.guid {
            let exists =
                time_helpers::log_timed(&log.new(o!("step" => "select_existing_guid")), |_log| {
                    diesel::select(diesel::dsl::exists(
                        schema::episode::table
                            .filter(schema::episode::podcast_id.eq(self.podcast.id))
                            .filter(schema::episode::guid.eq(guid)),
                    )).get_result::<bool>(self.conn)
                        .chain_err(|| "Error checking GUID existence")
                })?;

            if exists {
                bail!(user_errors::validation(
                    "An episode with that GUID already exists for this podcast."
                ));
            }

            return Ok(guid.to_owned());
        }

        let mut rng = rand::thread_rng();
        Ok(iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .take(GUID_LENGTH)
            .collect())
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
        if self.title.is_empty() {
            bail!(user_errors::validation("Please specify a title."));
        }

        if self.media_url.is_empty() {
            bail!(user_errors::validation("Please specify a media URL."));
        }

        if let Err(ref e) = Url::parse(self.media_url) {
            bail!(user_errors::bad_parameter("media_url", e));
        }

        if let Some(image_url) = self.image_url {
            if let Err(ref e) = Url::parse(image_url) {
                bail!(user_errors::bad_parameter("image_url", e));
            }
        }

        if let Some(duration_seconds) = self.duration_seconds {
            if duration_seconds < 0 {
                bail!(user_errors::validation("Duration can't be negative."));
            }
        }

        Ok(())
    }
}

pub struct RunResult {
    pub episode: model::Episode,
}

//
// Private constants
//

const GUID_LENGTH: usize = 30;

//
// Tests
//
