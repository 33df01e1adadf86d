use errors::*;
use model;
use schema;
use schema::episode;
use time_helpers;

use chrono::{DateTime, Utc};
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;
use url::Url;

/// Partial update of an episode's metadata. `None` fields are left
/// untouched. The episode's parent podcast must belong to the acting
/// account.
pub struct Mediator<'a> {
    pub account:          &'a model::Account,
    pub conn:             &'a PgConnection,
    pub description:      Option<&'a str>,
    pub duration_seconds: Option<i32>,
    pub episode:          &'a model::Episode,
    pub explicit:         Option<bool>,
    pub image_url:        Option<&'a str>,
    pub media_type:       Option<&'a str>,
    pub media_url:        Option<&'a str>,
    pub podcast:          &'a model::Podcast,
    pub title:            Option<&'a str>,
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
        let episode = self.update_episode(log)?;
        Ok(RunResult { episode })
    }

    //
    // Steps
    //

    fn update_episode(&mut self, log: &Logger) -> Result<model::Episode> {
        let changes = EpisodeChanges {
            description:      self.description.map(|s| s.to_owned()),
            duration_seconds: self.duration_seconds,
            explicit:         self.explicit,
            image_url:        self.image_url.map(|s| s.to_owned()),
            media_type:       self.media_type.map(|s| s.to_owned()),
            // A changed media file no longer has a known size; the backfill
            // will pick it up again.
            media_size_bytes: match self.media_url {
                Some(_) => Some(None),
                None => None,
            },
            media_url:  self.media_url.map(|s| s.to_owned()),
            title:      self.title.map(|s| s.to_owned()),
            updated_at: Utc::now(),
        };

        time_helpers::log_timed(&log.new(o!("step" => "update_episode")), |_log| {
            diesel::update(schema::episode::table)
                .filter(schema::episode::id.eq(self.episode.id))
                .set(&changes)
                .get_result(self.conn)
                .chain_err(|| "Error updating episode")
        })
    }

    //
    // Private functions
    //

    fn check_owner(&self) -> Result<()> {
        if self.podcast.account_id != self.account.id {
            bail!(user_errors::not_found("episode", self.episode.id));
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

        if let Some(media_url) = self.media_url {
            if let Err(ref e) = Url::parse(media_url) {
                bail!(user_errors::bad_parameter("media_url", e));
            }
        }

        if let Some(image_url) = self.image_url {
            if let Err(ref e) = Url::parse(image_url) {
                bail!(user_errors::bad_parameter("image_url", e));
            }
        }

        Ok(())
    }
}

pub struct RunResult {
    pub episode: model::Episode,
}

//
// Private types
//

#[derive(AsChangeset)]
#[table_name = "episode"]
struct EpisodeChanges {
    description:      Option<String>,
    duration_seconds: Option<i32>,
    explicit:         Option<bool>,
    image_url:        Option<String>,
    media_size_bytes: Option<Option<i64>>,
    media_type:       Option<String>,
    media_url:        Option<String>,
    title:            Option<String>,
    updated_at:       DateTime<Utc>,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::episode_updater::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_episode_update() {
        let mut bootstrap = TestBootstrap::new();

        let res = {
            let (mut mediator, log) = bootstrap.mediator(Args {
                media_url: None,
                title:     Some("A Better Title"),
            });
            mediator.run(&log).unwrap()
        };

        assert_eq!("A Better Title", res.episode.title);
        assert_eq!(bootstrap.episode.media_url, res.episode.media_url);
    }

    #[test]
    fn test_episode_update_media_url_resets_size() {
        let mut bootstrap = TestBootstrap::new();

        // Simulate a previously backfilled size
        diesel::update(schema::episode::table)
            .filter(schema::episode::id.eq(bootstrap.episode.id))
            .set(schema::episode::media_size_bytes.eq(Some(123_456_i64)))
            .execute(&*bootstrap.conn)
            .unwrap();

        let res = {
            let (mut mediator, log) = bootstrap.mediator(Args {
                media_url: Some("https://example.com/episode-1-v2.mp3"),
                title:     None,
            });
            mediator.run(&log).unwrap()
        };

        assert_eq!("https://example.com/episode-1-v2.mp3", res.episode.media_url);
        assert!(res.episode.media_size_bytes.is_none());
    }

    #[test]
    fn test_episode_update_not_owner() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.account = test_data::account::insert(&bootstrap.log, &bootstrap.conn);

        let (mut mediator, log) = bootstrap.mediator(Args {
            media_url: None,
            title:     Some("A Better Title"),
        });
        let res = mediator.run(&log);

        assert!(res.is_err());
    }

    //
    // Private types/functions
    //

    struct Args<'a> {
        media_url: Option<&'a str>,
        title:     Option<&'a str>,
    }

    struct TestBootstrap {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        episode: model::Episode,
        log:     Logger,
        podcast: model::Podcast,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert(&log, &conn);
            let podcast = test_data::podcast::insert_args(
                &log,
                &conn,
                test_data::podcast::Args {
                    account:    Some(&account),
                    visibility: None,
                },
            );
            let episode = test_data::episode::insert_args(
                &log,
                &conn,
                test_data::episode::Args {
                    podcast: Some(&podcast),
                },
            );

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                conn,
                episode,
                log,
                podcast,
            }
        }

        fn mediator<'b>(&'b mut self, args: Args<'b>) -> (Mediator<'b>, Logger) {
            (
                Mediator {
                    account:          &self.account,
                    conn:             &*self.conn,
                    description:      None,
                    duration_seconds: None,
                    episode:          &self.episode,
                    explicit:         None,
                    image_url:        None,
                    media_type:       None,
                    media_url:        args.media_url,
                    podcast:          &self.podcast,
                    title:            args.title,
                },
                self.log.clone(),
            )
        }
    }
}
