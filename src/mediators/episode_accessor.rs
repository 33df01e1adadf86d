use errors::*;
use mediators::podcast_accessor;
use model;
use schema;
use time_helpers;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Loads an episode on behalf of a caller. Access follows the parent
/// podcast's rules, and on top of that non-owners only ever see approved
/// episodes.
pub struct Mediator<'a> {
    pub account:    Option<&'a model::Account>,
    pub conn:       &'a PgConnection,
    pub episode_id: i64,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let episode = self.select_episode(log)?;
        if episode.is_none() {
            bail!(user_errors::not_found("episode", self.episode_id));
        }
        let episode = episode.unwrap();

        let podcast = podcast_accessor::Mediator {
            account:    self.account,
            conn:       self.conn,
            podcast_id: episode.podcast_id,
        }.run(log)
            .map_err(|e| self.remap_not_found(e))?
            .podcast;

        if !self.is_owner_or_admin(&podcast) && !episode.is_approved() {
            bail!(user_errors::not_found("episode", self.episode_id));
        }

        Ok(RunResult { episode, podcast })
    }

    //
    // Steps
    //

    fn select_episode(&mut self, log: &Logger) -> Result<Option<model::Episode>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_episode")), |_log| {
            schema::episode::table
                .filter(schema::episode::id.eq(self.episode_id))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting episode")
        })
    }

    //
    // Private functions
    //

    fn is_owner_or_admin(&self, podcast: &model::Podcast) -> bool {
        match self.account {
            Some(account) => account.admin || account.id == podcast.account_id,
            None => false,
        }
    }

    /// An inaccessible parent podcast should read as a missing *episode* to
    /// the caller -- we don't want to leak that the podcast exists.
    fn remap_not_found(&self, e: Error) -> Error {
        match e {
            Error(ErrorKind::User(_), _) => user_errors::not_found("episode", self.episode_id),
            e => e,
        }
    }
}

pub struct RunResult {
    pub episode: model::Episode,
    pub podcast: model::Podcast,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::episode_accessor::*;
    use test_data;
    use test_helpers;

    use diesel;
    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_episode_access_owner() {
        let mut bootstrap = TestBootstrap::new();
        let account = bootstrap.account.clone();

        let (mut mediator, log) = bootstrap.mediator(Some(&account));
        let res = mediator.run(&log).unwrap();

        assert_eq!(bootstrap.episode.id, res.episode.id);
        assert_eq!(bootstrap.podcast.id, res.podcast.id);
    }

    #[test]
    fn test_episode_access_anonymous_unapproved() {
        let mut bootstrap = TestBootstrap::new();

        let (mut mediator, log) = bootstrap.mediator(None);
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            format!(
                "Not found: resource \"episode\" with ID {} was not found.",
                bootstrap.episode.id
            ),
            format!("{}", e)
        );
    }

    #[test]
    fn test_episode_access_anonymous_approved() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.approve_all();

        let (mut mediator, log) = bootstrap.mediator(None);
        let res = mediator.run(&log).unwrap();
        assert_eq!(bootstrap.episode.id, res.episode.id);
    }

    #[test]
    fn test_episode_access_anonymous_podcast_approved_episode_draft() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.approve_podcast();

        let (mut mediator, log) = bootstrap.mediator(None);
        assert!(mediator.run(&log).is_err());
    }

    //
    // Private types/functions
    //

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
                    visibility: Some("public"),
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

        fn approve_podcast(&mut self) {
            diesel::update(schema::podcast::table)
                .filter(schema::podcast::id.eq(self.podcast.id))
                .set(schema::podcast::status.eq(model::ModerationStatus::Approved.as_str()))
                .execute(&*self.conn)
                .unwrap();
        }

        fn approve_all(&mut self) {
            self.approve_podcast();
            diesel::update(schema::episode::table)
                .filter(schema::episode::id.eq(self.episode.id))
                .set(schema::episode::status.eq(model::ModerationStatus::Approved.as_str()))
                .execute(&*self.conn)
                .unwrap();
        }

        fn mediator<'b>(
            &'b mut self,
            account: Option<&'b model::Account>,
        ) -> (Mediator<'b>, Logger) {
            (
                Mediator {
                    account:    account,
                    conn:       &*self.conn,
                    episode_id: self.episode.id,
                },
                self.log.clone(),
            )
        }
    }
}
