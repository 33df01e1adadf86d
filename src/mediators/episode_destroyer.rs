use errors::*;
use model;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Deletes an episode along with any playlist entries that point at it.
/// Owners can delete their own episodes; admins can delete anything.
pub struct Mediator<'a> {
    pub account: &'a model::Account,
    pub conn:    &'a PgConnection,
    pub episode: &'a model::Episode,
    pub podcast: &'a model::Podcast,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_access()?;
        let num_playlist_episode_deleted = self.delete_playlist_episode(log)?;
        let num_episode_deleted = self.delete_episode(log)?;
        Ok(RunResult {
            num_episode_deleted,
            num_playlist_episode_deleted,
        })
    }

    //
    // Steps
    //

    fn delete_episode(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_episode")), |_log| {
            diesel::delete(
                schema::episode::table.filter(schema::episode::id.eq(self.episode.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting episode")
        })
    }

    fn delete_playlist_episode(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_playlist_episode")), |_log| {
            diesel::delete(
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::episode_id.eq(self.episode.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting playlist episodes")
        })
    }

    //
    // Private functions
    //

    fn check_access(&self) -> Result<()> {
        if self.podcast.account_id != self.account.id && !self.account.admin {
            bail!(user_errors::not_found("episode", self.episode.id));
        }
        Ok(())
    }
}

pub struct RunResult {
    pub num_episode_deleted:          usize,
    pub num_playlist_episode_deleted: usize,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::episode_destroyer::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_episode_destroy() {
        let mut bootstrap = TestBootstrap::new();
        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(1, res.num_episode_deleted);
        assert_eq!(0, res.num_playlist_episode_deleted);
    }

    #[test]
    fn test_episode_destroy_not_owner() {
        let mut bootstrap = TestBootstrap::new();
        bootstrap.account = test_data::account::insert(&bootstrap.log, &bootstrap.conn);

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        assert!(res.is_err());
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

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    account: &self.account,
                    conn:    &*self.conn,
                    episode: &self.episode,
                    podcast: &self.podcast,
                },
                self.log.clone(),
            )
        }
    }
}
