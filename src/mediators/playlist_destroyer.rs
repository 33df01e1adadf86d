use errors::*;
use model;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

pub struct Mediator<'a> {
    pub account:  &'a model::Account,
    pub conn:     &'a PgConnection,
    pub playlist: &'a model::Playlist,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_owner()?;
        let num_playlist_episode_deleted = self.delete_playlist_episode(log)?;
        let num_playlist_deleted = self.delete_playlist(log)?;
        Ok(RunResult {
            num_playlist_deleted,
            num_playlist_episode_deleted,
        })
    }

    //
    // Steps
    //

    fn delete_playlist(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_playlist")), |_log| {
            diesel::delete(
                schema::playlist::table.filter(schema::playlist::id.eq(self.playlist.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting playlist")
        })
    }

    fn delete_playlist_episode(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_playlist_episode")), |_log| {
            diesel::delete(
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::playlist_id.eq(self.playlist.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting playlist episodes")
        })
    }

    //
    // Private functions
    //

    fn check_owner(&self) -> Result<()> {
        if self.playlist.account_id != self.account.id {
            bail!(user_errors::not_found("playlist", self.playlist.id));
        }
        Ok(())
    }
}

pub struct RunResult {
    pub num_playlist_deleted:         usize,
    pub num_playlist_episode_deleted: usize,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::playlist_destroyer::*;
    use mediators::playlist_episode_adder;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_playlist_destroy() {
        let mut bootstrap = TestBootstrap::new();

        let episode = test_data::episode::insert(&bootstrap.log, &bootstrap.conn);
        playlist_episode_adder::Mediator {
            account:  &bootstrap.account,
            conn:     &*bootstrap.conn,
            episode:  &episode,
            playlist: &bootstrap.playlist,
        }.run(&bootstrap.log)
            .unwrap();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(1, res.num_playlist_deleted);
        assert_eq!(1, res.num_playlist_episode_deleted);
    }

    #[test]
    fn test_playlist_destroy_not_owner() {
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
        _common:  test_helpers::CommonTestBootstrap,
        account:  model::Account,
        conn:     PooledConnection<ConnectionManager<PgConnection>>,
        log:      Logger,
        playlist: model::Playlist,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert(&log, &conn);
            let playlist = test_data::playlist::insert_args(
                &log,
                &conn,
                test_data::playlist::Args {
                    account: Some(&account),
                },
            );

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                conn,
                log,
                playlist,
            }
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    account:  &self.account,
                    conn:     &*self.conn,
                    playlist: &self.playlist,
                },
                self.log.clone(),
            )
        }
    }
}
