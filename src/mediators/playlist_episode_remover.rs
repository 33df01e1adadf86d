use errors::*;
use model;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Removes an episode from a playlist and compacts the positions of the
/// entries that followed it so that positions stay contiguous from zero.
pub struct Mediator<'a> {
    pub account:    &'a model::Account,
    pub conn:       &'a PgConnection,
    pub episode_id: i64,
    pub playlist:   &'a model::Playlist,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_owner()?;

        let removed = self.select_playlist_episode(log)?;
        if removed.is_none() {
            return Ok(RunResult { num_deleted: 0 });
        }
        let removed = removed.unwrap();

        let num_deleted = self.delete_playlist_episode(log, &removed)?;
        self.compact_positions(log, &removed)?;

        Ok(RunResult { num_deleted })
    }

    //
    // Steps
    //

    fn compact_positions(
        &mut self,
        log: &Logger,
        removed: &model::PlaylistEpisode,
    ) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "compact_positions")), |_log| {
            diesel::update(
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::playlist_id.eq(self.playlist.id))
                    .filter(schema::playlist_episode::position.gt(removed.position)),
            ).set(
                schema::playlist_episode::position.eq(schema::playlist_episode::position - 1),
            )
                .execute(self.conn)
                .chain_err(|| "Error compacting playlist positions")
        })
    }

    fn delete_playlist_episode(
        &mut self,
        log: &Logger,
        removed: &model::PlaylistEpisode,
    ) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_playlist_episode")), |_log| {
            diesel::delete(
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::id.eq(removed.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting playlist episode")
        })
    }

    fn select_playlist_episode(
        &mut self,
        log: &Logger,
    ) -> Result<Option<model::PlaylistEpisode>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_playlist_episode")), |_log| {
            schema::playlist_episode::table
                .filter(schema::playlist_episode::playlist_id.eq(self.playlist.id))
                .filter(schema::playlist_episode::episode_id.eq(self.episode_id))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting playlist episode")
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
    pub num_deleted: usize,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::playlist_episode_adder;
    use mediators::playlist_episode_remover::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_playlist_episode_remove() {
        let mut bootstrap = TestBootstrap::new();
        let episodes = bootstrap.add_episodes(3);

        // Remove the middle entry
        let (mut mediator, log) = bootstrap.mediator(episodes[1].id);
        let res = mediator.run(&log).unwrap();
        assert_eq!(1, res.num_deleted);

        // Remaining entries stay contiguous from zero
        let positions: Vec<(i64, i32)> = schema::playlist_episode::table
            .filter(schema::playlist_episode::playlist_id.eq(bootstrap.playlist.id))
            .select((
                schema::playlist_episode::episode_id,
                schema::playlist_episode::position,
            ))
            .order(schema::playlist_episode::position)
            .load(&*bootstrap.conn)
            .unwrap();
        assert_eq!(vec![(episodes[0].id, 0), (episodes[2].id, 1)], positions);
    }

    #[test]
    fn test_playlist_episode_remove_missing() {
        let mut bootstrap = TestBootstrap::new();
        let episodes = bootstrap.add_episodes(1);

        {
            let (mut mediator, log) = bootstrap.mediator(episodes[0].id);
            mediator.run(&log).unwrap();
        }

        // Already gone; removing again is a no-op
        let (mut mediator, log) = bootstrap.mediator(episodes[0].id);
        let res = mediator.run(&log).unwrap();
        assert_eq!(0, res.num_deleted);
    }

    #[test]
    fn test_playlist_episode_remove_not_owner() {
        let mut bootstrap = TestBootstrap::new();
        let episodes = bootstrap.add_episodes(1);
        bootstrap.account = test_data::account::insert(&bootstrap.log, &bootstrap.conn);

        let (mut mediator, log) = bootstrap.mediator(episodes[0].id);
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
        podcast:  model::Podcast,
    }

    impl TestBootstrap {
        fn new() -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert(&log, &conn);
            let podcast = test_data::podcast::insert(&log, &conn);
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
                podcast,
            }
        }

        fn add_episodes(&mut self, n: usize) -> Vec<model::Episode> {
            let mut episodes = Vec::with_capacity(n);
            for _i in 0..n {
                let episode = test_data::episode::insert_args(
                    &self.log,
                    &self.conn,
                    test_data::episode::Args {
                        podcast: Some(&self.podcast),
                    },
                );
                playlist_episode_adder::Mediator {
                    account:  &self.account,
                    conn:     &*self.conn,
                    episode:  &episode,
                    playlist: &self.playlist,
                }.run(&self.log)
                    .unwrap();
                episodes.push(episode);
            }
            episodes
        }

        fn mediator(&mut self, episode_id: i64) -> (Mediator, Logger) {
            (
                Mediator {
                    account:    &self.account,
                    conn:       &*self.conn,
                    episode_id: episode_id,
                    playlist:   &self.playlist,
                },
                self.log.clone(),
            )
        }
    }
}
