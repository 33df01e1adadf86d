use errors::*;
use model;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Deletes a podcast and everything hanging off of it. Owners can delete
/// their own podcasts; admins can delete anything (that's the moderation
/// "delete" action).
pub struct Mediator<'a> {
    pub account: &'a model::Account,
    pub conn:    &'a PgConnection,
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

        // The foreign keys cascade, but deleting dependents explicitly gets us
        // accurate counts to hand back and log.
        let num_playlist_episode_deleted = self.delete_playlist_episode(log)?;
        let num_invitation_deleted = self.delete_invitation(log)?;
        let num_subscription_deleted = self.delete_subscription(log)?;
        let num_episode_deleted = self.delete_episode(log)?;
        let num_podcast_deleted = self.delete_podcast(log)?;

        Ok(RunResult {
            num_episode_deleted,
            num_invitation_deleted,
            num_playlist_episode_deleted,
            num_podcast_deleted,
            num_subscription_deleted,
        })
    }

    //
    // Steps
    //

    fn delete_episode(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_episode")), |_log| {
            diesel::delete(
                schema::episode::table
                    .filter(schema::episode::podcast_id.eq(self.podcast.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting episodes")
        })
    }

    fn delete_invitation(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_invitation")), |_log| {
            diesel::delete(
                schema::content_invitation::table
                    .filter(schema::content_invitation::podcast_id.eq(self.podcast.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting invitations")
        })
    }

    fn delete_playlist_episode(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_playlist_episode")), |_log| {
            let episode_ids = schema::episode::table
                .select(schema::episode::id)
                .filter(schema::episode::podcast_id.eq(self.podcast.id));
            diesel::delete(
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::episode_id.eq_any(episode_ids)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting playlist episodes")
        })
    }

    fn delete_podcast(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_podcast")), |_log| {
            diesel::delete(
                schema::podcast::table.filter(schema::podcast::id.eq(self.podcast.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting podcast")
        })
    }

    fn delete_subscription(&mut self, log: &Logger) -> Result<usize> {
        time_helpers::log_timed(&log.new(o!("step" => "delete_subscription")), |_log| {
            diesel::delete(
                schema::subscription::table
                    .filter(schema::subscription::podcast_id.eq(self.podcast.id)),
            ).execute(self.conn)
                .chain_err(|| "Error deleting subscriptions")
        })
    }

    //
    // Private functions
    //

    fn check_access(&self) -> Result<()> {
        if self.podcast.account_id != self.account.id && !self.account.admin {
            bail!(user_errors::not_found("podcast", self.podcast.id));
        }
        Ok(())
    }
}

pub struct RunResult {
    pub num_episode_deleted:          usize,
    pub num_invitation_deleted:       usize,
    pub num_playlist_episode_deleted: usize,
    pub num_podcast_deleted:          usize,
    pub num_subscription_deleted:     usize,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::podcast_destroyer::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_podcast_destroy() {
        let mut bootstrap = TestBootstrap::new();

        test_data::episode::insert_args(
            &bootstrap.log,
            &bootstrap.conn,
            test_data::episode::Args {
                podcast: Some(&bootstrap.podcast),
            },
        );

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(1, res.num_podcast_deleted);
        assert_eq!(1, res.num_episode_deleted);
        assert_eq!(0, res.num_subscription_deleted);
    }

    #[test]
    fn test_podcast_destroy_admin() {
        let mut bootstrap = TestBootstrap::new();

        bootstrap.account = test_data::account::insert_args(
            &bootstrap.log,
            &bootstrap.conn,
            test_data::account::Args {
                admin: true,
                email: None,
            },
        );

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(1, res.num_podcast_deleted);
    }

    #[test]
    fn test_podcast_destroy_not_owner() {
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

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account,
                conn,
                log,
                podcast,
            }
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    account: &self.account,
                    conn:    &*self.conn,
                    podcast: &self.podcast,
                },
                self.log.clone(),
            )
        }
    }
}
