use errors::*;
use model;
use model::ModerationStatus;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Moves a podcast into the moderation queue. Only draft and rejected
/// podcasts can be submitted; anything else is already in or through the
/// queue.
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
        self.check_owner()?;
        self.check_status()?;
        let podcast = self.update_podcast(log)?;
        Ok(RunResult { podcast })
    }

    //
    // Steps
    //

    fn update_podcast(&mut self, log: &Logger) -> Result<model::Podcast> {
        time_helpers::log_timed(&log.new(o!("step" => "update_podcast")), |_log| {
            diesel::update(schema::podcast::table)
                .filter(schema::podcast::id.eq(self.podcast.id))
                .set((
                    schema::podcast::status.eq(ModerationStatus::PendingApproval.as_str()),
                    schema::podcast::updated_at.eq(Utc::now()),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error updating podcast status")
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

    fn check_status(&self) -> Result<()> {
        let status = ModerationStatus::parse(self.podcast.status.as_str())?;
        match status {
            ModerationStatus::Draft | ModerationStatus::Rejected => Ok(()),
            ModerationStatus::PendingApproval => Err(user_errors::validation(
                "That podcast has already been submitted for approval.",
            )),
            ModerationStatus::Approved => Err(user_errors::validation(
                "That podcast has already been approved.",
            )),
        }
    }
}

pub struct RunResult {
    pub podcast: model::Podcast,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::podcast_submitter::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_podcast_submit() {
        let mut bootstrap = TestBootstrap::new();
        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(
            ModerationStatus::PendingApproval.as_str(),
            res.podcast.status.as_str()
        );
    }

    #[test]
    fn test_podcast_submit_after_rejection() {
        let mut bootstrap = TestBootstrap::new();

        diesel::update(schema::podcast::table)
            .filter(schema::podcast::id.eq(bootstrap.podcast.id))
            .set(schema::podcast::status.eq(ModerationStatus::Rejected.as_str()))
            .execute(&*bootstrap.conn)
            .unwrap();
        bootstrap.podcast.status = ModerationStatus::Rejected.as_str().to_owned();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_eq!(
            ModerationStatus::PendingApproval.as_str(),
            res.podcast.status.as_str()
        );
    }

    #[test]
    fn test_podcast_submit_invalid_already_submitted() {
        let mut bootstrap = TestBootstrap::new();

        {
            let (mut mediator, log) = bootstrap.mediator();
            mediator.run(&log).unwrap();
        }
        bootstrap.podcast.status = ModerationStatus::PendingApproval.as_str().to_owned();

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Validation failed: That podcast has already been submitted for approval.",
            format!("{}", e).as_str()
        );
    }

    #[test]
    fn test_podcast_submit_not_owner() {
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
