use errors::*;
use model;
use model::Visibility;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Loads a podcast on behalf of a caller, enforcing the platform's access
/// rules:
///
/// * Owners and admins can always see their content.
/// * Everyone else only sees approved content.
/// * Public and unlisted podcasts are reachable by anyone holding the link.
/// * Private podcasts additionally require an accepted invitation.
///
/// Inaccessible content is indistinguishable from missing content on
/// purpose: both produce a user-facing "not found".
pub struct Mediator<'a> {
    pub account:    Option<&'a model::Account>,
    pub conn:       &'a PgConnection,
    pub podcast_id: i64,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let podcast = self.select_podcast(log)?;
        if podcast.is_none() {
            bail!(user_errors::not_found("podcast", self.podcast_id));
        }
        let podcast = podcast.unwrap();

        self.check_access(log, &podcast)?;
        Ok(RunResult { podcast })
    }

    //
    // Steps
    //

    fn check_access(&mut self, log: &Logger, podcast: &model::Podcast) -> Result<()> {
        if let Some(account) = self.account {
            if account.admin || account.id == podcast.account_id {
                return Ok(());
            }
        }

        if !podcast.is_approved() {
            bail!(user_errors::not_found("podcast", self.podcast_id));
        }

        match Visibility::parse(podcast.visibility.as_str())? {
            Visibility::Public | Visibility::Unlisted => Ok(()),
            Visibility::Private => {
                if self.select_invitation_exists(log, podcast)? {
                    Ok(())
                } else {
                    Err(user_errors::not_found("podcast", self.podcast_id))
                }
            }
        }
    }

    fn select_invitation_exists(
        &mut self,
        log: &Logger,
        podcast: &model::Podcast,
    ) -> Result<bool> {
        let account = match self.account {
            Some(account) => account,
            None => return Ok(false),
        };

        time_helpers::log_timed(&log.new(o!("step" => "select_invitation_exists")), |_log| {
            diesel::select(diesel::dsl::exists(
                schema::content_invitation::table
                    .filter(schema::content_invitation::podcast_id.eq(podcast.id))
                    .filter(schema::content_invitation::account_id.eq(account.id))
                    .filter(schema::content_invitation::accepted_at.is_not_null()),
            )).get_result(self.conn)
                .chain_err(|| "Error checking invitation existence")
        })
    }

    fn select_podcast(&mut self, log: &Logger) -> Result<Option<model::Podcast>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_podcast")), |_log| {
            schema::podcast::table
                .filter(schema::podcast::id.eq(self.podcast_id))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting podcast")
        })
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
    use mediators::podcast_accessor::*;
    use mediators::invitation_accepter;
    use mediators::moderation_batcher;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_podcast_access_owner_draft() {
        let mut bootstrap = TestBootstrap::new("private");
        let account = bootstrap.account.clone();

        let (mut mediator, log) = bootstrap.mediator(Some(&account));
        let res = mediator.run(&log).unwrap();
        assert_eq!(bootstrap.podcast.id, res.podcast.id);
    }

    #[test]
    fn test_podcast_access_admin_draft() {
        let mut bootstrap = TestBootstrap::new("private");
        let admin = test_data::account::insert_args(
            &bootstrap.log,
            &bootstrap.conn,
            test_data::account::Args {
                admin: true,
                email: None,
            },
        );

        let (mut mediator, log) = bootstrap.mediator(Some(&admin));
        assert!(mediator.run(&log).is_ok());
    }

    #[test]
    fn test_podcast_access_anonymous_unapproved() {
        let mut bootstrap = TestBootstrap::new("public");

        let (mut mediator, log) = bootstrap.mediator(None);
        let res = mediator.run(&log);
        assert!(res.is_err());
    }

    #[test]
    fn test_podcast_access_anonymous_approved_public() {
        let mut bootstrap = TestBootstrap::new("public");
        bootstrap.approve();

        let (mut mediator, log) = bootstrap.mediator(None);
        assert!(mediator.run(&log).is_ok());
    }

    #[test]
    fn test_podcast_access_anonymous_approved_unlisted() {
        let mut bootstrap = TestBootstrap::new("unlisted");
        bootstrap.approve();

        let (mut mediator, log) = bootstrap.mediator(None);
        assert!(mediator.run(&log).is_ok());
    }

    #[test]
    fn test_podcast_access_private_without_invitation() {
        let mut bootstrap = TestBootstrap::new("private");
        bootstrap.approve();
        let listener = test_data::account::insert(&bootstrap.log, &bootstrap.conn);

        let (mut mediator, log) = bootstrap.mediator(Some(&listener));
        assert!(mediator.run(&log).is_err());
    }

    #[test]
    fn test_podcast_access_private_with_invitation() {
        let mut bootstrap = TestBootstrap::new("private");
        bootstrap.approve();

        let listener = test_data::account::insert(&bootstrap.log, &bootstrap.conn);
        let invitation = test_data::content_invitation::insert_args(
            &bootstrap.log,
            &bootstrap.conn,
            test_data::content_invitation::Args {
                podcast: Some(&bootstrap.podcast),
            },
        );
        invitation_accepter::Mediator {
            account: &listener,
            conn:    &*bootstrap.conn,
            token:   invitation.token.as_str(),
        }.run(&bootstrap.log)
            .unwrap();

        let (mut mediator, log) = bootstrap.mediator(Some(&listener));
        assert!(mediator.run(&log).is_ok());
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
        fn new(visibility: &str) -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            let account = test_data::account::insert(&log, &conn);
            let podcast = test_data::podcast::insert_args(
                &log,
                &conn,
                test_data::podcast::Args {
                    account:    Some(&account),
                    visibility: Some(visibility),
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

        fn approve(&mut self) {
            let admin = test_data::account::insert_args(
                &self.log,
                &self.conn,
                test_data::account::Args {
                    admin: true,
                    email: None,
                },
            );

            // Submit, then approve through the real moderation path.
            diesel::update(schema::podcast::table)
                .filter(schema::podcast::id.eq(self.podcast.id))
                .set(schema::podcast::status
                    .eq(model::ModerationStatus::PendingApproval.as_str()))
                .execute(&*self.conn)
                .unwrap();

            moderation_batcher::Mediator {
                account: &admin,
                action:  moderation_batcher::Action::Approve,
                conn:    &*self.conn,
                ids:     &[self.podcast.id],
                target:  moderation_batcher::Target::Podcasts,
            }.run(&self.log)
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
                    podcast_id: self.podcast.id,
                },
                self.log.clone(),
            )
        }
    }
}
