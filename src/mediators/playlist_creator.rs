use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

pub struct Mediator<'a> {
    pub account:     &'a model::Account,
    pub conn:        &'a PgConnection,
    pub description: Option<&'a str>,
    pub title:       &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.params_validate()?;
        self.check_existing_playlist(log)?;
        let playlist = self.insert_playlist(log)?;
        Ok(RunResult { playlist })
    }

    //
    // Steps
    //

    fn insert_playlist(&mut self, log: &Logger) -> Result<model::Playlist> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_playlist")), |_log| {
            diesel::insert_into(schema::playlist::table)
                .values(&insertable::Playlist {
                    account_id:  self.account.id,
                    description: self.description.map(|s| s.to_owned()),
                    title:       self.title.to_owned(),
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting playlist")
        })
    }

    //
    // Private functions
    //

    /// Checks whether this account already has a playlist with the given
    /// title.
    ///
    /// This isn't strictly necessary because our `UNIQUE` constraint will
    /// protect us regardless, but this gives the user a much better error.
    fn check_existing_playlist(&self, log: &Logger) -> Result<()> {
        let title_exists =
            time_helpers::log_timed(&log.new(o!("step" => "select_existing_playlist")), |_log| {
                diesel::select(diesel::dsl::exists(
                    schema::playlist::table
                        .filter(schema::playlist::account_id.eq(self.account.id))
                        .filter(schema::playlist::title.eq(self.title)),
                )).get_result(self.conn)
                    .chain_err(|| "Error checking playlist existence")
            })?;

        if title_exists {
            bail!(user_errors::validation(
                "You already have a playlist with that title."
            ));
        }

        Ok(())
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        if self.title.is_empty() {
            bail!(user_errors::validation("Please specify a title."));
        }

        Ok(())
    }
}

pub struct RunResult {
    pub playlist: model::Playlist,
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use mediators::playlist_creator::*;
    use test_data;
    use test_helpers;

    use r2d2::PooledConnection;
    use r2d2_diesel::ConnectionManager;

    #[test]
    fn test_playlist_create() {
        let mut bootstrap = TestBootstrap::new(Args {
            title: "Morning Commute",
        });
        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log).unwrap();

        assert_ne!(0, res.playlist.id);
        assert_eq!(bootstrap.account.id, res.playlist.account_id);
        assert_eq!("Morning Commute", res.playlist.title);
    }

    #[test]
    fn test_playlist_create_invalid_empty_title() {
        let mut bootstrap = TestBootstrap::new(Args { title: "" });
        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Validation failed: Please specify a title.",
            format!("{}", e).as_str()
        );
    }

    #[test]
    fn test_playlist_create_invalid_duplicate_title() {
        let mut bootstrap = TestBootstrap::new(Args {
            title: "Morning Commute",
        });

        {
            let (mut mediator, log) = bootstrap.mediator();
            mediator.run(&log).unwrap();
        }

        let (mut mediator, log) = bootstrap.mediator();
        let res = mediator.run(&log);

        let e = res.err().unwrap();
        assert_eq!(
            "Validation failed: You already have a playlist with that title.",
            format!("{}", e).as_str()
        );
    }

    //
    // Private types/functions
    //

    struct Args<'a> {
        title: &'a str,
    }

    struct TestBootstrap<'a> {
        _common: test_helpers::CommonTestBootstrap,
        account: model::Account,
        args:    Args<'a>,
        conn:    PooledConnection<ConnectionManager<PgConnection>>,
        log:     Logger,
    }

    impl<'a> TestBootstrap<'a> {
        fn new(args: Args) -> TestBootstrap {
            let conn = test_helpers::connection();
            let log = test_helpers::log();

            TestBootstrap {
                _common: test_helpers::CommonTestBootstrap::new(),
                account: test_data::account::insert(&log, &conn),
                args,
                conn,
                log,
            }
        }

        fn mediator(&mut self) -> (Mediator, Logger) {
            (
                Mediator {
                    account:     &self.account,
                    conn:        &*self.conn,
                    description: None,
                    title:       self.args.title,
                },
                self.log.clone(),
            )
        }
    }
}
