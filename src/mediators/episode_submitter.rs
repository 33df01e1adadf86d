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

/// Moves an episode into the moderation queue. Same transition rules as
/// podcast submission.
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
        self.check_owner()?;
        self.check_status()?;
        let episode = self.update_episode(log)?;
        Ok(RunResult { episode })
    }

    //
    // Steps
    //

    fn update_episode(&mut self, log: &Logger) -> Result<model::Episode> {
        time_helpers::log_timed(&log.new(o!("step" => "update_episode")), |_log| {
            diesel::update(schema::episode::table)
                .filter(schema::episode::id.eq(self.episode.id))
                .set((
                    schema::episode::status.eq(ModerationStatus::PendingApproval.as_str()),
                    schema::episode::updated_at.eq(Utc::now()),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error updating episode status")
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

    fn check_status(&self) -> Result<()> {
        let status = ModerationStatus::parse(self.episode.status.as_str())?;
        match status {
            ModerationStatus::Draft | ModerationStatus::Rejected => Ok(()),
            ModerationStatus::PendingApproval => Err(user_errors::validation(
                "That episode has already been submitted for approval.",
            )),
            ModerationStatus::Approved => Err(user_errors::validation(
                "That episode has already been approved.",
            )),
        }
    }
}

pub struct RunResult {
    pub episode: model::Episode,
}

//
// Tests
//
