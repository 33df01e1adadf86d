use errors::*;
use mediators::episode_destroyer;
use mediators::podcast_destroyer;
use model;
use model::ModerationStatus;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Applies a moderation action (approve, reject, or delete) to a batch of
/// podcasts or episodes. Admin only.
///
/// Every item runs in its own transaction: one bad ID never takes down the
/// rest of the batch. The result carries a per-item outcome so that the
/// caller can report exactly which IDs failed and why.
pub struct Mediator<'a> {
    pub account: &'a model::Account,
    pub action:  Action,
    pub conn:    &'a PgConnection,
    pub ids:     &'a [i64],
    pub target:  Target,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| self.run_inner(log))
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        self.check_admin()?;
        self.params_validate()?;

        let mut results = Vec::with_capacity(self.ids.len());
        for &id in self.ids {
            let log = log.new(o!("item_id" => id));
            let res = self.conn
                .transaction::<_, Error, _>(|| self.apply_item(&log, id));

            results.push(match res {
                Ok(()) => ItemResult {
                    id:      id,
                    message: None,
                    ok:      true,
                },
                Err(e) => {
                    let message = match e {
                        Error(ErrorKind::User(ref kind), _) => format!("{}", kind),
                        ref e => {
                            // Non-user errors shouldn't leak details to the
                            // caller, but they should be visible in logs.
                            error!(log, "Error applying moderation action: {}", e);
                            "Internal error applying action.".to_owned()
                        }
                    };
                    ItemResult {
                        id:      id,
                        message: Some(message),
                        ok:      false,
                    }
                }
            });
        }

        let num_succeeded = results.iter().filter(|r| r.ok).count();
        let num_failed = results.len() - num_succeeded;
        info!(log, "Applied moderation batch";
            "num_succeeded" => num_succeeded, "num_failed" => num_failed);

        Ok(RunResult {
            num_failed,
            num_succeeded,
            results,
        })
    }

    //
    // Steps
    //

    fn apply_item(&self, log: &Logger, id: i64) -> Result<()> {
        match self.target {
            Target::Episodes => self.apply_episode(log, id),
            Target::Podcasts => self.apply_podcast(log, id),
        }
    }

    fn apply_episode(&self, log: &Logger, id: i64) -> Result<()> {
        let episode: Option<model::Episode> = schema::episode::table
            .filter(schema::episode::id.eq(id))
            .first(self.conn)
            .optional()
            .chain_err(|| "Error selecting episode")?;
        let episode = match episode {
            Some(episode) => episode,
            None => bail!(user_errors::not_found("episode", id)),
        };

        match self.action {
            Action::Approve | Action::Reject => {
                self.check_pending(episode.status.as_str())?;
                diesel::update(schema::episode::table)
                    .filter(schema::episode::id.eq(id))
                    .set((
                        schema::episode::status.eq(self.moderated_status().as_str()),
                        schema::episode::updated_at.eq(Utc::now()),
                    ))
                    .execute(self.conn)
                    .chain_err(|| "Error updating episode status")?;
            }
            Action::Delete => {
                let podcast: model::Podcast = schema::podcast::table
                    .filter(schema::podcast::id.eq(episode.podcast_id))
                    .first(self.conn)
                    .chain_err(|| "Error selecting episode's podcast")?;
                episode_destroyer::Mediator {
                    account: self.account,
                    conn:    self.conn,
                    episode: &episode,
                    podcast: &podcast,
                }.run(log)?;
            }
        }

        Ok(())
    }

    fn apply_podcast(&self, log: &Logger, id: i64) -> Result<()> {
        let podcast: Option<model::Podcast> = schema::podcast::table
            .filter(schema::podcast::id.eq(id))
            .first(self.conn)
            .optional()
            .chain_err(|| "Error selecting podcast")?;
        let podcast = match podcast {
            Some(podcast) => podcast,
            None => bail!(user_errors::not_found("podcast", id)),
        };

        match self.action {
            Action::Approve | Action::Reject => {
                self.check_pending(podcast.status.as_str())?;
                diesel::update(schema::podcast::table)
                    .filter(schema::podcast::id.eq(id))
                    .set((
                        schema::podcast::status.eq(self.moderated_status().as_str()),
                        schema::podcast::updated_at.eq(Utc::now()),
                    ))
                    .execute(self.conn)
                    .chain_err(|| "Error updating podcast status")?;
            }
            Action::Delete => {
                podcast_destroyer::Mediator {
                    account: self.account,
                    conn:    self.conn,
                    podcast: &podcast,
                }.run(log)?;
            }
        }

        Ok(())
    }

    //
    // Private functions
    //

    fn check_admin(&self) -> Result<()> {
        if !self.account.admin {
            bail!(user_errors::unauthorized());
        }
        Ok(())
    }

    fn check_pending(&self, status: &str) -> Result<()> {
        if status != ModerationStatus::PendingApproval.as_str() {
            bail!(user_errors::validation(match self.action {
                Action::Approve => "Only content pending approval can be approved.",
                Action::Reject => "Only content pending approval can be rejected.",
                Action::Delete => unreachable!(),
            }));
        }
        Ok(())
    }

    fn moderated_status(&self) -> ModerationStatus {
        match self.action {
            Action::Approve => ModerationStatus::Approved,
            Action::Reject => ModerationStatus::Rejected,
            Action::Delete => unreachable!(),
        }
    }

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            bail!(user_errors::validation("Please specify at least one ID."));
        }

        if self.ids.len() > BULK_LIMIT {
            bail!(user_errors::validation(format!(
                "At most {} IDs can be processed per batch.",
                BULK_LIMIT
            )));
        }

        Ok(())
    }
}

//
// Public types
//

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Approve,
    Delete,
    Reject,
}

impl Action {
    pub fn parse(s: &str) -> Result<Action> {
        match s {
            "approve" => Ok(Action::Approve),
            "delete" => Ok(Action::Delete),
            "reject" => Ok(Action::Reject),
            _ => Err(user_errors::validation(format!(
                "\"{}\" is not a valid action. Valid actions are: approve, reject, delete.",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Episodes,
    Podcasts,
}

/// Outcome for a single item in the batch. `message` is only set on
/// failures and is safe to show to the admin who initiated the operation.
pub struct ItemResult {
    pub id:      i64,
    pub message: Option<String>,
    pub ok:      bool,
}

pub struct RunResult {
    pub num_failed:    usize,
    pub num_succeeded: usize,
    pub results:       Vec<ItemResult>,
}

//
// Private constants
//

// The admin UI caps batch selections at the same number. Mostly here to keep
// a runaway client from holding a connection on a giant batch.
const BULK_LIMIT: usize = 50;

//
// Tests
//
