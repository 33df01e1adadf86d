use errors::*;
use model;
use schema;
use time_helpers;

use chrono::Utc;
use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Redeems an invitation token, binding the invitation to the accepting
/// account. Accepting the same invitation again with the same account is
/// idempotent; a token that another account already redeemed is refused.
pub struct Mediator<'a> {
    pub account: &'a model::Account,
    pub conn:    &'a PgConnection,
    pub token:   &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let invitation = self.select_invitation(log)?;
        if invitation.is_none() {
            bail!(user_errors::validation("No invitation matched that token."));
        }
        let invitation = invitation.unwrap();

        if invitation.is_expired(Utc::now()) {
            bail!(user_errors::validation("That invitation has expired."));
        }

        if invitation.is_accepted() {
            // Same account coming back: fine. Anyone else: the token's used up.
            if invitation.account_id == Some(self.account.id) {
                return Ok(RunResult { invitation });
            }
            bail!(user_errors::validation(
                "That invitation has already been used."
            ));
        }

        let invitation = self.update_invitation(log, &invitation)?;
        Ok(RunResult { invitation })
    }

    //
    // Steps
    //

    fn select_invitation(&mut self, log: &Logger) -> Result<Option<model::ContentInvitation>> {
        time_helpers::log_timed(&log.new(o!("step" => "select_invitation")), |_log| {
            schema::content_invitation::table
                .filter(schema::content_invitation::token.eq(self.token))
                .first(self.conn)
                .optional()
                .chain_err(|| "Error selecting invitation")
        })
    }

    fn update_invitation(
        &mut self,
        log: &Logger,
        invitation: &model::ContentInvitation,
    ) -> Result<model::ContentInvitation> {
        time_helpers::log_timed(&log.new(o!("step" => "update_invitation")), |_log| {
            diesel::update(schema::content_invitation::table)
                .filter(schema::content_invitation::id.eq(invitation.id))
                .set((
                    schema::content_invitation::accepted_at.eq(Some(Utc::now())),
                    schema::content_invitation::account_id.eq(Some(self.account.id)),
                ))
                .get_result(self.conn)
                .chain_err(|| "Error updating invitation")
        })
    }
}

pub struct RunResult {
    pub invitation: model::ContentInvitation,
}

//
// Tests
//
