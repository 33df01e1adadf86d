use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use diesel;
use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;

/// Appends an episode to the end of a playlist. Each episode can appear in a
/// playlist at most once.
///
/// The episode is expected to have already been access-checked for the
/// acting account (see `episode_accessor`).
pub struct Mediator<'a> {
    pub account:  &'a model::Account,
    pub conn:     &'a PgConnection,
    pub episode:  &'a model::Episode,
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
        self.check_not_present(log)?;
        let position = self.select_next_position(log)?;
        let playlist_episode = self.insert_playlist_episode(log, position)?;
        Ok(RunResult { playlist_episode })
    }

    //
    // Steps
    //

    fn check_not_present(&mut self, log: &Logger) -> Result<()> {
        let exists =
            time_helpers::log_timed(&log.new(o!("step" => "check_playlist_episode")), |_log| {
                diesel::select(diesel::dsl::exists(
                    schema::playlist_episode::table
                        .filter(schema::playlist_episode::playlist_id.eq(self.playlist.id))
                        .filter(schema::playlist_episode::episode_id.eq(self.episode.id)),
                )).get_result::<bool>(self.conn)
                    .chain_err(|| "Error checking playlist episode existence")
            })?;

        if exists {
            bail!(user_errors::validation(
                "That episode is already in the playlist."
            ));
        }

        Ok(())
    }

    fn insert_playlist_episode(
        &mut self,
        log: &Logger,
        position: i32,
    ) -> Result<model::PlaylistEpisode> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_playlist_episode")), |_log| {
            diesel::insert_into(schema::playlist_episode::table)
                .values(&insertable::PlaylistEpisode {
                    episode_id:  self.episode.id,
                    playlist_id: self.playlist.id,
                    position:    position,
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting playlist episode")
        })
    }

    fn select_next_position(&mut self, log: &Logger) -> Result<i32> {
        let max_position =
            time_helpers::log_timed(&log.new(o!("step" => "select_max_position")), |_log| {
                schema::playlist_episode::table
                    .filter(schema::playlist_episode::playlist_id.eq(self.playlist.id))
                    .select(max(schema::playlist_episode::position))
                    .first::<Option<i32>>(self.conn)
                    .chain_err(|| "Error selecting max playlist position")
            })?;

        Ok(match max_position {
            Some(position) => position + 1,
            None => 0,
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
    pub playlist_episode: model::PlaylistEpisode,
}

//
// Tests
//
