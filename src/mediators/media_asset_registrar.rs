use errors::*;
use model;
use model::insertable;
use schema;
use time_helpers;

use diesel;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use slog::Logger;
use url::Url;

/// Records a file that a creator has uploaded to external storage so that
/// the platform can track it. The upload itself happens elsewhere; we only
/// keep the book.
pub struct Mediator<'a> {
    pub account:      &'a model::Account,
    pub conn:         &'a PgConnection,
    pub content_type: Option<&'a str>,
    pub kind:         &'a str,
    pub size_bytes:   Option<i64>,
    pub url:          &'a str,
}

impl<'a> Mediator<'a> {
    pub fn run(&mut self, log: &Logger) -> Result<RunResult> {
        time_helpers::log_timed(&log.new(o!("step" => file!())), |log| {
            self.conn.transaction::<_, Error, _>(|| self.run_inner(log))
        })
    }

    fn run_inner(&mut self, log: &Logger) -> Result<RunResult> {
        let kind = self.params_validate()?;
        let media_asset = self.insert_media_asset(log, kind)?;
        Ok(RunResult { media_asset })
    }

    //
    // Steps
    //

    fn insert_media_asset(
        &mut self,
        log: &Logger,
        kind: model::AssetKind,
    ) -> Result<model::MediaAsset> {
        time_helpers::log_timed(&log.new(o!("step" => "insert_media_asset")), |_log| {
            diesel::insert_into(schema::media_asset::table)
                .values(&insertable::MediaAsset {
                    account_id:   self.account.id,
                    content_type: self.content_type.map(|s| s.to_owned()),
                    kind:         kind.as_str().to_owned(),
                    size_bytes:   self.size_bytes,
                    url:          self.url.to_owned(),
                })
                .get_result(self.conn)
                .chain_err(|| "Error inserting media asset")
        })
    }

    //
    // Private functions
    //

    /// Performs validations on parameters. These are user facing.
    fn params_validate(&self) -> Result<model::AssetKind> {
        if let Err(ref e) = Url::parse(self.url) {
            bail!(user_errors::bad_parameter("url", e));
        }

        if let Some(size_bytes) = self.size_bytes {
            if size_bytes < 0 {
                bail!(user_errors::validation("Size can't be negative."));
            }
        }

        model::AssetKind::parse(self.kind)
    }
}

pub struct RunResult {
    pub media_asset: model::MediaAsset,
}

//
// Tests
//
