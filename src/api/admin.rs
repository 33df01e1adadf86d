pub mod episodes_bulk {
    use api;
    use api::views;
    use errors::*;
    use mediators::moderation_batcher;
    use model;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use futures::future::Future;
    use slog::Logger;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_post::<Params, ViewModel>(req)
    }

    pub struct Params {
        account: model::Account,
        action:  moderation_batcher::Action,
        ids:     Vec<i64>,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            let bulk = super::build_bulk_params(log, req, data)?;
            Ok(Params {
                account: bulk.account,
                action:  bulk.action,
                ids:     bulk.ids,
            })
        }
    }

    pub struct ViewModel {
        res: moderation_batcher::RunResult,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::BulkResultView::build(&self.res))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = moderation_batcher::Mediator {
            account: &params.account,
            action:  params.action,
            conn:    conn,
            ids:     params.ids.as_slice(),
            target:  moderation_batcher::Target::Episodes,
        }.run(log)?;

        Ok(ViewModel { res })
    }
}

pub mod password_reset {
    use api;
    use api::views;
    use errors::*;
    use mediators::admin_password_resetter;
    use model;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use futures::future::Future;
    use slog::Logger;
    use std::env;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_post::<Params, ViewModel>(req)
    }

    #[derive(Debug, Deserialize)]
    struct Body {
        email:        String,
        new_password: String,
        reset_token:  String,
    }

    pub struct Params {
        body:           Body,
        expected_token: String,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            _req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            // This endpoint exists for when no admin can log in anymore, so
            // it deliberately doesn't use the normal authentication path.
            // The shared token is its whole defense.
            Ok(Params {
                body:           api::parse_json_body(data)?,
                expected_token: env::var("ADMIN_RESET_TOKEN").unwrap_or_else(|_| "".to_owned()),
            })
        }
    }

    pub struct ViewModel {
        account: model::Account,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::AccountView::build(&self.account))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = admin_password_resetter::Mediator {
            conn:           conn,
            email:          params.body.email.as_str(),
            expected_token: params.expected_token.as_str(),
            new_password:   params.body.new_password.as_str(),
            scrypt_log_n:   SCRYPT_LOG_N,
            token:          params.body.reset_token.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            account: res.account,
        })
    }

    const SCRYPT_LOG_N: u8 = 15;
}

pub mod podcasts_bulk {
    use api;
    use api::views;
    use errors::*;
    use mediators::moderation_batcher;
    use model;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use futures::future::Future;
    use slog::Logger;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_post::<Params, ViewModel>(req)
    }

    pub struct Params {
        account: model::Account,
        action:  moderation_batcher::Action,
        ids:     Vec<i64>,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            let bulk = super::build_bulk_params(log, req, data)?;
            Ok(Params {
                account: bulk.account,
                action:  bulk.action,
                ids:     bulk.ids,
            })
        }
    }

    pub struct ViewModel {
        res: moderation_batcher::RunResult,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::BulkResultView::build(&self.res))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = moderation_batcher::Mediator {
            account: &params.account,
            action:  params.action,
            conn:    conn,
            ids:     params.ids.as_slice(),
            target:  moderation_batcher::Target::Podcasts,
        }.run(log)?;

        Ok(ViewModel { res })
    }
}

pub mod queue {
    use api;
    use api::views;
    use errors::*;
    use model;
    use model::ModerationStatus;
    use schema;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use diesel::prelude::*;
    use futures::future::Future;
    use serde_urlencoded;
    use slog::Logger;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_get::<Params, ViewModel>(req)
    }

    #[derive(Debug, Deserialize)]
    struct Query {
        status: Option<String>,
    }

    pub struct Params {
        account: model::Account,
        status:  ModerationStatus,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            let account = api::require_admin(req)?;

            let query: Query = serde_urlencoded::from_str(req.query_string())
                .map_err(|ref e| user_errors::bad_parameter("query", e))?;
            let status = match query.status {
                Some(ref status) => ModerationStatus::parse(status.as_str())?,
                None => ModerationStatus::PendingApproval,
            };

            Ok(Params { account, status })
        }
    }

    pub struct ViewModel {
        podcasts: Vec<model::Podcast>,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            let views: Vec<views::PodcastView> =
                self.podcasts.iter().map(views::PodcastView::build).collect();
            api::render_json(StatusCode::OK, &views)
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        info!(log, "Listing moderation queue"; "admin_id" => params.account.id,
            "status" => params.status.as_str());

        let podcasts = time_helpers::log_timed(
            &log.new(o!("step" => "select_podcasts")),
            |_log| {
                schema::podcast::table
                    .filter(schema::podcast::status.eq(params.status.as_str()))
                    .order(schema::podcast::updated_at.asc())
                    .load::<model::Podcast>(conn)
                    .chain_err(|| "Error selecting podcasts")
            },
        )?;

        Ok(ViewModel { podcasts })
    }
}

//
// Private types/functions
//

use api;
use errors::*;
use mediators::moderation_batcher;
use model;
use server;

use actix_web::HttpRequest;
use slog::Logger;

#[derive(Debug, Deserialize)]
struct BulkBody {
    action: String,
    ids:    Vec<i64>,
}

struct BulkParams {
    account: model::Account,
    action:  moderation_batcher::Action,
    ids:     Vec<i64>,
}

/// Shared parameter decoding for the two bulk moderation endpoints: an admin
/// caller, an action name, and a list of IDs.
fn build_bulk_params<S: server::State>(
    _log: &Logger,
    req: &mut HttpRequest<S>,
    data: Option<&[u8]>,
) -> Result<BulkParams> {
    let account = api::require_admin(req)?;
    let body: BulkBody = api::parse_json_body(data)?;
    let action = moderation_batcher::Action::parse(body.action.as_str())?;

    Ok(BulkParams {
        account: account,
        action:  action,
        ids:     body.ids,
    })
}
