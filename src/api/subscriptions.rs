pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_accessor;
    use mediators::podcast_subscriber;
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
        account:    model::Account,
        podcast_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    api::require_account(req)?,
                podcast_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::PodcastView::build(&self.podcast))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        // Subscribing requires that the caller can actually see the podcast
        let podcast = podcast_accessor::Mediator {
            account:    Some(&params.account),
            conn:       conn,
            podcast_id: params.podcast_id,
        }.run(log)?
            .podcast;

        podcast_subscriber::Mediator {
            account: &params.account,
            conn:    conn,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel { podcast })
    }
}

pub mod destroy {
    use api;
    use errors::*;
    use mediators::podcast_unsubscriber;
    use model;
    use schema;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use diesel::prelude::*;
    use futures::future::Future;
    use slog::Logger;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_get::<Params, ViewModel>(req)
    }

    pub struct Params {
        account:    model::Account,
        podcast_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    api::require_account(req)?,
                podcast_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel;

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            Ok(HttpResponse::build(StatusCode::NO_CONTENT).finish())
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        // No access check on the way out: even if a podcast was pulled from
        // under a subscriber, they can still leave.
        let podcast: Option<model::Podcast> = schema::podcast::table
            .filter(schema::podcast::id.eq(params.podcast_id))
            .first(conn)
            .optional()
            .chain_err(|| "Error selecting podcast")?;
        let podcast = match podcast {
            Some(podcast) => podcast,
            None => bail!(user_errors::not_found("podcast", params.podcast_id)),
        };

        podcast_unsubscriber::Mediator {
            account: &params.account,
            conn:    conn,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel)
    }
}

pub mod library {
    use api;
    use api::views;
    use errors::*;
    use model;
    use schema;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use diesel::pg::PgConnection;
    use diesel::prelude::*;
    use futures::future::Future;
    use slog::Logger;

    pub fn handler(
        req: HttpRequest<server::StateImpl>,
    ) -> Box<Future<Item = HttpResponse, Error = Error>> {
        api::execute_get::<Params, ViewModel>(req)
    }

    pub struct Params {
        account: model::Account,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account: api::require_account(req)?,
            })
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
        let podcasts = time_helpers::log_timed(
            &log.new(o!("step" => "select_podcasts")),
            |_log| {
                schema::podcast::table
                    .inner_join(schema::subscription::table)
                    .filter(schema::subscription::account_id.eq(params.account.id))
                    .filter(schema::subscription::subscribed_at.is_not_null())
                    .filter(schema::subscription::unsubscribed_at.is_null())
                    .order(schema::subscription::subscribed_at.desc())
                    .select((
                        schema::podcast::id,
                        schema::podcast::account_id,
                        schema::podcast::created_at,
                        schema::podcast::description,
                        schema::podcast::image_url,
                        schema::podcast::language,
                        schema::podcast::link_url,
                        schema::podcast::status,
                        schema::podcast::title,
                        schema::podcast::updated_at,
                        schema::podcast::visibility,
                    ))
                    .load::<model::Podcast>(conn)
                    .chain_err(|| "Error selecting library podcasts")
            },
        )?;

        Ok(ViewModel { podcasts })
    }
}
