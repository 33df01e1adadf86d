pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_creator;
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

    #[derive(Debug, Deserialize)]
    struct Body {
        title: String,

        description: Option<String>,
        image_url:   Option<String>,
        language:    Option<String>,
        link_url:    Option<String>,
        visibility:  Option<String>,
    }

    pub struct Params {
        account: model::Account,
        body:    Body,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account: api::require_account(req)?,
                body:    api::parse_json_body(data)?,
            })
        }
    }

    pub struct ViewModel {
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::CREATED, &views::PodcastView::build(&self.podcast))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = podcast_creator::Mediator {
            account:     &params.account,
            conn:        conn,
            description: params.body.description.as_ref().map(String::as_str),
            image_url:   params.body.image_url.as_ref().map(String::as_str),
            language:    params.body.language.as_ref().map(String::as_str),
            link_url:    params.body.link_url.as_ref().map(String::as_str),
            title:       params.body.title.as_str(),
            visibility:  params.body.visibility.as_ref().map(String::as_str),
        }.run(log)?;

        Ok(ViewModel {
            podcast: res.podcast,
        })
    }
}

pub mod destroy {
    use api;
    use errors::*;
    use mediators::podcast_destroyer;
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
        let podcast: Option<model::Podcast> = schema::podcast::table
            .filter(schema::podcast::id.eq(params.podcast_id))
            .first(conn)
            .optional()
            .chain_err(|| "Error selecting podcast")?;
        let podcast = match podcast {
            Some(podcast) => podcast,
            None => bail!(user_errors::not_found("podcast", params.podcast_id)),
        };

        podcast_destroyer::Mediator {
            account: &params.account,
            conn:    conn,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel)
    }
}

pub mod explore {
    use api;
    use api::views;
    use errors::*;
    use model;
    use model::{ModerationStatus, Visibility};
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
        limit:  Option<i64>,
        offset: Option<i64>,
    }

    pub struct Params {
        limit:  i64,
        offset: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            let query: Query = serde_urlencoded::from_str(req.query_string())
                .map_err(|ref e| user_errors::bad_parameter("query", e))?;

            let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
            if limit < 1 || limit > MAX_LIMIT {
                bail!(user_errors::validation(format!(
                    "Limit must be between 1 and {}.",
                    MAX_LIMIT
                )));
            }

            let offset = query.offset.unwrap_or(0);
            if offset < 0 {
                bail!(user_errors::validation("Offset can't be negative."));
            }

            Ok(Params { limit, offset })
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
                    .filter(schema::podcast::status.eq(ModerationStatus::Approved.as_str()))
                    .filter(schema::podcast::visibility.eq(Visibility::Public.as_str()))
                    .order(schema::podcast::updated_at.desc())
                    .limit(params.limit)
                    .offset(params.offset)
                    .load::<model::Podcast>(conn)
                    .chain_err(|| "Error selecting podcasts")
            },
        )?;

        Ok(ViewModel { podcasts })
    }

    //
    // Private constants
    //

    const DEFAULT_LIMIT: i64 = 50;
    const MAX_LIMIT: i64 = 100;
}

pub mod list {
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
                    .filter(schema::podcast::account_id.eq(params.account.id))
                    .order(schema::podcast::updated_at.desc())
                    .load::<model::Podcast>(conn)
                    .chain_err(|| "Error selecting podcasts")
            },
        )?;

        Ok(ViewModel { podcasts })
    }
}

pub mod show {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_accessor;
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
        api::execute_get::<Params, ViewModel>(req)
    }

    pub struct Params {
        account:    Option<model::Account>,
        podcast_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    ::middleware::api::authenticator::account(req),
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
        let res = podcast_accessor::Mediator {
            account:    params.account.as_ref(),
            conn:       conn,
            podcast_id: params.podcast_id,
        }.run(log)?;

        Ok(ViewModel {
            podcast: res.podcast,
        })
    }
}

pub mod submit {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_submitter;
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
        let podcast: Option<model::Podcast> = schema::podcast::table
            .filter(schema::podcast::id.eq(params.podcast_id))
            .first(conn)
            .optional()
            .chain_err(|| "Error selecting podcast")?;
        let podcast = match podcast {
            Some(podcast) => podcast,
            None => bail!(user_errors::not_found("podcast", params.podcast_id)),
        };

        let res = podcast_submitter::Mediator {
            account: &params.account,
            conn:    conn,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel {
            podcast: res.podcast,
        })
    }
}

pub mod update {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_updater;
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
        api::execute_post::<Params, ViewModel>(req)
    }

    #[derive(Debug, Deserialize)]
    struct Body {
        description: Option<String>,
        image_url:   Option<String>,
        language:    Option<String>,
        link_url:    Option<String>,
        title:       Option<String>,
        visibility:  Option<String>,
    }

    pub struct Params {
        account:    model::Account,
        body:       Body,
        podcast_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    api::require_account(req)?,
                body:       api::parse_json_body(data)?,
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
        let podcast: Option<model::Podcast> = schema::podcast::table
            .filter(schema::podcast::id.eq(params.podcast_id))
            .first(conn)
            .optional()
            .chain_err(|| "Error selecting podcast")?;
        let podcast = match podcast {
            Some(podcast) => podcast,
            None => bail!(user_errors::not_found("podcast", params.podcast_id)),
        };

        let res = podcast_updater::Mediator {
            account:     &params.account,
            conn:        conn,
            description: params.body.description.as_ref().map(String::as_str),
            image_url:   params.body.image_url.as_ref().map(String::as_str),
            language:    params.body.language.as_ref().map(String::as_str),
            link_url:    params.body.link_url.as_ref().map(String::as_str),
            podcast:     &podcast,
            title:       params.body.title.as_ref().map(String::as_str),
            visibility:  params.body.visibility.as_ref().map(String::as_str),
        }.run(log)?;

        Ok(ViewModel {
            podcast: res.podcast,
        })
    }
}
