pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::media_asset_registrar;
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
        kind: String,
        url:  String,

        content_type: Option<String>,
        size_bytes:   Option<i64>,
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
        media_asset: model::MediaAsset,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::CREATED,
                &views::MediaAssetView::build(&self.media_asset),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = media_asset_registrar::Mediator {
            account:      &params.account,
            conn:         conn,
            content_type: params.body.content_type.as_ref().map(String::as_str),
            kind:         params.body.kind.as_str(),
            size_bytes:   params.body.size_bytes,
            url:          params.body.url.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            media_asset: res.media_asset,
        })
    }
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
        media_assets: Vec<model::MediaAsset>,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            let views: Vec<views::MediaAssetView> = self.media_assets
                .iter()
                .map(views::MediaAssetView::build)
                .collect();
            api::render_json(StatusCode::OK, &views)
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let media_assets = time_helpers::log_timed(
            &log.new(o!("step" => "select_media_assets")),
            |_log| {
                schema::media_asset::table
                    .filter(schema::media_asset::account_id.eq(params.account.id))
                    .order(schema::media_asset::created_at.desc())
                    .load::<model::MediaAsset>(conn)
                    .chain_err(|| "Error selecting media assets")
            },
        )?;

        Ok(ViewModel { media_assets })
    }
}
