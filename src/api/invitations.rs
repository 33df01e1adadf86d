pub mod accept {
    use api;
    use api::views;
    use errors::*;
    use mediators::invitation_accepter;
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
        token: String,
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
        invitation: model::ContentInvitation,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::InvitationView::build(&self.invitation),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = invitation_accepter::Mediator {
            account: &params.account,
            conn:    conn,
            token:   params.body.token.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            invitation: res.invitation,
        })
    }
}

pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::invitation_creator;
    use model;
    use schema;
    use server;
    use time_helpers;

    use actix_web::http::StatusCode;
    use actix_web::{HttpRequest, HttpResponse};
    use chrono::{DateTime, Utc};
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
        email: String,

        expires_at: Option<DateTime<Utc>>,
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
        invitation: model::ContentInvitation,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::CREATED,
                &views::InvitationView::build(&self.invitation),
            )
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

        let res = invitation_creator::Mediator {
            account:    &params.account,
            conn:       conn,
            email:      params.body.email.as_str(),
            expires_at: params.body.expires_at,
            podcast:    &podcast,
        }.run(log)?;

        Ok(ViewModel {
            invitation: res.invitation,
        })
    }
}
