pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::account_creator;
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
        email:    String,
        password: String,
    }

    pub struct Params {
        body:    Body,
        last_ip: String,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                body:    api::parse_json_body(data)?,
                last_ip: req.connection_info().host().to_owned(),
            })
        }
    }

    pub struct ViewModel {
        account: model::Account,
        key:     model::Key,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::CREATED,
                &views::SessionView::build(&self.account, &self.key),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = account_creator::Mediator {
            admin:        false,
            conn:         conn,
            create_key:   true,
            email:        params.body.email.as_str(),
            last_ip:      params.last_ip.as_str(),
            password:     params.body.password.as_str(),
            scrypt_log_n: SCRYPT_LOG_N,
        }.run(log)?;

        Ok(ViewModel {
            account: res.account,

            // Always present because we asked for one with `create_key`
            key: res.key.unwrap(),
        })
    }

    // Scrypt cost parameter for interactive signups. High enough to be slow
    // for an offline attacker, low enough not to stall the sync executor.
    const SCRYPT_LOG_N: u8 = 15;
}

pub mod login {
    use api;
    use api::views;
    use errors::*;
    use mediators::account_password_authenticator;
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
        email:    String,
        password: String,
    }

    pub struct Params {
        body:    Body,
        last_ip: String,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                body:    api::parse_json_body(data)?,
                last_ip: req.connection_info().host().to_owned(),
            })
        }
    }

    pub struct ViewModel {
        account: model::Account,
        key:     model::Key,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::SessionView::build(&self.account, &self.key),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = account_password_authenticator::Mediator {
            conn:     conn,
            email:    params.body.email.as_str(),
            last_ip:  params.last_ip.as_str(),
            password: params.body.password.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            account: res.account,
            key:     res.key,
        })
    }
}
