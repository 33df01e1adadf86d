use errors::*;
use model;
use schema;

use diesel::pg::PgConnection;
use diesel::prelude::*;

pub mod drive_show {
    use api;
    use api::views;
    use errors::*;
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
        _account: model::Account,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                _account: api::require_admin(req)?,
            })
        }
    }

    pub struct ViewModel {
        config: Option<model::DriveConfig>,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            match self.config {
                Some(ref config) => {
                    api::render_json(StatusCode::OK, &views::DriveConfigView::build(config))
                }
                None => Err(user_errors::not_found_general(
                    "Drive storage hasn't been configured yet.",
                )),
            }
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, _params: &Params) -> Result<ViewModel> {
        let config = super::select_drive_config(log, conn)?;
        Ok(ViewModel { config })
    }
}

pub mod drive_update {
    use api;
    use api::views;
    use errors::*;
    use mediators::drive_config_upserter;
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
        enabled:               bool,
        folder_id:             String,
        service_account_email: String,
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
                account: api::require_admin(req)?,
                body:    api::parse_json_body(data)?,
            })
        }
    }

    pub struct ViewModel {
        config: model::DriveConfig,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::DriveConfigView::build(&self.config))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = drive_config_upserter::Mediator {
            account:               &params.account,
            conn:                  conn,
            enabled:               params.body.enabled,
            folder_id:             params.body.folder_id.as_str(),
            service_account_email: params.body.service_account_email.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            config: res.drive_config,
        })
    }
}

pub mod email_show {
    use api;
    use api::views;
    use errors::*;
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
        _account: model::Account,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                _account: api::require_admin(req)?,
            })
        }
    }

    pub struct ViewModel {
        config: Option<model::EmailConfig>,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            match self.config {
                Some(ref config) => {
                    api::render_json(StatusCode::OK, &views::EmailConfigView::build(config))
                }
                None => Err(user_errors::not_found_general(
                    "Email delivery hasn't been configured yet.",
                )),
            }
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, _params: &Params) -> Result<ViewModel> {
        let config = super::select_email_config(log, conn)?;
        Ok(ViewModel { config })
    }
}

pub mod email_update {
    use api;
    use api::views;
    use errors::*;
    use mediators::email_config_upserter;
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
        from_address: String,
        smtp_host:    String,
        smtp_port:    i32,
        use_tls:      bool,

        smtp_password: Option<String>,
        smtp_username: Option<String>,
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
                account: api::require_admin(req)?,
                body:    api::parse_json_body(data)?,
            })
        }
    }

    pub struct ViewModel {
        config: model::EmailConfig,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(StatusCode::OK, &views::EmailConfigView::build(&self.config))
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = email_config_upserter::Mediator {
            account:       &params.account,
            conn:          conn,
            from_address:  params.body.from_address.as_str(),
            smtp_host:     params.body.smtp_host.as_str(),
            smtp_password: params.body.smtp_password.as_ref().map(String::as_str),
            smtp_port:     params.body.smtp_port,
            smtp_username: params.body.smtp_username.as_ref().map(String::as_str),
            use_tls:       params.body.use_tls,
        }.run(log)?;

        Ok(ViewModel {
            config: res.email_config,
        })
    }
}

//
// Private functions
//

fn select_drive_config(
    _log: &::slog::Logger,
    conn: &PgConnection,
) -> Result<Option<model::DriveConfig>> {
    schema::drive_config::table
        .first(conn)
        .optional()
        .chain_err(|| "Error selecting drive config")
}

fn select_email_config(
    _log: &::slog::Logger,
    conn: &PgConnection,
) -> Result<Option<model::EmailConfig>> {
    schema::email_config::table
        .first(conn)
        .optional()
        .chain_err(|| "Error selecting email config")
}
