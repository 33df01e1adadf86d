use errors::*;
use middleware;
use model;
use server;
use time_helpers;

use actix;
use actix_web;
use actix_web::HttpMessage;
use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use bytes::Bytes;
use diesel::pg::PgConnection;
use futures::future;
use futures::future::Future;
use r2d2::Pool;
use r2d2_diesel::ConnectionManager;
use serde::Serialize;
use serde_json;
use slog::Logger;

pub mod accounts;
pub mod admin;
pub mod episodes;
pub mod invitations;
pub mod media_assets;
pub mod playlists;
pub mod podcasts;
pub mod settings;
pub mod subscriptions;
pub mod views;

//
// Server
//

pub struct Server {
    pub log:                Logger,
    pub num_sync_executors: u32,
    pub pool:               Pool<ConnectionManager<PgConnection>>,
    pub port:               String,
}

impl Server {
    pub fn run(&self) -> Result<()> {
        let log = self.log.clone();
        let pool = self.pool.clone();

        // Must appear up here because we're going to move `log` into server closure.
        let host = format!("0.0.0.0:{}", self.port.as_str());
        info!(log, "API server starting"; "host" => host.as_str());

        // Although not referenced in the server definition, a `System` must be defined
        // or the server will crash on `start()`.
        let system = actix::System::new("podhost-api");

        let sync_addr = actix::SyncArbiter::start(self.num_sync_executors as usize, move || {
            server::SyncExecutor { pool: pool.clone() }
        });

        let server = actix_web::server::HttpServer::new(move || {
            actix_web::App::with_state(server::StateImpl {
                log:       log.clone(),
                sync_addr: sync_addr.clone(),
            }).middleware(middleware::log_initializer::Middleware)
                .middleware(middleware::request_id::Middleware)
                .middleware(middleware::request_response_logger::Middleware)
                .middleware(middleware::api::authenticator::Middleware)
                .resource("/", |r| {
                    r.method(Method::GET).f(|_req| HttpResponse::Ok())
                })
                .resource("/health", |r| {
                    r.method(Method::GET).f(|_req| HttpResponse::Ok())
                })
                .resource("/api/accounts", |r| {
                    r.method(Method::POST).a(accounts::create::handler)
                })
                .resource("/api/login", |r| {
                    r.method(Method::POST).a(accounts::login::handler)
                })
                .resource("/api/explore", |r| {
                    r.method(Method::GET).a(podcasts::explore::handler)
                })
                .resource("/api/library", |r| {
                    r.method(Method::GET).a(subscriptions::library::handler)
                })
                .resource("/api/podcasts", |r| {
                    r.method(Method::GET).a(podcasts::list::handler);
                    r.method(Method::POST).a(podcasts::create::handler);
                })
                .resource("/api/podcasts/{id}", |r| {
                    r.method(Method::GET).a(podcasts::show::handler);
                    r.method(Method::POST).a(podcasts::update::handler);
                    r.method(Method::DELETE).a(podcasts::destroy::handler);
                })
                .resource("/api/podcasts/{id}/submit", |r| {
                    r.method(Method::POST).a(podcasts::submit::handler)
                })
                .resource("/api/podcasts/{id}/episodes", |r| {
                    r.method(Method::GET).a(episodes::list::handler);
                    r.method(Method::POST).a(episodes::create::handler);
                })
                .resource("/api/podcasts/{id}/subscription", |r| {
                    r.method(Method::POST).a(subscriptions::create::handler);
                    r.method(Method::DELETE).a(subscriptions::destroy::handler);
                })
                .resource("/api/podcasts/{id}/invitations", |r| {
                    r.method(Method::POST).a(invitations::create::handler)
                })
                .resource("/api/invitations/accept", |r| {
                    r.method(Method::POST).a(invitations::accept::handler)
                })
                .resource("/api/episodes/{id}", |r| {
                    r.method(Method::GET).a(episodes::show::handler);
                    r.method(Method::POST).a(episodes::update::handler);
                    r.method(Method::DELETE).a(episodes::destroy::handler);
                })
                .resource("/api/episodes/{id}/submit", |r| {
                    r.method(Method::POST).a(episodes::submit::handler)
                })
                .resource("/api/playlists", |r| {
                    r.method(Method::GET).a(playlists::list::handler);
                    r.method(Method::POST).a(playlists::create::handler);
                })
                .resource("/api/playlists/{id}", |r| {
                    r.method(Method::GET).a(playlists::show::handler);
                    r.method(Method::DELETE).a(playlists::destroy::handler);
                })
                .resource("/api/playlists/{id}/episodes", |r| {
                    r.method(Method::POST).a(playlists::add_episode::handler)
                })
                .resource("/api/playlists/{id}/episodes/{episode_id}", |r| {
                    r.method(Method::DELETE).a(playlists::remove_episode::handler)
                })
                .resource("/api/media", |r| {
                    r.method(Method::GET).a(media_assets::list::handler);
                    r.method(Method::POST).a(media_assets::create::handler);
                })
                .resource("/api/admin/podcasts", |r| {
                    r.method(Method::GET).a(admin::queue::handler)
                })
                .resource("/api/admin/podcasts/bulk", |r| {
                    r.method(Method::POST).a(admin::podcasts_bulk::handler)
                })
                .resource("/api/admin/episodes/bulk", |r| {
                    r.method(Method::POST).a(admin::episodes_bulk::handler)
                })
                .resource("/api/admin/password-reset", |r| {
                    r.method(Method::POST).a(admin::password_reset::handler)
                })
                .resource("/api/admin/settings/email", |r| {
                    r.method(Method::GET).a(settings::email_show::handler);
                    r.method(Method::POST).a(settings::email_update::handler);
                })
                .resource("/api/admin/settings/drive", |r| {
                    r.method(Method::GET).a(settings::drive_show::handler);
                    r.method(Method::POST).a(settings::drive_update::handler);
                })
        });

        let _addr = server.bind(host)?.start();
        let _ = system.run();

        Ok(())
    }
}

//
// Traits
//

/// The rendered product of an endpoint's sync work. Rendering happens back
/// on the event loop after the `SyncExecutor` responds.
pub trait ViewModel {
    fn render(&self, log: &Logger) -> Result<HttpResponse>;
}

//
// Dispatch functions
//
// Endpoints are a `Params`/`ViewModel` pair plus a `handle_inner` that runs
// on a `SyncExecutor` (see the `message_handler!` macro). These helpers
// shuttle a request through that pipeline.
//

pub fn execute_get<P, V>(
    mut req: HttpRequest<server::StateImpl>,
) -> Box<Future<Item = HttpResponse, Error = Error>>
where
    P: server::Params + Send + 'static,
    V: ViewModel + Send + 'static,
    server::Message<P>: actix::prelude::Message<Result = Result<V>> + Send,
    server::SyncExecutor: actix::prelude::Handler<server::Message<P>>,
{
    let log = middleware::log_initializer::log(&mut req);

    let params_res = time_helpers::log_timed(&log.new(o!("step" => "build_params")), |log| {
        P::build(log, &mut req, None)
    });
    let params = match params_res {
        Ok(params) => params,
        Err(e) => return Box::new(future::ok(render_error(&log, e))),
    };

    execute::<P, V>(log, req, params)
}

pub fn execute_post<P, V>(
    mut req: HttpRequest<server::StateImpl>,
) -> Box<Future<Item = HttpResponse, Error = Error>>
where
    P: server::Params + Send + 'static,
    V: ViewModel + Send + 'static,
    server::Message<P>: actix::prelude::Message<Result = Result<V>> + Send,
    server::SyncExecutor: actix::prelude::Handler<server::Message<P>>,
{
    let log = middleware::log_initializer::log(&mut req);
    let log_clone = log.clone();
    let mut req_clone = req.clone();

    let fut = req.body()
        .map_err(|_e| Error::from("Error reading request body"))
        .and_then(move |bytes: Bytes| {
            time_helpers::log_timed(&log_clone.new(o!("step" => "build_params")), |log| {
                P::build(log, &mut req_clone, Some(bytes.as_ref()))
            })
        });

    let log_clone = log.clone();
    let req_clone = req.clone();
    Box::new(fut.then(move |res| match res {
        Ok(params) => execute::<P, V>(log, req_clone, params),
        Err(e) => Box::new(future::ok(render_error(&log_clone, e))),
    }))
}

//
// Render functions
//

/// Renders any error as a JSON response. User errors keep their message and
/// get a conventional status code; anything else is logged and collapsed
/// into an opaque 500.
pub fn render_error(log: &Logger, e: Error) -> HttpResponse {
    match e {
        Error(ErrorKind::User(kind), _) => {
            let code = user_error_status(&kind);
            info!(log, "User error"; "message" => format!("{}", kind),
                "status" => code.as_u16());
            render_message(code, format!("{}", kind))
        }
        e => {
            for s in error_strings(&e) {
                error!(log, "Internal error"; "message" => s);
            }
            render_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            )
        }
    }
}

pub fn render_json<T: Serialize>(code: StatusCode, value: &T) -> Result<HttpResponse> {
    Ok(HttpResponse::build(code)
        .content_type("application/json; charset=utf-8")
        .body(serde_json::to_string(value)?))
}

//
// Params helpers
//

/// Gets the authenticated account for a request, erroring with a user-facing
/// unauthorized message if there isn't one. For endpoints that require a
/// caller.
pub fn require_account<S: server::State>(req: &mut HttpRequest<S>) -> Result<model::Account> {
    match middleware::api::authenticator::account(req) {
        Some(account) => Ok(account),
        None => Err(user_errors::unauthorized()),
    }
}

/// Like `require_account`, but also requires the account to be an admin.
/// Non-admins get the same opaque unauthorized error as anonymous callers.
pub fn require_admin<S: server::State>(req: &mut HttpRequest<S>) -> Result<model::Account> {
    let account = require_account(req)?;
    if !account.admin {
        bail!(user_errors::unauthorized());
    }
    Ok(account)
}

/// Extracts an `i64` ID out of a request's path.
pub fn id_param<S: server::State>(req: &HttpRequest<S>, name: &str) -> Result<i64> {
    match req.match_info().get(name) {
        Some(value) => value
            .parse::<i64>()
            .map_err(|ref e| user_errors::bad_parameter(name, e)),
        None => Err(user_errors::missing_parameter(name)),
    }
}

/// Decodes a JSON request body into an endpoint's expected shape.
pub fn parse_json_body<'a, T: ::serde::Deserialize<'a>>(data: Option<&'a [u8]>) -> Result<T> {
    let data = match data {
        Some(data) => data,
        None => bail!(user_errors::bad_request("A request body is required.")),
    };

    serde_json::from_slice(data)
        .map_err(|ref e| user_errors::bad_parameter("body", e))
}

//
// Private functions
//

fn execute<P, V>(
    log: Logger,
    req: HttpRequest<server::StateImpl>,
    params: P,
) -> Box<Future<Item = HttpResponse, Error = Error>>
where
    P: server::Params + Send + 'static,
    V: ViewModel + Send + 'static,
    server::Message<P>: actix::prelude::Message<Result = Result<V>> + Send,
    server::SyncExecutor: actix::prelude::Handler<server::Message<P>>,
{
    let message = server::Message::new(&log, params);
    let log_clone = log.clone();

    let fut = req.state()
        .sync_addr
        .send(message)
        .map_err(|_e| Error::from("Error from sync executor"))
        .and_then(move |res| {
            let view_model = res?;
            time_helpers::log_timed(&log.new(o!("step" => "render_view_model")), |log| {
                view_model.render(log)
            })
        })
        .then(move |res| match res {
            Err(e) => future::ok(render_error(&log_clone, e)),
            r => future::result(r),
        });

    Box::new(fut)
}

fn render_message(code: StatusCode, message: String) -> HttpResponse {
    match render_json(code, &views::MessageView { message }) {
        Ok(resp) => resp,
        // A one-field struct can't actually fail to serialize
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

fn user_error_status(kind: &user_errors::ErrorKind) -> StatusCode {
    match *kind {
        user_errors::ErrorKind::NotFound(_, _) | user_errors::ErrorKind::NotFoundGeneral(_) => {
            StatusCode::NOT_FOUND
        }
        user_errors::ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_REQUEST,
    }
}
