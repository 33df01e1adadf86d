pub mod log_initializer {
    use server;

    use actix_web;
    use actix_web::middleware::{Response, Started};
    use actix_web::{HttpRequest, HttpResponse};
    use slog::Logger;

    pub struct Middleware;

    pub struct Extension(pub Logger);

    impl<S: server::State> actix_web::middleware::Middleware<S> for Middleware {
        fn start(&self, req: &mut HttpRequest<S>) -> actix_web::Result<Started> {
            let log = req.state().log().clone();
            req.extensions().insert(Extension(log));
            Ok(Started::Done)
        }

        fn response(
            &self,
            _req: &mut HttpRequest<S>,
            resp: HttpResponse,
        ) -> actix_web::Result<Response> {
            Ok(Response::Done(resp))
        }
    }

    /// Shorthand for getting a usable `Logger` out of a request. It's also
    /// possible to access the request's extensions directly.
    pub fn log<S: server::State>(req: &mut HttpRequest<S>) -> Logger {
        req.extensions().get::<Extension>().unwrap().0.clone()
    }
}

pub mod request_id {
    use middleware::log_initializer;
    use server;

    use actix_web;
    use actix_web::middleware::{Response, Started};
    use actix_web::{HttpRequest, HttpResponse};

    use uuid::Uuid;

    pub struct Middleware;

    impl<S: server::State> actix_web::middleware::Middleware<S> for Middleware {
        fn start(&self, req: &mut HttpRequest<S>) -> actix_web::Result<Started> {
            let log = req.extensions()
                .remove::<log_initializer::Extension>()
                .unwrap()
                .0;

            let request_id = Uuid::new_v4().simple().to_string();
            debug!(&log, "Generated request ID"; "request_id" => request_id.as_str());

            req.extensions().insert(log_initializer::Extension(log.new(
                o!("request_id" => request_id),
            )));

            Ok(Started::Done)
        }

        fn response(
            &self,
            _req: &mut HttpRequest<S>,
            resp: HttpResponse,
        ) -> actix_web::Result<Response> {
            Ok(Response::Done(resp))
        }
    }
}

pub mod request_response_logger {
    use middleware::log_initializer;
    use server;
    use time_helpers;

    use actix_web;
    use actix_web::middleware::{Response, Started};
    use actix_web::{HttpRequest, HttpResponse};

    use time;

    pub struct Middleware;

    struct Extension {
        start_time: u64,
    }

    impl<S: server::State> actix_web::middleware::Middleware<S> for Middleware {
        fn start(&self, req: &mut HttpRequest<S>) -> actix_web::Result<Started> {
            req.extensions().insert(Extension {
                start_time: time::precise_time_ns(),
            });
            Ok(Started::Done)
        }

        fn response(
            &self,
            req: &mut HttpRequest<S>,
            resp: HttpResponse,
        ) -> actix_web::Result<Response> {
            let log = log_initializer::log(req);
            let elapsed =
                time::precise_time_ns() - req.extensions().get::<Extension>().unwrap().start_time;
            info!(log, "Request finished";
                    "elapsed" => time_helpers::unit_str(elapsed),
                    "method"  => req.method().as_str(),
                    "path"    => req.path(),
                    "status"  => resp.status().as_u16(),
                );
            Ok(Response::Done(resp))
        }
    }
}

/// Holds middleware that's specific to the API (as opposed to generally
/// applicable like the ones above).
pub mod api {
    /// Resolves the account behind a request's bearer credentials.
    ///
    /// Requests without an `Authorization` header pass through as anonymous.
    /// Requests that present a secret that doesn't match a live key are
    /// turned away with a 401 instead of being allowed to continue as
    /// anonymous -- a client holding a stale key should find out about it.
    pub mod authenticator {
        use errors::*;
        use mediators::account_authenticator;
        use middleware::log_initializer;
        use model;
        use server;
        use server::Params as P;
        use time_helpers;

        use actix_web;
        use actix_web::http::StatusCode;
        use actix_web::http::header;
        use actix_web::middleware::{Response, Started};
        use actix_web::{HttpRequest, HttpResponse};
        use diesel::pg::PgConnection;
        use futures::future::Future;
        use slog::Logger;

        pub struct Middleware;

        pub struct Extension(pub Option<model::Account>);

        impl<S: server::State> actix_web::middleware::Middleware<S> for Middleware {
            fn start(&self, req: &mut HttpRequest<S>) -> actix_web::Result<Started> {
                let log = log_initializer::log(req);

                let params = match Params::build(&log, req, None) {
                    Ok(params) => params,

                    // No bearer credentials at all: continue as anonymous
                    Err(_) => {
                        req.extensions().insert(Extension(None));
                        return Ok(Started::Done);
                    }
                };

                debug!(log, "Authenticating bearer credentials");

                let message = server::Message::new(&log, params);

                let sync_addr = req.state().sync_addr().clone();
                let mut req = req.clone();

                let fut = sync_addr
                    .send(message)
                    .map_err(|_e| Error::from("Error from sync executor"))
                    .and_then(move |res| {
                        let view_model = res?;
                        match view_model.account {
                            Some(account) => {
                                req.extensions().insert(Extension(Some(account)));
                                Ok(None)
                            }
                            None => Ok(Some(
                                HttpResponse::build(StatusCode::UNAUTHORIZED)
                                    .content_type("application/json; charset=utf-8")
                                    .body(r#"{"message":"Invalid credentials."}"#),
                            )),
                        }
                    })
                    .from_err();

                Ok(Started::Future(Box::new(fut)))
            }

            fn response(
                &self,
                _req: &mut HttpRequest<S>,
                resp: HttpResponse,
            ) -> actix_web::Result<Response> {
                Ok(Response::Done(resp))
            }
        }

        /// Shorthand for getting the authenticated account (if any) out of a
        /// request.
        pub fn account<S: server::State>(req: &mut HttpRequest<S>) -> Option<model::Account> {
            match req.extensions().get::<Extension>() {
                Some(&Extension(ref account)) => account.clone(),
                None => None,
            }
        }

        //
        // Params
        //

        struct Params {
            last_ip: String,
            secret:  String,
        }

        impl server::Params for Params {
            fn build<S: server::State>(
                _log: &Logger,
                req: &mut HttpRequest<S>,
                _data: Option<&[u8]>,
            ) -> Result<Self> {
                match bearer_secret(req) {
                    Some(secret) => Ok(Params {
                        last_ip: req.connection_info().host().to_owned(),
                        secret:  secret,
                    }),
                    None => Err(user_errors::unauthorized()),
                }
            }
        }

        //
        // ViewModel
        //

        struct ViewModel {
            account: Option<model::Account>,
        }

        //
        // Sync handler
        //

        impl ::actix::prelude::Handler<server::Message<Params>> for server::SyncExecutor {
            type Result = Result<ViewModel>;

            fn handle(
                &mut self,
                message: server::Message<Params>,
                _: &mut Self::Context,
            ) -> Self::Result {
                let conn = self.pool.get()?;
                let log = message.log.clone();
                time_helpers::log_timed(&log.new(o!("step" => "handle_message")), |log| {
                    handle_inner(log, &*conn, &message.params)
                })
            }
        }

        impl ::actix::prelude::Message for server::Message<Params> {
            type Result = Result<ViewModel>;
        }

        //
        // Private functions
        //

        fn bearer_secret<S>(req: &HttpRequest<S>) -> Option<String> {
            let value = match req.headers().get(header::AUTHORIZATION) {
                Some(value) => value,
                None => return None,
            };

            let value = match value.to_str() {
                Ok(value) => value,
                Err(_) => return None,
            };

            if !value.starts_with(BEARER_PREFIX) {
                return None;
            }

            Some(value[BEARER_PREFIX.len()..].to_owned())
        }

        const BEARER_PREFIX: &str = "Bearer ";

        fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
            let res = account_authenticator::Mediator {
                conn:    conn,
                last_ip: params.last_ip.as_str(),
                secret:  params.secret.as_str(),
            }.run(log)?;
            Ok(ViewModel {
                account: res.account,
            })
        }
    }
}
