use errors::*;

use futures::Stream;
use hyper::{Body, Client, Headers, Request, StatusCode, Uri};
use hyper::client::HttpConnector;
use hyper::header::{ContentLength, Location, UserAgent};
use hyper_tls::HttpsConnector;
use slog::Logger;
use std::str::FromStr;
use std::sync::Arc;
use tokio_core::reactor::Core;

//
// HttpRequesterFactory trait + implementations
//
// Factories exist so that worker pools can hand each thread its own requester
// (a `tokio_core::reactor::Core` is not `Send`).
//

pub trait HttpRequesterFactory: Send {
    // This is here because it's difficult to make a trait cloneable.
    fn clone_box(&self) -> Box<HttpRequesterFactory>;

    fn create(&self) -> Box<HttpRequester>;
}

#[derive(Clone, Debug)]
pub struct HttpRequesterFactoryLive {}

impl HttpRequesterFactory for HttpRequesterFactoryLive {
    fn clone_box(&self) -> Box<HttpRequesterFactory> {
        Box::new(Self {})
    }

    fn create(&self) -> Box<HttpRequester> {
        let core = Core::new().unwrap();
        let client = Client::configure()
            .connector(HttpsConnector::new(4, &core.handle()).unwrap())
            .build(&core.handle());
        Box::new(HttpRequesterLive {
            client: client,
            core:   core,
        })
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequesterFactoryPassThrough {
    pub data: Arc<Vec<u8>>,
}

impl HttpRequesterFactory for HttpRequesterFactoryPassThrough {
    fn clone_box(&self) -> Box<HttpRequesterFactory> {
        Box::new(Self {
            data: Arc::clone(&self.data),
        })
    }

    fn create(&self) -> Box<HttpRequester> {
        Box::new(HttpRequesterPassThrough {
            data: Arc::clone(&self.data),
        })
    }
}

//
// HttpRequester trait + implementations
//

// Maximum number of redirects that we'll follow.
const REDIRECT_LIMIT: i64 = 5;

pub trait HttpRequester {
    /// Executes a request and returns its final status, response headers,
    /// body, and the URI it terminated on (which may differ from the
    /// request's if we were redirected).
    fn execute(&mut self, log: &Logger, req: Request)
        -> Result<(StatusCode, Headers, Vec<u8>, String)>;
}

#[derive(Debug)]
pub struct HttpRequesterLive {
    pub client: Client<HttpsConnector<HttpConnector>, Body>,
    pub core:   Core,
}

impl HttpRequesterLive {
    fn execute_inner(
        &mut self,
        log: &Logger,
        mut req: Request,
        redirect_depth: i64,
    ) -> Result<(StatusCode, Headers, Vec<u8>, String)> {
        if redirect_depth >= REDIRECT_LIMIT {
            return Err(Error::from("Hit HTTP redirect limit and not continuing"));
        }

        req.headers_mut()
            .set::<UserAgent>(UserAgent::new("Podhost/1.0".to_owned()));

        info!(log, "Executing HTTP request"; "redirect_depth" => redirect_depth,
            "method" => format!("{}", req.method()), "uri" => format!("{}", req.uri()));

        let method = req.method().clone();
        let uri = req.uri().to_string();

        let res = self.core
            .run(self.client.request(req))
            .chain_err(|| format!("Error requesting URL: {}", uri))?;
        let status = res.status();
        let headers = res.headers().clone();

        // Follow redirects.
        if status.is_redirection() {
            let new_uri = match headers.get::<Location>() {
                Some(uri) => Uri::from_str(uri).map_err(Error::from),
                None => Err(Error::from(
                    "Received redirection without `Location` header",
                )),
            }?;

            let new_req = Request::new(method, new_uri);
            let (status, headers, body, last_uri) =
                self.execute_inner(log, new_req, redirect_depth + 1)?;

            // If we got a permanent redirect we return the final URI so that it can be
            // persisted for next time we need to make this request. Otherwise,
            // we return the original URI that came in with the request.
            let uri = if status == StatusCode::PermanentRedirect {
                last_uri
            } else {
                uri
            };

            return Ok((status, headers, body, uri));
        }

        let body = self.core
            .run(res.body().concat2())
            .chain_err(|| format!("Error reading body from URL: {}", uri))?;
        Ok((status, headers, (*body).to_vec(), uri))
    }
}

impl HttpRequester for HttpRequesterLive {
    fn execute(
        &mut self,
        log: &Logger,
        req: Request,
    ) -> Result<(StatusCode, Headers, Vec<u8>, String)> {
        self.execute_inner(log, req, 0)
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequesterPassThrough {
    pub data: Arc<Vec<u8>>,
}

impl HttpRequester for HttpRequesterPassThrough {
    fn execute(
        &mut self,
        _log: &Logger,
        req: Request,
    ) -> Result<(StatusCode, Headers, Vec<u8>, String)> {
        let uri = req.uri().to_string();
        let mut headers = Headers::new();
        headers.set(ContentLength(self.data.len() as u64));
        Ok((StatusCode::Ok, headers, (*self.data).clone(), uri))
    }
}
