#![recursion_limit = "128"]

extern crate actix;
extern crate actix_web;
extern crate bytes;
#[macro_use]
extern crate chan;
extern crate chrono;
extern crate crypto;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate error_chain;
extern crate futures;
extern crate http;
extern crate hyper;
extern crate hyper_tls;
#[macro_use]
extern crate lazy_static;
extern crate native_tls;
extern crate r2d2;
extern crate r2d2_diesel;
extern crate rand;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate serde_urlencoded;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_term;
extern crate time;
extern crate tokio_core;
extern crate url;
extern crate uuid;

pub mod errors;
#[macro_use]
pub mod server;

pub mod api;
pub mod artwork;
pub mod error_helpers;
pub mod http_requester;
pub mod mediators;
pub mod middleware;
pub mod model;
pub mod time_helpers;

// Generated file: skip rustfmt
#[cfg_attr(rustfmt, rustfmt_skip)]
pub mod schema;

#[cfg(test)]
mod test_data;
#[cfg(test)]
mod test_helpers;
