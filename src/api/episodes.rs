use errors::*;
use model;
use schema;

use diesel::pg::PgConnection;
use diesel::prelude::*;

pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::episode_creator;
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
        media_url: String,
        title:     String,

        description:      Option<String>,
        duration_seconds: Option<i32>,
        explicit:         Option<bool>,
        guid:             Option<String>,
        image_url:        Option<String>,
        media_type:       Option<String>,
        published_at:     Option<DateTime<Utc>>,
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
        episode: model::Episode,
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::CREATED,
                &views::EpisodeView::build(&self.podcast, &self.episode),
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

        let res = episode_creator::Mediator {
            account:          &params.account,
            conn:             conn,
            description:      params.body.description.as_ref().map(String::as_str),
            duration_seconds: params.body.duration_seconds,
            explicit:         params.body.explicit,
            guid:             params.body.guid.as_ref().map(String::as_str),
            image_url:        params.body.image_url.as_ref().map(String::as_str),
            media_type:       params.body.media_type.as_ref().map(String::as_str),
            media_url:        params.body.media_url.as_str(),
            podcast:          &podcast,
            published_at:     params.body.published_at,
            title:            params.body.title.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            episode: res.episode,
            podcast: podcast,
        })
    }
}

pub mod destroy {
    use api;
    use errors::*;
    use mediators::episode_destroyer;
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
        account:    model::Account,
        episode_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    api::require_account(req)?,
                episode_id: api::id_param(req, "id")?,
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
        let (episode, podcast) = super::select_episode_with_podcast(conn, params.episode_id)?;

        episode_destroyer::Mediator {
            account: &params.account,
            conn:    conn,
            episode: &episode,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel)
    }
}

pub mod list {
    use api;
    use api::views;
    use errors::*;
    use mediators::podcast_accessor;
    use model;
    use model::ModerationStatus;
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
        episodes: Vec<model::Episode>,
        podcast:  model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            let views: Vec<views::EpisodeView> = self.episodes
                .iter()
                .map(|episode| views::EpisodeView::build(&self.podcast, episode))
                .collect();
            api::render_json(StatusCode::OK, &views)
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let podcast = podcast_accessor::Mediator {
            account:    params.account.as_ref(),
            conn:       conn,
            podcast_id: params.podcast_id,
        }.run(log)?
            .podcast;

        let is_owner_or_admin = match params.account {
            Some(ref account) => account.admin || account.id == podcast.account_id,
            None => false,
        };

        let episodes = time_helpers::log_timed(
            &log.new(o!("step" => "select_episodes")),
            |_log| {
                let query = schema::episode::table
                    .filter(schema::episode::podcast_id.eq(podcast.id))
                    .order(schema::episode::published_at.desc());

                // Owners and admins see everything including drafts
                if is_owner_or_admin {
                    query.load::<model::Episode>(conn)
                } else {
                    query
                        .filter(
                            schema::episode::status.eq(ModerationStatus::Approved.as_str()),
                        )
                        .load::<model::Episode>(conn)
                }.chain_err(|| "Error selecting episodes")
            },
        )?;

        Ok(ViewModel { episodes, podcast })
    }
}

pub mod show {
    use api;
    use api::views;
    use errors::*;
    use mediators::episode_accessor;
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
        episode_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    ::middleware::api::authenticator::account(req),
                episode_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        episode: model::Episode,
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::EpisodeView::build(&self.podcast, &self.episode),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = episode_accessor::Mediator {
            account:    params.account.as_ref(),
            conn:       conn,
            episode_id: params.episode_id,
        }.run(log)?;

        Ok(ViewModel {
            episode: res.episode,
            podcast: res.podcast,
        })
    }
}

pub mod submit {
    use api;
    use api::views;
    use errors::*;
    use mediators::episode_submitter;
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
        episode_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:    api::require_account(req)?,
                episode_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        episode: model::Episode,
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::EpisodeView::build(&self.podcast, &self.episode),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let (episode, podcast) = super::select_episode_with_podcast(conn, params.episode_id)?;

        let res = episode_submitter::Mediator {
            account: &params.account,
            conn:    conn,
            episode: &episode,
            podcast: &podcast,
        }.run(log)?;

        Ok(ViewModel {
            episode: res.episode,
            podcast: podcast,
        })
    }
}

pub mod update {
    use api;
    use api::views;
    use errors::*;
    use mediators::episode_updater;
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
        description:      Option<String>,
        duration_seconds: Option<i32>,
        explicit:         Option<bool>,
        image_url:        Option<String>,
        media_type:       Option<String>,
        media_url:        Option<String>,
        title:            Option<String>,
    }

    pub struct Params {
        account:    model::Account,
        body:       Body,
        episode_id: i64,
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
                episode_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        episode: model::Episode,
        podcast: model::Podcast,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::EpisodeView::build(&self.podcast, &self.episode),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let (episode, podcast) = super::select_episode_with_podcast(conn, params.episode_id)?;

        let res = episode_updater::Mediator {
            account:          &params.account,
            conn:             conn,
            description:      params.body.description.as_ref().map(String::as_str),
            duration_seconds: params.body.duration_seconds,
            episode:          &episode,
            explicit:         params.body.explicit,
            image_url:        params.body.image_url.as_ref().map(String::as_str),
            media_type:       params.body.media_type.as_ref().map(String::as_str),
            media_url:        params.body.media_url.as_ref().map(String::as_str),
            podcast:          &podcast,
            title:            params.body.title.as_ref().map(String::as_str),
        }.run(log)?;

        Ok(ViewModel {
            episode: res.episode,
            podcast: podcast,
        })
    }
}

//
// Private functions
//

/// Loads an episode and its parent podcast without any access filtering.
/// Only for use by endpoints that follow up with an owner check via a
/// mediator.
fn select_episode_with_podcast(
    conn: &PgConnection,
    episode_id: i64,
) -> Result<(model::Episode, model::Podcast)> {
    let episode: Option<model::Episode> = schema::episode::table
        .filter(schema::episode::id.eq(episode_id))
        .first(conn)
        .optional()
        .chain_err(|| "Error selecting episode")?;
    let episode = match episode {
        Some(episode) => episode,
        None => bail!(user_errors::not_found("episode", episode_id)),
    };

    let podcast: model::Podcast = schema::podcast::table
        .filter(schema::podcast::id.eq(episode.podcast_id))
        .first(conn)
        .chain_err(|| "Error selecting podcast")?;

    Ok((episode, podcast))
}
