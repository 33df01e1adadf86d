use errors::*;
use model;
use schema;

use diesel::pg::PgConnection;
use diesel::prelude::*;

pub mod add_episode {
    use api;
    use api::views;
    use errors::*;
    use mediators::episode_accessor;
    use mediators::playlist_episode_adder;
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
        episode_id: i64,
    }

    pub struct Params {
        account:     model::Account,
        body:        Body,
        playlist_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:     api::require_account(req)?,
                body:        api::parse_json_body(data)?,
                playlist_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        episodes: Vec<(model::Podcast, model::Episode)>,
        playlist: model::Playlist,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::PlaylistView::build_with_episodes(&self.playlist, &self.episodes),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let playlist = super::select_owned_playlist(conn, &params.account, params.playlist_id)?;

        // The caller must be able to see the episode they're adding
        let res = episode_accessor::Mediator {
            account:    Some(&params.account),
            conn:       conn,
            episode_id: params.body.episode_id,
        }.run(log)?;

        playlist_episode_adder::Mediator {
            account:  &params.account,
            conn:     conn,
            episode:  &res.episode,
            playlist: &playlist,
        }.run(log)?;

        let episodes = super::select_playlist_episodes(conn, &playlist)?;
        Ok(ViewModel { episodes, playlist })
    }
}

pub mod create {
    use api;
    use api::views;
    use errors::*;
    use mediators::playlist_creator;
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
        playlist: model::Playlist,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::CREATED,
                &views::PlaylistView::build(&self.playlist),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let res = playlist_creator::Mediator {
            account:     &params.account,
            conn:        conn,
            description: params.body.description.as_ref().map(String::as_str),
            title:       params.body.title.as_str(),
        }.run(log)?;

        Ok(ViewModel {
            playlist: res.playlist,
        })
    }
}

pub mod destroy {
    use api;
    use errors::*;
    use mediators::playlist_destroyer;
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
        account:     model::Account,
        playlist_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:     api::require_account(req)?,
                playlist_id: api::id_param(req, "id")?,
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
        let playlist = super::select_owned_playlist(conn, &params.account, params.playlist_id)?;

        playlist_destroyer::Mediator {
            account:  &params.account,
            conn:     conn,
            playlist: &playlist,
        }.run(log)?;

        Ok(ViewModel)
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
        playlists: Vec<model::Playlist>,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            let views: Vec<views::PlaylistView> = self.playlists
                .iter()
                .map(views::PlaylistView::build)
                .collect();
            api::render_json(StatusCode::OK, &views)
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let playlists = time_helpers::log_timed(
            &log.new(o!("step" => "select_playlists")),
            |_log| {
                schema::playlist::table
                    .filter(schema::playlist::account_id.eq(params.account.id))
                    .order(schema::playlist::created_at.desc())
                    .load::<model::Playlist>(conn)
                    .chain_err(|| "Error selecting playlists")
            },
        )?;

        Ok(ViewModel { playlists })
    }
}

pub mod remove_episode {
    use api;
    use errors::*;
    use mediators::playlist_episode_remover;
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
        account:     model::Account,
        episode_id:  i64,
        playlist_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:     api::require_account(req)?,
                episode_id:  api::id_param(req, "episode_id")?,
                playlist_id: api::id_param(req, "id")?,
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
        let playlist = super::select_owned_playlist(conn, &params.account, params.playlist_id)?;

        playlist_episode_remover::Mediator {
            account:    &params.account,
            conn:       conn,
            episode_id: params.episode_id,
            playlist:   &playlist,
        }.run(log)?;

        Ok(ViewModel)
    }
}

pub mod show {
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
        account:     model::Account,
        playlist_id: i64,
    }

    impl server::Params for Params {
        fn build<S: server::State>(
            _log: &Logger,
            req: &mut HttpRequest<S>,
            _data: Option<&[u8]>,
        ) -> Result<Self> {
            Ok(Params {
                account:     api::require_account(req)?,
                playlist_id: api::id_param(req, "id")?,
            })
        }
    }

    pub struct ViewModel {
        episodes: Vec<(model::Podcast, model::Episode)>,
        playlist: model::Playlist,
    }

    impl api::ViewModel for ViewModel {
        fn render(&self, _log: &Logger) -> Result<HttpResponse> {
            api::render_json(
                StatusCode::OK,
                &views::PlaylistView::build_with_episodes(&self.playlist, &self.episodes),
            )
        }
    }

    message_handler!();

    fn handle_inner(log: &Logger, conn: &PgConnection, params: &Params) -> Result<ViewModel> {
        let playlist = super::select_owned_playlist(conn, &params.account, params.playlist_id)?;
        let episodes = super::select_playlist_episodes(conn, &playlist)?;
        Ok(ViewModel { episodes, playlist })
    }
}

//
// Private functions
//

/// Loads a playlist, checking that it belongs to the given account.
/// Playlists are personal, so anyone else's playlist reads as missing.
fn select_owned_playlist(
    conn: &PgConnection,
    account: &model::Account,
    playlist_id: i64,
) -> Result<model::Playlist> {
    let playlist: Option<model::Playlist> = schema::playlist::table
        .filter(schema::playlist::id.eq(playlist_id))
        .filter(schema::playlist::account_id.eq(account.id))
        .first(conn)
        .optional()
        .chain_err(|| "Error selecting playlist")?;

    match playlist {
        Some(playlist) => Ok(playlist),
        None => Err(user_errors::not_found("playlist", playlist_id)),
    }
}

/// Loads a playlist's episodes (with their parent podcasts for artwork
/// resolution) in playlist order.
fn select_playlist_episodes(
    conn: &PgConnection,
    playlist: &model::Playlist,
) -> Result<Vec<(model::Podcast, model::Episode)>> {
    let rows = schema::playlist_episode::table
        .inner_join(schema::episode::table.inner_join(schema::podcast::table))
        .filter(schema::playlist_episode::playlist_id.eq(playlist.id))
        .order(schema::playlist_episode::position)
        .select((
            schema::podcast::all_columns,
            schema::episode::all_columns,
        ))
        .load::<(model::Podcast, model::Episode)>(conn)
        .chain_err(|| "Error selecting playlist episodes")?;

    Ok(rows)
}
