use model;
use test_helpers;

use diesel::pg::PgConnection;
use slog::Logger;

pub mod account {
    use mediators::account_creator;
    use test_data::*;

    use rand;
    use rand::Rng;

    pub struct Args<'a> {
        pub admin: bool,
        pub email: Option<&'a str>,
    }

    pub fn insert(log: &Logger, conn: &PgConnection) -> model::Account {
        insert_args(
            log,
            conn,
            Args {
                admin: false,
                email: None,
            },
        )
    }

    pub fn insert_args(log: &Logger, conn: &PgConnection, args: Args) -> model::Account {
        let mut rng = rand::thread_rng();

        let email = match args.email {
            Some(email) => email.to_owned(),

            // Add a little randomness to emails so that we don't trip the
            // uniqueness constraint inserting more than one account.
            None => format!("test-{}@example.com", rng.gen::<u64>()),
        };

        account_creator::Mediator {
            admin:        args.admin,
            conn:         conn,
            create_key:   true,
            email:        email.as_str(),
            last_ip:      "1.2.3.4",
            password:     test_helpers::PASSWORD,
            scrypt_log_n: test_helpers::SCRYPT_LOG_N,
        }.run(log)
            .unwrap()
            .account
    }
}

pub mod content_invitation {
    use mediators::invitation_creator;
    use test_data::*;

    #[derive(Default)]
    pub struct Args<'a> {
        pub podcast: Option<&'a model::Podcast>,
    }

    pub fn insert(log: &Logger, conn: &PgConnection) -> model::ContentInvitation {
        insert_args(log, conn, Args::default())
    }

    pub fn insert_args(
        log: &Logger,
        conn: &PgConnection,
        args: Args,
    ) -> model::ContentInvitation {
        // The default test podcast is private, which is what invitations
        // require.
        let podcast = if args.podcast.is_none() {
            Some(super::podcast::insert(log, conn))
        } else {
            None
        };
        let podcast_ref = args.podcast.unwrap_or_else(|| podcast.as_ref().unwrap());

        let owner: model::Account = {
            use diesel::prelude::*;
            use schema;
            schema::account::table
                .filter(schema::account::id.eq(podcast_ref.account_id))
                .first(conn)
                .unwrap()
        };

        invitation_creator::Mediator {
            account:    &owner,
            conn:       conn,
            email:      "listener@example.com",
            expires_at: None,
            podcast:    podcast_ref,
        }.run(log)
            .unwrap()
            .invitation
    }
}

pub mod episode {
    use mediators::episode_creator;
    use test_data::*;

    use rand;
    use rand::Rng;

    #[derive(Default)]
    pub struct Args<'a> {
        pub podcast: Option<&'a model::Podcast>,
    }

    pub fn insert(log: &Logger, conn: &PgConnection) -> model::Episode {
        insert_args(log, conn, Args::default())
    }

    pub fn insert_args(log: &Logger, conn: &PgConnection, args: Args) -> model::Episode {
        let mut rng = rand::thread_rng();

        let podcast = if args.podcast.is_none() {
            Some(super::podcast::insert(log, conn))
        } else {
            None
        };
        let podcast_ref = args.podcast.unwrap_or_else(|| podcast.as_ref().unwrap());

        let owner: model::Account = {
            use diesel::prelude::*;
            use schema;
            schema::account::table
                .filter(schema::account::id.eq(podcast_ref.account_id))
                .first(conn)
                .unwrap()
        };

        // Add a little randomness to media URLs so that episodes look
        // distinct from one another.
        let media_url = format!("https://example.com/episode-{}.mp3", rng.gen::<u64>());

        episode_creator::Mediator {
            account:          &owner,
            conn:             conn,
            description:      None,
            duration_seconds: None,
            explicit:         None,
            guid:             None,
            image_url:        None,
            media_type:       Some("audio/mpeg"),
            media_url:        media_url.as_str(),
            podcast:          podcast_ref,
            published_at:     None,
            title:            "Episode Title",
        }.run(log)
            .unwrap()
            .episode
    }
}

pub mod key {
    use mediators::key_creator;
    use test_data::*;

    use chrono::{DateTime, Utc};

    #[derive(Default)]
    pub struct Args<'a> {
        pub account:   Option<&'a model::Account>,
        pub expire_at: Option<DateTime<Utc>>,
    }

    #[allow(dead_code)]
    pub fn insert(log: &Logger, conn: &PgConnection) -> model::Key {
        insert_args(log, conn, Args::default())
    }

    pub fn insert_args(log: &Logger, conn: &PgConnection, args: Args) -> model::Key {
        let account = if args.account.is_none() {
            Some(super::account::insert(log, conn))
        } else {
            None
        };

        key_creator::Mediator {
            account: args.account.unwrap_or_else(|| account.as_ref().unwrap()),
            conn,
            expire_at: args.expire_at,
        }.run(log)
            .unwrap()
            .key
    }
}

pub mod playlist {
    use mediators::playlist_creator;
    use test_data::*;

    use rand;
    use rand::Rng;

    #[derive(Default)]
    pub struct Args<'a> {
        pub account: Option<&'a model::Account>,
    }

    #[allow(dead_code)]
    pub fn insert(log: &Logger, conn: &PgConnection) -> model::Playlist {
        insert_args(log, conn, Args::default())
    }

    pub fn insert_args(log: &Logger, conn: &PgConnection, args: Args) -> model::Playlist {
        let mut rng = rand::thread_rng();

        let account = if args.account.is_none() {
            Some(super::account::insert(log, conn))
        } else {
            None
        };

        // Add a little randomness to titles so that we don't trip the
        // uniqueness constraint inserting more than one playlist.
        let title = format!("Playlist {}", rng.gen::<u64>());

        playlist_creator::Mediator {
            account: args.account.unwrap_or_else(|| account.as_ref().unwrap()),
            conn,
            description: None,
            title: title.as_str(),
        }.run(log)
            .unwrap()
            .playlist
    }
}

pub mod podcast {
    use mediators::podcast_creator;
    use test_data::*;

    #[derive(Default)]
    pub struct Args<'a> {
        pub account:    Option<&'a model::Account>,
        pub visibility: Option<&'a str>,
    }

    pub fn insert(log: &Logger, conn: &PgConnection) -> model::Podcast {
        insert_args(log, conn, Args::default())
    }

    pub fn insert_args(log: &Logger, conn: &PgConnection, args: Args) -> model::Podcast {
        let account = if args.account.is_none() {
            Some(super::account::insert(log, conn))
        } else {
            None
        };

        podcast_creator::Mediator {
            account: args.account.unwrap_or_else(|| account.as_ref().unwrap()),
            conn,
            description: Some("A show about the show."),
            image_url: None,
            language: Some("en-US"),
            link_url: None,
            title: "Example Podcast",
            visibility: args.visibility,
        }.run(log)
            .unwrap()
            .podcast
    }
}
