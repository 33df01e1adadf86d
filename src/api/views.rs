//! Serializable shapes that endpoints hand back to clients. Build functions
//! take models and resolve anything derived, like artwork URLs.

use artwork;
use mediators::moderation_batcher;
use model;

use chrono::{DateTime, Utc};

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id:    i64,
    pub admin: bool,
    pub email: String,
}

impl AccountView {
    pub fn build(account: &model::Account) -> AccountView {
        AccountView {
            id:    account.id,
            admin: account.admin,
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkItemView {
    pub id: i64,
    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResultView {
    pub num_failed:    usize,
    pub num_succeeded: usize,
    pub results:       Vec<BulkItemView>,
}

impl BulkResultView {
    pub fn build(res: &moderation_batcher::RunResult) -> BulkResultView {
        BulkResultView {
            num_failed:    res.num_failed,
            num_succeeded: res.num_succeeded,
            results:       res.results
                .iter()
                .map(|r| BulkItemView {
                    id:      r.id,
                    message: r.message.clone(),
                    ok:      r.ok,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DriveConfigView {
    pub enabled:               bool,
    pub folder_id:             String,
    pub service_account_email: String,
    pub updated_at:            DateTime<Utc>,
}

impl DriveConfigView {
    pub fn build(config: &model::DriveConfig) -> DriveConfigView {
        DriveConfigView {
            enabled:               config.enabled,
            folder_id:             config.folder_id.clone(),
            service_account_email: config.service_account_email.clone(),
            updated_at:            config.updated_at,
        }
    }
}

// The SMTP password is deliberately not part of the view. Admins can write
// it, but the API never echoes it back.
#[derive(Debug, Serialize)]
pub struct EmailConfigView {
    pub from_address:  String,
    pub smtp_host:     String,
    pub smtp_port:     i32,
    pub smtp_username: Option<String>,
    pub updated_at:    DateTime<Utc>,
    pub use_tls:       bool,
}

impl EmailConfigView {
    pub fn build(config: &model::EmailConfig) -> EmailConfigView {
        EmailConfigView {
            from_address:  config.from_address.clone(),
            smtp_host:     config.smtp_host.clone(),
            smtp_port:     config.smtp_port,
            smtp_username: config.smtp_username.clone(),
            updated_at:    config.updated_at,
            use_tls:       config.use_tls,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EpisodeView {
    pub id:               i64,
    pub description:      Option<String>,
    pub duration_seconds: Option<i32>,
    pub explicit:         Option<bool>,
    pub guid:             String,
    pub image_url:        String,
    pub media_size_bytes: Option<i64>,
    pub media_type:       Option<String>,
    pub media_url:        String,
    pub podcast_id:       i64,
    pub published_at:     DateTime<Utc>,
    pub status:           String,
    pub title:            String,
}

impl EpisodeView {
    pub fn build(podcast: &model::Podcast, episode: &model::Episode) -> EpisodeView {
        EpisodeView {
            id:               episode.id,
            description:      episode.description.clone(),
            duration_seconds: episode.duration_seconds,
            explicit:         episode.explicit,
            guid:             episode.guid.clone(),
            image_url:        artwork::episode_image_url(podcast, episode),
            media_size_bytes: episode.media_size_bytes,
            media_type:       episode.media_type.clone(),
            media_url:        episode.media_url.clone(),
            podcast_id:       episode.podcast_id,
            published_at:     episode.published_at,
            status:           episode.status.clone(),
            title:            episode.title.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvitationView {
    pub id:          i64,
    pub accepted_at: Option<DateTime<Utc>>,
    pub email:       String,
    pub expires_at:  Option<DateTime<Utc>>,
    pub podcast_id:  i64,
    pub token:       String,
}

impl InvitationView {
    pub fn build(invitation: &model::ContentInvitation) -> InvitationView {
        InvitationView {
            id:          invitation.id,
            accepted_at: invitation.accepted_at,
            email:       invitation.email.clone(),
            expires_at:  invitation.expires_at,
            podcast_id:  invitation.podcast_id,
            token:       invitation.token.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MediaAssetView {
    pub id:           i64,
    pub content_type: Option<String>,
    pub created_at:   DateTime<Utc>,
    pub kind:         String,
    pub size_bytes:   Option<i64>,
    pub url:          String,
}

impl MediaAssetView {
    pub fn build(media_asset: &model::MediaAsset) -> MediaAssetView {
        MediaAssetView {
            id:           media_asset.id,
            content_type: media_asset.content_type.clone(),
            created_at:   media_asset.created_at,
            kind:         media_asset.kind.clone(),
            size_bytes:   media_asset.size_bytes,
            url:          media_asset.url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PlaylistView {
    pub id:          i64,
    pub created_at:  DateTime<Utc>,
    pub description: Option<String>,
    pub title:       String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<EpisodeView>>,
}

impl PlaylistView {
    /// Builds a playlist summary without its episodes (for index listings).
    pub fn build(playlist: &model::Playlist) -> PlaylistView {
        PlaylistView {
            id:          playlist.id,
            created_at:  playlist.created_at,
            description: playlist.description.clone(),
            episodes:    None,
            title:       playlist.title.clone(),
        }
    }

    /// Builds a playlist along with its ordered episodes. Callers hand in
    /// `(podcast, episode)` pairs because artwork resolution needs the
    /// parent podcast.
    pub fn build_with_episodes(
        playlist: &model::Playlist,
        episodes: &[(model::Podcast, model::Episode)],
    ) -> PlaylistView {
        PlaylistView {
            id:          playlist.id,
            created_at:  playlist.created_at,
            description: playlist.description.clone(),
            episodes:    Some(
                episodes
                    .iter()
                    .map(|&(ref podcast, ref episode)| EpisodeView::build(podcast, episode))
                    .collect(),
            ),
            title:       playlist.title.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PodcastView {
    pub id:          i64,
    pub created_at:  DateTime<Utc>,
    pub description: Option<String>,
    pub image_url:   String,
    pub language:    Option<String>,
    pub link_url:    Option<String>,
    pub status:      String,
    pub title:       String,
    pub updated_at:  DateTime<Utc>,
    pub visibility:  String,
}

impl PodcastView {
    pub fn build(podcast: &model::Podcast) -> PodcastView {
        PodcastView {
            id:          podcast.id,
            created_at:  podcast.created_at,
            description: podcast.description.clone(),
            image_url:   artwork::podcast_image_url(podcast),
            language:    podcast.language.clone(),
            link_url:    podcast.link_url.clone(),
            status:      podcast.status.clone(),
            title:       podcast.title.clone(),
            updated_at:  podcast.updated_at,
            visibility:  podcast.visibility.clone(),
        }
    }
}

/// What a client gets back after signup or login: who they are and the
/// secret to present on subsequent requests.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub account: AccountView,
    pub secret:  String,
}

impl SessionView {
    pub fn build(account: &model::Account, key: &model::Key) -> SessionView {
        SessionView {
            account: AccountView::build(account),
            secret:  key.secret.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use api::views::*;
    use artwork;

    use chrono::Utc;
    use serde_json;

    #[test]
    fn test_episode_view_resolves_artwork() {
        let podcast = test_podcast(Some("https://example.com/cover.jpg"));
        let episode = test_episode(&podcast);

        let view = EpisodeView::build(&podcast, &episode);
        assert_eq!("https://example.com/cover.jpg", view.image_url);
    }

    #[test]
    fn test_podcast_view_default_artwork() {
        let podcast = test_podcast(None);
        let view = PodcastView::build(&podcast);
        assert_eq!(artwork::DEFAULT_ARTWORK_URL, view.image_url);
    }

    #[test]
    fn test_bulk_item_view_omits_empty_message() {
        let view = BulkItemView {
            id:      1,
            message: None,
            ok:      true,
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("message"));
    }

    //
    // Private types/functions
    //

    fn test_episode(podcast: &model::Podcast) -> model::Episode {
        model::Episode {
            id:               1,
            created_at:       Utc::now(),
            description:      None,
            duration_seconds: None,
            explicit:         None,
            guid:             "1".to_owned(),
            image_url:        None,
            media_size_bytes: None,
            media_type:       Some("audio/mpeg".to_owned()),
            media_url:        "https://example.com/episode-1.mp3".to_owned(),
            podcast_id:       podcast.id,
            published_at:     Utc::now(),
            status:           "approved".to_owned(),
            title:            "Episode Title".to_owned(),
            updated_at:       Utc::now(),
        }
    }

    fn test_podcast(image_url: Option<&str>) -> model::Podcast {
        model::Podcast {
            id:          1,
            account_id:  1,
            created_at:  Utc::now(),
            description: None,
            image_url:   image_url.map(|u| u.to_owned()),
            language:    None,
            link_url:    None,
            status:      "approved".to_owned(),
            title:       "Podcast Title".to_owned(),
            updated_at:  Utc::now(),
            visibility:  "public".to_owned(),
        }
    }
}
