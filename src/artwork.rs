use model;

/// Artwork served when neither an episode nor its podcast has cover art set.
pub static DEFAULT_ARTWORK_URL: &str = "/assets/default-artwork.png";

/// Resolves the artwork URL to display for an episode. Episode art wins,
/// then the parent podcast's art, then the platform default.
pub fn episode_image_url(podcast: &model::Podcast, episode: &model::Episode) -> String {
    if let Some(ref image_url) = episode.image_url {
        return image_url.clone();
    }
    podcast_image_url(podcast)
}

/// Resolves the artwork URL to display for a podcast.
pub fn podcast_image_url(podcast: &model::Podcast) -> String {
    match podcast.image_url {
        Some(ref image_url) => image_url.clone(),
        None => DEFAULT_ARTWORK_URL.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use artwork::*;
    use model;

    use chrono::Utc;

    #[test]
    fn test_episode_image_url_episode_art() {
        let podcast = podcast(Some("https://example.com/podcast.jpg"));
        let episode = episode(&podcast, Some("https://example.com/episode.jpg"));
        assert_eq!(
            "https://example.com/episode.jpg",
            episode_image_url(&podcast, &episode)
        );
    }

    #[test]
    fn test_episode_image_url_podcast_fallback() {
        let podcast = podcast(Some("https://example.com/podcast.jpg"));
        let episode = episode(&podcast, None);
        assert_eq!(
            "https://example.com/podcast.jpg",
            episode_image_url(&podcast, &episode)
        );
    }

    #[test]
    fn test_episode_image_url_default_fallback() {
        let podcast = podcast(None);
        let episode = episode(&podcast, None);
        assert_eq!(DEFAULT_ARTWORK_URL, episode_image_url(&podcast, &episode));
    }

    #[test]
    fn test_podcast_image_url() {
        assert_eq!(
            "https://example.com/podcast.jpg",
            podcast_image_url(&podcast(Some("https://example.com/podcast.jpg")))
        );
        assert_eq!(DEFAULT_ARTWORK_URL, podcast_image_url(&podcast(None)));
    }

    //
    // Private types/functions
    //

    fn episode(podcast: &model::Podcast, image_url: Option<&str>) -> model::Episode {
        model::Episode {
            id:               1,
            created_at:       Utc::now(),
            description:      None,
            duration_seconds: None,
            explicit:         None,
            guid:             "1".to_owned(),
            image_url:        image_url.map(|u| u.to_owned()),
            media_size_bytes: None,
            media_type:       Some("audio/mpeg".to_owned()),
            media_url:        "https://example.com/episode-1.mp3".to_owned(),
            podcast_id:       podcast.id,
            published_at:     Utc::now(),
            status:           model::ModerationStatus::Approved.as_str().to_owned(),
            title:            "Episode Title".to_owned(),
            updated_at:       Utc::now(),
        }
    }

    fn podcast(image_url: Option<&str>) -> model::Podcast {
        model::Podcast {
            id:          1,
            account_id:  1,
            created_at:  Utc::now(),
            description: None,
            image_url:   image_url.map(|u| u.to_owned()),
            language:    None,
            link_url:    None,
            status:      model::ModerationStatus::Approved.as_str().to_owned(),
            title:       "Podcast Title".to_owned(),
            updated_at:  Utc::now(),
            visibility:  model::Visibility::Public.as_str().to_owned(),
        }
    }
}
