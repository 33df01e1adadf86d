//! The application's data layer containing models that will be queried from
//! and inserted into the database.
//!
//! Simple helper functions are allowed, but they should be kept extremely
//! simple, with preference for any and all domain logic to be offloaded to a
//! mediator.
//!
//! Insertable models are found in the `insertable` module. These are distinct
//! from queryable models so that we can take advantage of default values
//! provided by the database (the best example being ID sequences, but applies
//! to any field with a `DEFAULT`).

use errors::*;

use chrono::{DateTime, Utc};

//
// Enums
//
// Stored as `TEXT` columns. Postgres `CHECK` constraints keep rows honest and
// these types keep Rust honest.
//

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetKind {
    Audio,
    Image,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            AssetKind::Audio => "audio",
            AssetKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Result<AssetKind> {
        match s {
            "audio" => Ok(AssetKind::Audio),
            "image" => Ok(AssetKind::Image),
            _ => Err(user_errors::validation(format!(
                "\"{}\" is not a valid media kind. Valid kinds are: audio, image.",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModerationStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match *self {
            ModerationStatus::Draft => "draft",
            ModerationStatus::PendingApproval => "pending_approval",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<ModerationStatus> {
        match s {
            "draft" => Ok(ModerationStatus::Draft),
            "pending_approval" => Ok(ModerationStatus::PendingApproval),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            _ => Err(user_errors::validation(format!(
                "\"{}\" is not a valid status. Valid statuses are: draft, pending_approval, \
                 approved, rejected.",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Result<Visibility> {
        match s {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            _ => Err(user_errors::validation(format!(
                "\"{}\" is not a valid visibility. Valid visibilities are: public, unlisted, \
                 private.",
                s
            ))),
        }
    }
}

//
// Models
//

#[derive(Clone, Debug, Queryable)]
pub struct Account {
    pub id:              i64,
    pub admin:           bool,
    pub created_at:      DateTime<Utc>,
    pub email:           String,
    pub last_ip:         String,
    pub last_seen_at:    DateTime<Utc>,
    pub password_scrypt: String,
}

#[derive(Clone, Debug, Queryable)]
pub struct ContentInvitation {
    pub id:          i64,
    pub accepted_at: Option<DateTime<Utc>>,
    pub account_id:  Option<i64>,
    pub created_at:  DateTime<Utc>,
    pub email:       String,
    pub expires_at:  Option<DateTime<Utc>>,
    pub podcast_id:  i64,
    pub token:       String,
}

impl ContentInvitation {
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

#[derive(Clone, Debug, Queryable)]
pub struct DriveConfig {
    pub id:                    i64,
    pub enabled:               bool,
    pub folder_id:             String,
    pub service_account_email: String,
    pub singleton:             bool,
    pub updated_at:            DateTime<Utc>,
}

#[derive(Clone, Debug, Queryable)]
pub struct EmailConfig {
    pub id:            i64,
    pub from_address:  String,
    pub singleton:     bool,
    pub smtp_host:     String,
    pub smtp_password: Option<String>,
    pub smtp_port:     i32,
    pub smtp_username: Option<String>,
    pub updated_at:    DateTime<Utc>,
    pub use_tls:       bool,
}

#[derive(Clone, Debug, Queryable)]
pub struct Episode {
    pub id:               i64,
    pub created_at:       DateTime<Utc>,
    pub description:      Option<String>,
    pub duration_seconds: Option<i32>,
    pub explicit:         Option<bool>,
    pub guid:             String,
    pub image_url:        Option<String>,
    pub media_size_bytes: Option<i64>,
    pub media_type:       Option<String>,
    pub media_url:        String,
    pub podcast_id:       i64,
    pub published_at:     DateTime<Utc>,
    pub status:           String,
    pub title:            String,
    pub updated_at:       DateTime<Utc>,
}

impl Episode {
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved.as_str()
    }
}

#[derive(Clone, Debug, Queryable)]
pub struct Key {
    pub id:         i64,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
    pub expire_at:  Option<DateTime<Utc>>,
    pub secret:     String,
}

#[derive(Clone, Debug, Queryable)]
pub struct MediaAsset {
    pub id:           i64,
    pub account_id:   i64,
    pub content_type: Option<String>,
    pub created_at:   DateTime<Utc>,
    pub kind:         String,
    pub size_bytes:   Option<i64>,
    pub url:          String,
}

#[derive(Clone, Debug, Queryable)]
pub struct Playlist {
    pub id:          i64,
    pub account_id:  i64,
    pub created_at:  DateTime<Utc>,
    pub description: Option<String>,
    pub title:       String,
}

#[derive(Clone, Debug, Queryable)]
pub struct PlaylistEpisode {
    pub id:          i64,
    pub episode_id:  i64,
    pub playlist_id: i64,
    pub position:    i32,
}

#[derive(Clone, Debug, Queryable)]
pub struct Podcast {
    pub id:          i64,
    pub account_id:  i64,
    pub created_at:  DateTime<Utc>,
    pub description: Option<String>,
    pub image_url:   Option<String>,
    pub language:    Option<String>,
    pub link_url:    Option<String>,
    pub status:      String,
    pub title:       String,
    pub updated_at:  DateTime<Utc>,
    pub visibility:  String,
}

impl Podcast {
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved.as_str()
    }

    /// Whether the podcast shows up in public surfaces like explore. Per-
    /// account access (owner, admin, invitation) is checked by mediators.
    pub fn is_listed(&self) -> bool {
        self.is_approved() && self.visibility == Visibility::Public.as_str()
    }
}

#[derive(Clone, Debug, Default, Queryable)]
pub struct Subscription {
    pub id:              i64,
    pub account_id:      i64,
    pub podcast_id:      i64,
    pub subscribed_at:   Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.subscribed_at.is_some() && self.unsubscribed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use model::*;

    use chrono::{Duration, Utc};

    #[test]
    fn test_subscription_is_active() {
        let mut subscription = Subscription::default();
        assert!(!subscription.is_active());

        subscription.subscribed_at = Some(Utc::now());
        assert!(subscription.is_active());

        subscription.unsubscribed_at = Some(Utc::now());
        assert!(!subscription.is_active());
    }

    #[test]
    fn test_moderation_status_parse() {
        assert_eq!(
            ModerationStatus::PendingApproval,
            ModerationStatus::parse("pending_approval").unwrap()
        );
        assert_eq!(
            "pending_approval",
            ModerationStatus::PendingApproval.as_str()
        );
        assert!(ModerationStatus::parse("published").is_err());
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!(Visibility::Unlisted, Visibility::parse("unlisted").unwrap());
        assert!(Visibility::parse("hidden").is_err());
    }

    #[test]
    fn test_invitation_is_expired() {
        let now = Utc::now();
        let mut invitation = ContentInvitation {
            id:          1,
            accepted_at: None,
            account_id:  None,
            created_at:  now,
            email:       "listener@example.com".to_owned(),
            expires_at:  None,
            podcast_id:  1,
            token:       "x".to_owned(),
        };
        assert!(!invitation.is_expired(now));

        invitation.expires_at = Some(now - Duration::hours(1));
        assert!(invitation.is_expired(now));

        invitation.expires_at = Some(now + Duration::hours(1));
        assert!(!invitation.is_expired(now));
    }
}

pub mod insertable {
    use schema::{account, content_invitation, drive_config, email_config, episode, key,
                 media_asset, playlist, playlist_episode, podcast, subscription};

    use chrono::{DateTime, Utc};

    #[derive(Insertable)]
    #[table_name = "account"]
    pub struct Account {
        pub admin:           bool,
        pub email:           String,
        pub last_ip:         String,
        pub password_scrypt: String,
    }

    #[derive(Insertable)]
    #[table_name = "content_invitation"]
    pub struct ContentInvitation {
        pub email:      String,
        pub expires_at: Option<DateTime<Utc>>,
        pub podcast_id: i64,
        pub token:      String,
    }

    #[derive(AsChangeset, Insertable)]
    #[table_name = "drive_config"]
    pub struct DriveConfig {
        pub enabled:               bool,
        pub folder_id:             String,
        pub service_account_email: String,
        pub updated_at:            DateTime<Utc>,
    }

    #[changeset_options(treat_none_as_null = "true")]
    #[derive(AsChangeset, Insertable)]
    #[table_name = "email_config"]
    pub struct EmailConfig {
        pub from_address:  String,
        pub smtp_host:     String,
        pub smtp_password: Option<String>,
        pub smtp_port:     i32,
        pub smtp_username: Option<String>,
        pub updated_at:    DateTime<Utc>,
        pub use_tls:       bool,
    }

    #[derive(Insertable)]
    #[table_name = "episode"]
    pub struct Episode {
        pub description:      Option<String>,
        pub duration_seconds: Option<i32>,
        pub explicit:         Option<bool>,
        pub guid:             String,
        pub image_url:        Option<String>,
        pub media_type:       Option<String>,
        pub media_url:        String,
        pub podcast_id:       i64,
        pub published_at:     DateTime<Utc>,
        pub status:           String,
        pub title:            String,
    }

    #[derive(Insertable)]
    #[table_name = "key"]
    pub struct Key {
        pub account_id: i64,
        pub expire_at:  Option<DateTime<Utc>>,
        pub secret:     String,
    }

    #[derive(Insertable)]
    #[table_name = "media_asset"]
    pub struct MediaAsset {
        pub account_id:   i64,
        pub content_type: Option<String>,
        pub kind:         String,
        pub size_bytes:   Option<i64>,
        pub url:          String,
    }

    #[derive(Insertable)]
    #[table_name = "playlist"]
    pub struct Playlist {
        pub account_id:  i64,
        pub description: Option<String>,
        pub title:       String,
    }

    #[derive(Insertable)]
    #[table_name = "playlist_episode"]
    pub struct PlaylistEpisode {
        pub episode_id:  i64,
        pub playlist_id: i64,
        pub position:    i32,
    }

    #[derive(Insertable)]
    #[table_name = "podcast"]
    pub struct Podcast {
        pub account_id:  i64,
        pub description: Option<String>,
        pub image_url:   Option<String>,
        pub language:    Option<String>,
        pub link_url:    Option<String>,
        pub status:      String,
        pub title:       String,
        pub visibility:  String,
    }

    #[derive(Insertable)]
    #[table_name = "subscription"]
    pub struct Subscription {
        pub account_id:      i64,
        pub podcast_id:      i64,
        pub subscribed_at:   Option<DateTime<Utc>>,
        pub unsubscribed_at: Option<DateTime<Utc>>,
    }
}
