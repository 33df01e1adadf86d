pub mod account_authenticator;
pub mod account_creator;
pub mod account_password_authenticator;
pub mod admin_password_resetter;
pub mod cleaner;
pub mod common;
pub mod drive_config_upserter;
pub mod email_config_upserter;
pub mod episode_accessor;
pub mod episode_creator;
pub mod episode_destroyer;
pub mod episode_size_backfiller;
pub mod episode_submitter;
pub mod episode_updater;
pub mod invitation_accepter;
pub mod invitation_creator;
pub mod key_creator;
pub mod media_asset_registrar;
pub mod moderation_batcher;
pub mod playlist_creator;
pub mod playlist_destroyer;
pub mod playlist_episode_adder;
pub mod playlist_episode_remover;
pub mod podcast_accessor;
pub mod podcast_creator;
pub mod podcast_destroyer;
pub mod podcast_submitter;
pub mod podcast_subscriber;
pub mod podcast_unsubscriber;
pub mod podcast_updater;
