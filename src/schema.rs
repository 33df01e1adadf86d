table! {
    account (id) {
        id -> Int8,
        admin -> Bool,
        created_at -> Timestamptz,
        email -> Text,
        last_ip -> Text,
        last_seen_at -> Timestamptz,
        password_scrypt -> Text,
    }
}

table! {
    content_invitation (id) {
        id -> Int8,
        accepted_at -> Nullable<Timestamptz>,
        account_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        email -> Text,
        expires_at -> Nullable<Timestamptz>,
        podcast_id -> Int8,
        token -> Text,
    }
}

table! {
    drive_config (id) {
        id -> Int8,
        enabled -> Bool,
        folder_id -> Text,
        service_account_email -> Text,
        singleton -> Bool,
        updated_at -> Timestamptz,
    }
}

table! {
    email_config (id) {
        id -> Int8,
        from_address -> Text,
        singleton -> Bool,
        smtp_host -> Text,
        smtp_password -> Nullable<Text>,
        smtp_port -> Int4,
        smtp_username -> Nullable<Text>,
        updated_at -> Timestamptz,
        use_tls -> Bool,
    }
}

table! {
    episode (id) {
        id -> Int8,
        created_at -> Timestamptz,
        description -> Nullable<Text>,
        duration_seconds -> Nullable<Int4>,
        explicit -> Nullable<Bool>,
        guid -> Text,
        image_url -> Nullable<Text>,
        media_size_bytes -> Nullable<Int8>,
        media_type -> Nullable<Text>,
        media_url -> Text,
        podcast_id -> Int8,
        published_at -> Timestamptz,
        status -> Text,
        title -> Text,
        updated_at -> Timestamptz,
    }
}

table! {
    key (id) {
        id -> Int8,
        account_id -> Int8,
        created_at -> Timestamptz,
        expire_at -> Nullable<Timestamptz>,
        secret -> Text,
    }
}

table! {
    media_asset (id) {
        id -> Int8,
        account_id -> Int8,
        content_type -> Nullable<Text>,
        created_at -> Timestamptz,
        kind -> Text,
        size_bytes -> Nullable<Int8>,
        url -> Text,
    }
}

table! {
    playlist (id) {
        id -> Int8,
        account_id -> Int8,
        created_at -> Timestamptz,
        description -> Nullable<Text>,
        title -> Text,
    }
}

table! {
    playlist_episode (id) {
        id -> Int8,
        episode_id -> Int8,
        playlist_id -> Int8,
        position -> Int4,
    }
}

table! {
    podcast (id) {
        id -> Int8,
        account_id -> Int8,
        created_at -> Timestamptz,
        description -> Nullable<Text>,
        image_url -> Nullable<Text>,
        language -> Nullable<Text>,
        link_url -> Nullable<Text>,
        status -> Text,
        title -> Text,
        updated_at -> Timestamptz,
        visibility -> Text,
    }
}

table! {
    subscription (id) {
        id -> Int8,
        account_id -> Int8,
        podcast_id -> Int8,
        subscribed_at -> Nullable<Timestamptz>,
        unsubscribed_at -> Nullable<Timestamptz>,
    }
}

joinable!(content_invitation -> podcast (podcast_id));
joinable!(episode -> podcast (podcast_id));
joinable!(key -> account (account_id));
joinable!(media_asset -> account (account_id));
joinable!(playlist -> account (account_id));
joinable!(playlist_episode -> episode (episode_id));
joinable!(playlist_episode -> playlist (playlist_id));
joinable!(podcast -> account (account_id));
joinable!(subscription -> podcast (podcast_id));

allow_tables_to_appear_in_same_query!(
    account,
    content_invitation,
    drive_config,
    email_config,
    episode,
    key,
    media_asset,
    playlist,
    playlist_episode,
    podcast,
    subscription,
);
