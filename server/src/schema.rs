diesel::table! {
    images (id) {
        id -> Uuid,
        user_id -> Uuid,
        content_type -> Varchar,
        data -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    recipes (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        author -> Varchar,
        date_published -> Varchar,
        image -> Nullable<Varchar>,
        image_storage_id -> Nullable<Uuid>,
        ingredients -> Jsonb,
        steps -> Jsonb,
        prep_time_minutes -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    upload_tickets (id) {
        id -> Uuid,
        user_id -> Uuid,
        expires_at -> Timestamptz,
        used_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(images -> users (user_id));
diesel::joinable!(recipes -> users (user_id));
diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(upload_tickets -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(images, recipes, sessions, upload_tickets, users,);
