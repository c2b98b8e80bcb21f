//! Diesel table definitions. Must match `backend/migrations` exactly.

diesel::table! {
    /// Rows of every Record Store entity.
    ///
    /// `seq` preserves insertion order; `(entity, record_key)` is unique.
    records (seq) {
        seq -> Int8,
        entity -> Text,
        record_key -> Text,
        data -> Jsonb,
        created_at -> Timestamptz,
    }
}
