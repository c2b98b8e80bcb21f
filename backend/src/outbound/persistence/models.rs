//! Internal Diesel row structs. Never exposed to the domain.

use diesel::prelude::*;
use serde_json::Value;

use super::schema::records;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecordRow {
    pub seq: i64,
    pub data: Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = records)]
pub(crate) struct NewRecordRow<'a> {
    pub entity: &'a str,
    pub record_key: &'a str,
    pub data: Value,
}
