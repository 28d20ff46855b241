use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// A document body, stored as TEXT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct JsonValue(pub serde_json::Value);

impl FromSql<Text, Sqlite> for JsonValue {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value = serde_json::from_str(&text)?;
        Ok(JsonValue(value))
    }
}

impl ToSql<Text, Sqlite> for JsonValue {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_pool;
    use diesel::prelude::*;
    use diesel::sql_query;
    use serde_json::json;

    #[derive(QueryableByName)]
    struct BodyRow {
        #[diesel(sql_type = Text)]
        body: JsonValue,
    }

    #[test]
    fn test_body_survives_text_column() {
        let pool = init_pool(":memory:").unwrap();
        let mut conn = pool.get().unwrap();
        let body = JsonValue(json!({ "title": "Essay", "tags": ["history", 2], "done": false }));

        let row: BodyRow = sql_query("SELECT ? AS body")
            .bind::<Text, _>(&body)
            .get_result(&mut conn)
            .unwrap();

        assert_eq!(row.body, body);
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        let pool = init_pool(":memory:").unwrap();
        let mut conn = pool.get().unwrap();

        let row = sql_query("SELECT 'not json' AS body").get_result::<BodyRow>(&mut conn);

        assert!(row.is_err());
    }
}
