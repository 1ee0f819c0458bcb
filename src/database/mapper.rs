//! Entity-to-SQL mapping.
//!
//! Each entity type carries a static [`EntitySchema`] describing its table and
//! the column every field maps to. The builders turn an entity value into a
//! parameterized [`Statement`]; values are always bound, identifiers always
//! quoted.
//!
//! ```text
//! impl_entity!(UserMark { id, created_at, updated_at, user_id, author_id, author_mark });
//!
//! build_insert(&mark)
//!   INSERT INTO "user_mark" ("user_id", "author_id", "author_mark")
//!   VALUES ($1, $2, $3) RETURNING "id"
//! ```

use tracing::debug;

use super::manager::DatabaseManager;
use super::value::SqlValue;

/// Store-managed fields. Never written by INSERT or UPDATE.
pub const EXCLUDED_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: &'static str,
    pub column: String,
    pub excluded: bool,
}

#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub type_name: &'static str,
    pub table: String,
    pub fields: Vec<FieldMapping>,
}

impl EntitySchema {
    /// `fields` lists `(field name, explicitly skipped)` in declaration order.
    pub fn new(type_name: &'static str, fields: &[(&'static str, bool)]) -> Self {
        let fields = fields
            .iter()
            .map(|&(field, skipped)| FieldMapping {
                field,
                column: to_snake_case(field),
                excluded: skipped || EXCLUDED_FIELDS.contains(&field),
            })
            .collect();

        Self {
            type_name,
            table: to_snake_case(type_name),
            fields,
        }
    }

    /// Writable fields paired with their position in `Entity::values()`.
    pub fn writable(&self) -> impl Iterator<Item = (usize, &FieldMapping)> {
        self.fields.iter().enumerate().filter(|(_, f)| !f.excluded)
    }

    pub fn quoted_table(&self) -> String {
        DatabaseManager::quote_identifier(&self.table)
    }
}

/// A persisted record type. Implemented through [`impl_entity!`](crate::impl_entity).
pub trait Entity {
    fn schema() -> &'static EntitySchema;

    /// Store-assigned identifier; zero until inserted.
    fn id(&self) -> i64;

    /// One value per schema field, in declaration order.
    fn values(&self) -> Vec<SqlValue>;
}

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Renders the statement with its parameters for log output.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!("{} -- [{}]", self.sql, params.join(", "))
    }
}

fn checked_values<E: Entity>(entity: &E) -> Vec<SqlValue> {
    let schema = E::schema();
    let values = entity.values();
    assert_eq!(
        values.len(),
        schema.fields.len(),
        "entity {} produced {} values for {} fields",
        schema.type_name,
        values.len(),
        schema.fields.len()
    );
    values
}

pub fn build_insert<E: Entity>(entity: &E) -> Statement {
    let schema = E::schema();
    let mut values = checked_values(entity).into_iter().map(Some).collect::<Vec<_>>();

    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();
    for (idx, field) in schema.writable() {
        columns.push(DatabaseManager::quote_identifier(&field.column));
        params.push(values[idx].take().unwrap_or(SqlValue::Text(None)));
        placeholders.push(format!("${}", params.len()));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING \"id\"", schema.quoted_table())
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING \"id\"",
            schema.quoted_table(),
            columns.join(", "),
            placeholders.join(", ")
        )
    };

    let stmt = Statement { sql, params };
    debug!("build_insert: {}", stmt.describe());
    stmt
}

/// A zero id is not rejected; the statement simply matches no row.
pub fn build_update<E: Entity>(entity: &E) -> Statement {
    let schema = E::schema();
    let mut values = checked_values(entity).into_iter().map(Some).collect::<Vec<_>>();

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (idx, field) in schema.writable() {
        params.push(values[idx].take().unwrap_or(SqlValue::Text(None)));
        assignments.push(format!(
            "{} = ${}",
            DatabaseManager::quote_identifier(&field.column),
            params.len()
        ));
    }
    if assignments.is_empty() {
        assignments.push("\"id\" = \"id\"".to_string());
    }

    params.push(SqlValue::Int(Some(entity.id())));
    let sql = format!(
        "UPDATE {} SET {} WHERE \"id\" = ${}",
        schema.quoted_table(),
        assignments.join(", "),
        params.len()
    );

    let stmt = Statement { sql, params };
    debug!("build_update: {}", stmt.describe());
    stmt
}

pub fn build_delete<E: Entity>(entity: &E) -> Statement {
    let schema = E::schema();
    let stmt = Statement::new(format!("DELETE FROM {} WHERE \"id\" = $1", schema.quoted_table()))
        .bind(entity.id());
    debug!("build_delete: {}", stmt.describe());
    stmt
}

/// CamelCase / PascalCase to snake_case. Input already in snake_case is unchanged.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // Acronym end: "QRCode" -> "qr_code"
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[doc(hidden)]
#[macro_export]
macro_rules! __entity_field_skipped {
    () => {
        false
    };
    (skip) => {
        true
    };
}

/// Derives [`Entity`] for a struct from its field list.
///
/// List every field in declaration order. Store-managed fields (`id`,
/// `created_at`, `updated_at`, `deleted_at`) are recognized by name; mark any
/// other field `#[skip]` to keep it out of generated statements.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ident { $( $(#[$attr:ident])? $field:ident ),* $(,)? }) => {
        impl $crate::database::mapper::Entity for $ty {
            fn schema() -> &'static $crate::database::mapper::EntitySchema {
                static SCHEMA: ::once_cell::sync::Lazy<$crate::database::mapper::EntitySchema> =
                    ::once_cell::sync::Lazy::new(|| {
                        $crate::database::mapper::EntitySchema::new(
                            stringify!($ty),
                            &[ $( (stringify!($field), $crate::__entity_field_skipped!($($attr)?)) ),* ],
                        )
                    });
                &SCHEMA
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn values(&self) -> Vec<$crate::database::value::SqlValue> {
                vec![ $( $crate::database::value::SqlValue::from(self.$field.clone()) ),* ]
            }
        }
    };
}
