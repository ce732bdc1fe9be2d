//! SQL functions registered on every dataset connection.

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::numeric::NumericStyle;
use crate::store::Value;
use crate::text::fold;

/// Name of the accent/case folding function.
pub const UNACCENT_LOWER: &str = "unaccent_lower";

/// Name of the locale number parsing function.
pub const LOCALE_NUMBER: &str = "locale_number";

/// Registers `unaccent_lower(x)` and `locale_number(x, style)` on `conn`.
///
/// - `unaccent_lower` folds case and strips diacritics; NULL becomes `''`.
/// - `locale_number` parses text under the style tagged `'euro'` or `'dot'`,
///   passes integers and reals through, and yields NULL for anything else.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(UNACCENT_LOWER, 1, flags, |ctx| {
        Ok(fold(&Value::from(ctx.get_raw(0)).as_text()))
    })?;

    conn.create_scalar_function(LOCALE_NUMBER, 2, flags, |ctx| {
        let style = match ctx.get_raw(1) {
            ValueRef::Text(tag) => NumericStyle::from_sql_tag(&String::from_utf8_lossy(tag)),
            _ => NumericStyle::None,
        };
        let parsed = match ctx.get_raw(0) {
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(r) => Some(r),
            ValueRef::Text(t) => style.parse(&String::from_utf8_lossy(t)),
            ValueRef::Null | ValueRef::Blob(_) => None,
        };
        Ok(parsed)
    })?;

    Ok(())
}
