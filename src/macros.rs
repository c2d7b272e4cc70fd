#[macro_export]
/// Builds an `INSERT` statement together with its bound arguments.
///
/// Must be expanded inside a function returning a `Result` whose error type
/// implements `From<sqlx::Error>`.
///
/// ## Example
/// ```rust,ignore
/// let (sql, args) = build_insert_sql!(
///     "devices",
///     [
///         ("mac", "AA:BB:CC:DD:EE:FF"),
///         ("name", "kitchen-sensor")
///     ]
/// );
/// ```
macro_rules! build_insert_sql {
    ($table: expr, [$(($field: expr, $value: expr)), *]) => {
        {
            use sqlx::Arguments;
            let fields: &[&str] = &[$($field),*];
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                $table,
                fields.join(", "),
                vec!["?"; fields.len()].join(", ")
            );
            let mut args = sqlx::sqlite::SqliteArguments::default();
            $(args.add($value).map_err(sqlx::Error::Encode)?;)*
            (sql, args)
        }
    };
}
