use aerodesk_core::{CoreError, CoreResult};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Maps driver errors onto the core taxonomy.
pub(crate) fn map_db_error(context: &str, err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => CoreError::conflict(format!("{}: already exists", context)),
            Some(FOREIGN_KEY_VIOLATION) => {
                CoreError::not_found(format!("{}: referenced record does not exist", context))
            }
            Some(CHECK_VIOLATION) => CoreError::validation(format!("{}: {}", context, db.message())),
            _ => internal(context, &err),
        },
        sqlx::Error::RowNotFound => CoreError::not_found(context.to_string()),
        _ => internal(context, &err),
    }
}

fn internal(context: &str, err: &sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "{} failed", context);
    CoreError::internal(format!("{} failed", context))
}

pub(crate) trait DbResultExt<T> {
    fn db_context(self, context: &str) -> CoreResult<T>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn db_context(self, context: &str) -> CoreResult<T> {
        self.map_err(|e| map_db_error(context, e))
    }
}
