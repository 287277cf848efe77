use diesel_async::{AsyncPgConnection, pooled_connection::bb8::Pool};

pub type DieselError = diesel::result::Error;
pub type DbPool = Pool<AsyncPgConnection>;
