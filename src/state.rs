use axum::extract::FromRef;

use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for OrmConn {
    fn from_ref(state: &AppState) -> Self {
        state.orm.clone()
    }
}
