//! Query autocomplete.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/suggestions?query=
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionsQuery>,
) -> Json<Vec<String>> {
    let examples = state.registry.read().await.examples();
    Json(wn_nlp::suggestions::suggest(&params.query, &examples))
}
