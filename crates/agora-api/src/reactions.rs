use agora_types::api::{ToggleReactionRequest, ToggleReactionResponse};
use axum::{Extension, Form, Json, extract::State, response::IntoResponse};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;

/// POST /reactions: form fields `type` (post|comment), `id`, `action` (like|dislike).
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(req): Form<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reactions = state.forum.reactions.clone();
    let (state, counts) = blocking(move || reactions.toggle_request(user.as_ref(), &req)).await?;

    Ok(Json(ToggleReactionResponse {
        state,
        likes: counts.likes,
        dislikes: counts.dislikes,
    }))
}
