//! WebSocket message dispatch

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::player::{self, PlayerContext};

/// Handle a client message and return the optional response.
///
/// Progress notifications that must reach the client before the response
/// (such as `session_loading`) are pushed to `out` directly.
pub async fn handle_message(
    msg: ClientMessage,
    ctx: &mut PlayerContext,
    state: &Arc<AppState>,
    out: &UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::StartSession { theme } => {
            tracing::info!("Session requested: theme={:?}, uid={:?}", theme, ctx.uid);
            player::handle_start_session(state, ctx, theme, out).await
        }

        ClientMessage::SubmitAnswer {
            question_index,
            option,
        } => player::handle_submit_answer(state, ctx, question_index, option),

        ClientMessage::Abandon => player::handle_abandon(ctx),
    }
}
