//! Player message handlers
//!
//! Every connection owns at most one session. Handlers run one at a time on
//! the connection's task, so submissions for a session are never processed
//! concurrently.

use crate::protocol::{QuestionView, ServerMessage};
use crate::session::Session;
use crate::state::AppState;
use crate::types::{Theme, UserId};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Per-connection player state
#[derive(Debug, Default)]
pub struct PlayerContext {
    /// Profile the connection plays for; anonymous sessions are not scored
    pub uid: Option<UserId>,
    pub session: Option<Session>,
}

impl PlayerContext {
    pub fn new(uid: Option<UserId>) -> Self {
        Self { uid, session: None }
    }
}

pub async fn handle_start_session(
    state: &Arc<AppState>,
    ctx: &mut PlayerContext,
    theme: Theme,
    out: &UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    if let Some(previous) = ctx.session.take() {
        if !previous.state().is_terminal() {
            tracing::info!("Session {} replaced before finishing, not scored", previous.id);
        }
    }

    // Ignore send errors (connection already gone is fine)
    let _ = out.send(ServerMessage::SessionLoading { theme });

    match state.quiz.start_session(theme, ctx.uid.clone()).await {
        Ok(session) => {
            let total = session.total_questions();
            let question = session
                .current_question()
                .map(|q| QuestionView::new(q, 0, total))?;
            let started = ServerMessage::SessionStarted {
                session_id: session.id.clone(),
                theme,
                total_questions: total,
                question,
            };
            ctx.session = Some(session);
            Some(started)
        }
        Err(failed) => Some(ServerMessage::SourcingFailed {
            theme: failed.theme,
            sources: failed.report,
        }),
    }
}

pub fn handle_submit_answer(
    state: &Arc<AppState>,
    ctx: &mut PlayerContext,
    question_index: usize,
    option: String,
) -> Option<ServerMessage> {
    let Some(session) = ctx.session.as_mut() else {
        return Some(ServerMessage::error("NO_SESSION", "Start a session first"));
    };

    let outcome = state.quiz.submit_answer(session, question_index, &option);
    Some(ServerMessage::answer_result(
        outcome,
        session.current_index(),
        session.total_questions(),
    ))
}

pub fn handle_abandon(ctx: &mut PlayerContext) -> Option<ServerMessage> {
    let session = ctx.session.take()?;
    tracing::info!(
        "Session {} abandoned at question {} ({:?})",
        session.id,
        session.current_index(),
        session.state()
    );
    Some(ServerMessage::SessionAbandoned {
        session_id: session.id,
    })
}
