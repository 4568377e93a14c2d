//! sessions.rs
//!
//! Реестр открытых сеансов редактора. У каждого сеанса один владелец - запись
//! в реестре; обработчики берут её под мьютексом и выполняют операцию целиком.
//!
//! Отправка раскладки в бэкенд идёт вне блокировки, поэтому на это время сеанс
//! помечается как отправляемый: правки и повторная отправка отклоняются, пока
//! бэкенд не ответит. Брошенные сеансы удаляются фоновой очисткой по простою.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::layout::{GenerationOutcome, SeatLayoutEditor};
use crate::models::VenueDraft;

#[derive(Debug, Clone)]
pub struct EditorSession {
    pub id: Uuid,
    pub draft: VenueDraft,
    pub editor: SeatLayoutEditor,
    pub last_generation: GenerationOutcome,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
    pub submitting: bool,
}

impl EditorSession {
    fn new(draft: VenueDraft, cell_size: u32) -> Self {
        let mut editor = SeatLayoutEditor::new(cell_size);
        let last_generation = editor.generate(draft.seat_count, draft.width, draft.height);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            draft,
            editor,
            last_generation,
            created_at: now,
            touched_at: now,
            submitting: false,
        }
    }

    /// Перегенерировать раскладку по новой форме.
    pub fn regenerate(&mut self, draft: VenueDraft) -> GenerationOutcome {
        self.last_generation = self.editor.generate(draft.seat_count, draft.width, draft.height);
        self.draft = draft;
        self.last_generation
    }

    /// Сброс формы: пустая форма, пустая раскладка.
    pub fn reset(&mut self) {
        self.draft = VenueDraft::default();
        self.editor.reset();
        self.last_generation = GenerationOutcome { requested: 0, placed: 0 };
    }

    fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.submitting
            && now
                .signed_duration_since(self.touched_at)
                .to_std()
                .map_or(false, |idle| idle >= ttl)
    }
}

#[derive(Clone)]
pub struct EditorSessions {
    cell_size: u32,
    sessions: Arc<Mutex<HashMap<Uuid, EditorSession>>>,
}

impl EditorSessions {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn open(&self, draft: VenueDraft) -> EditorSession {
        let session = EditorSession::new(draft, self.cell_size);
        info!(
            "Editor session {} opened: {} of {} seats placed",
            session.id, session.last_generation.placed, session.last_generation.requested
        );
        self.sessions.lock().await.insert(session.id, session.clone());
        session
    }

    /// Выполняет `f` над сеансом под блокировкой реестра. Отправляемый сеанс
    /// не меняется.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut EditorSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        if session.submitting {
            return Err(AppError::SessionBusy(id));
        }
        session.touched_at = Utc::now();
        f(session)
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<EditorSession, AppError> {
        let sessions = self.sessions.lock().await;
        sessions.get(&id).cloned().ok_or(AppError::SessionNotFound(id))
    }

    /// Помечает сеанс как отправляемый и отдаёт его копию для отправки.
    pub async fn begin_submit(&self, id: Uuid) -> Result<EditorSession, AppError> {
        self.with_session(id, |session| {
            session.submitting = true;
            Ok(session.clone())
        })
        .await
    }

    /// Успешная отправка закрывает сеанс, неудачная возвращает его к правке.
    pub async fn finish_submit(&self, id: Uuid, submitted: bool) {
        let mut sessions = self.sessions.lock().await;
        if submitted {
            sessions.remove(&id);
            info!("Editor session {} submitted and closed", id);
        } else if let Some(session) = sessions.get_mut(&id) {
            session.submitting = false;
            session.touched_at = Utc::now();
        }
    }

    pub async fn close(&self, id: Uuid) -> Result<EditorSession, AppError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&id) {
            None => return Err(AppError::SessionNotFound(id)),
            Some(session) if session.submitting => return Err(AppError::SessionBusy(id)),
            Some(_) => {}
        }
        let session = sessions.remove(&id).ok_or(AppError::SessionNotFound(id))?;
        info!("Editor session {} closed", id);
        Ok(session)
    }

    /// Удаляет сеансы, простоявшие дольше `ttl`. Отправляемые не трогает.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Swept {} idle editor sessions, {} left", removed, sessions.len());
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
