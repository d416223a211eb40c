//! Shared session state
//!
//! One [`SessionState`] record holds everything the pipeline mutates: the
//! debouncer, the pending product, the basket and the text buffers. It sits
//! behind a single mutex in [`SharedSession`]; the frame loop holds the lock
//! for a whole frame, and request handlers use the accessors below.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::debouncer::StabilizationDebouncer;
use crate::speech::SpeechDispatcher;
use crate::types::{BasketItem, SessionSnapshot};

/// Mutable per-session record
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) session_id: Uuid,
    pub(crate) debouncer: StabilizationDebouncer,
    pub(crate) pending_product: Option<String>,
    pub(crate) basket: Vec<String>,
    pub(crate) word_buffer: String,
    pub(crate) sentence: String,
    pub(crate) paused: bool,
}

impl SessionState {
    pub fn new(debouncer: StabilizationDebouncer) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            debouncer,
            pending_product: None,
            basket: Vec::new(),
            word_buffer: String::new(),
            sentence: String::new(),
            paused: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn debouncer(&self) -> &StabilizationDebouncer {
        &self.debouncer
    }

    pub fn pending_product(&self) -> Option<&str> {
        self.pending_product.as_deref()
    }

    /// Product names in the order they were added
    pub fn basket(&self) -> &[String] {
        &self.basket
    }

    pub fn word_buffer(&self) -> &str {
        &self.word_buffer
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Clear text, basket, selection and debounce state
    fn reset(&mut self, now: DateTime<Utc>) {
        self.word_buffer.clear();
        self.sentence.clear();
        self.basket.clear();
        self.pending_product = None;
        self.debouncer.reset(now);
    }
}

/// Cloneable handle to the session, safe to share with request handlers
#[derive(Debug, Clone)]
pub struct SharedSession {
    state: Arc<Mutex<SessionState>>,
    catalog: Arc<ProductCatalog>,
    speech: SpeechDispatcher,
}

impl SharedSession {
    pub fn new(state: SessionState, catalog: Arc<ProductCatalog>, speech: SpeechDispatcher) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            catalog,
            speech,
        }
    }

    /// Lock the record. A panic while holding the lock cannot leave a field
    /// half-written, so a poisoned lock is taken over as is.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn speech(&self) -> &SpeechDispatcher {
        &self.speech
    }

    pub fn get_pending_product(&self) -> Option<String> {
        self.lock().pending_product.clone()
    }

    /// Basket entries resolved against the catalog
    pub fn get_basket(&self) -> Vec<BasketItem> {
        let state = self.lock();
        state
            .basket
            .iter()
            .map(|name| self.catalog.resolve(name))
            .collect()
    }

    pub fn clear_basket(&self) {
        let mut state = self.lock();
        state.basket.clear();
        info!(session_id = %state.session_id, "basket cleared");
    }

    /// Clear text, basket, selection and debounce state
    pub fn reset(&self) {
        self.reset_at(Utc::now());
    }

    /// [`reset`](Self::reset) with an explicit clock, restarting the commit
    /// cooldown from `now`
    pub fn reset_at(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.reset(now);
        info!(session_id = %state.session_id, "session reset");
    }

    /// Flip the pause flag and return the new value
    pub fn toggle_pause(&self) -> bool {
        let mut state = self.lock();
        state.paused = !state.paused;
        info!(session_id = %state.session_id, paused = state.paused, "pause toggled");
        state.paused
    }

    /// Speak the accumulated sentence without waiting for playback.
    ///
    /// Returns `None` when there is nothing to say.
    pub fn speak_sentence(&self) -> Option<Uuid> {
        let sentence = self.lock().sentence.clone();
        if sentence.trim().is_empty() {
            return None;
        }
        Some(self.speech.speak(&sentence))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            session_id: state.session_id,
            pending_product: state.pending_product.clone(),
            basket: state
                .basket
                .iter()
                .map(|name| self.catalog.resolve(name))
                .collect(),
            word_buffer: state.word_buffer.clone(),
            sentence: state.sentence.clone(),
            last_committed: state.debouncer.last_committed().map(str::to_string),
            paused: state.paused,
            taken_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session_with(basket: &[&str], pending: Option<&str>) -> SharedSession {
        let mut state = SessionState::new(StabilizationDebouncer::with_defaults(Utc::now()));
        state.basket = basket.iter().map(|s| s.to_string()).collect();
        state.pending_product = pending.map(str::to_string);
        state.word_buffer = "he".to_string();
        state.sentence = "hi ".to_string();
        SharedSession::new(
            state,
            Arc::new(ProductCatalog::default()),
            SpeechDispatcher::default(),
        )
    }

    #[test]
    fn test_get_basket_resolves_catalog() {
        let session = session_with(&["Milk", "Mystery"], None);
        let basket = session.get_basket();

        assert_eq!(
            basket,
            vec![
                BasketItem {
                    name: "Milk".to_string(),
                    image: "Milk.jpeg".to_string(),
                    price: 1.5,
                },
                BasketItem {
                    name: "Mystery".to_string(),
                    image: String::new(),
                    price: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_clear_basket_keeps_selection() {
        let session = session_with(&["Milk", "Bread"], Some("Apple"));
        session.clear_basket();
        assert!(session.get_basket().is_empty());
        assert_eq!(session.get_pending_product(), Some("Apple".to_string()));
    }

    #[test]
    fn test_reset_clears_everything() {
        let session = session_with(&["Milk"], Some("Apple"));
        session.reset();

        assert!(session.get_basket().is_empty());
        assert_eq!(session.get_pending_product(), None);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.word_buffer, "");
        assert_eq!(snapshot.sentence, "");
        assert_eq!(snapshot.last_committed, None);
        assert_eq!(session.lock().debouncer().window_len(), 0);
    }

    #[test]
    fn test_toggle_pause() {
        let session = session_with(&[], None);
        assert!(session.toggle_pause());
        assert!(session.lock().is_paused());
        assert!(!session.toggle_pause());
    }

    #[test]
    fn test_speak_sentence_skips_blank() {
        let session = session_with(&[], None);
        assert!(session.speak_sentence().is_some());

        session.reset();
        assert!(session.speak_sentence().is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = session_with(&["Apple"], Some("Banana"));
        let value = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(value["pending_product"], "Banana");
        assert_eq!(value["basket"][0]["image"], "apple.jpeg");
        assert_eq!(value["paused"], false);
    }
}
