//! Symbol interpretation
//!
//! Routes each committed symbol to exactly one effect on the session:
//! - product names select a pending product
//! - "Add" / "Remove" confirm the selection or pop the basket
//! - " " / "." flush the word buffer into the sentence and speak it
//! - anything else is appended to the word buffer
//!
//! Every guard is a no-op; interpretation never fails.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::ProductCatalog;
use crate::session::SessionState;
use crate::speech::SpeechDispatcher;
use crate::types::{Interpretation, ADD_SYMBOL, PERIOD_SYMBOL, REMOVE_SYMBOL, SPACE_SYMBOL};

/// Basket and text state machine driven by committed symbols
#[derive(Debug, Clone)]
pub struct SymbolInterpreter {
    catalog: Arc<ProductCatalog>,
    speech: SpeechDispatcher,
}

impl SymbolInterpreter {
    pub fn new(catalog: Arc<ProductCatalog>, speech: SpeechDispatcher) -> Self {
        Self { catalog, speech }
    }

    /// Apply one committed symbol to the session
    pub fn interpret(&self, state: &mut SessionState, symbol: &str) -> Interpretation {
        let effect = match symbol {
            s if self.catalog.contains(s) => {
                state.pending_product = Some(s.to_string());
                Interpretation::ProductSelected {
                    product: s.to_string(),
                }
            }
            ADD_SYMBOL => match state.pending_product.take() {
                Some(product) => {
                    state.basket.push(product.clone());
                    Interpretation::ProductAdded { product }
                }
                None => Interpretation::NothingPending,
            },
            REMOVE_SYMBOL => match state.basket.pop() {
                Some(product) => Interpretation::ProductRemoved { product },
                None => Interpretation::BasketEmpty,
            },
            SPACE_SYMBOL => self.flush_word(state, " "),
            PERIOD_SYMBOL => self.flush_word(state, "."),
            other => {
                state.word_buffer.push_str(other);
                Interpretation::CharacterAppended {
                    character: other.to_string(),
                }
            }
        };

        match &effect {
            Interpretation::CharacterAppended { .. } | Interpretation::BlankWord => {
                debug!(symbol, ?effect, "symbol interpreted");
            }
            _ => info!(symbol, ?effect, "symbol interpreted"),
        }

        effect
    }

    /// Move a non-blank word into the sentence and speak it; the buffer is
    /// emptied either way.
    fn flush_word(&self, state: &mut SessionState, terminator: &str) -> Interpretation {
        let word = std::mem::take(&mut state.word_buffer);
        if word.trim().is_empty() {
            return Interpretation::BlankWord;
        }

        self.speech.speak(&word);
        state.sentence.push_str(&word);
        state.sentence.push_str(terminator);

        Interpretation::WordFlushed {
            word,
            terminator: terminator.to_string(),
        }
    }
}
