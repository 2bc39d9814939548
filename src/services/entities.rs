use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, AppResult};
use crate::models::Entity;
use crate::services::ner_model::{BertTokenClassifier, TaggedToken};

/// Texts are fed to the model a few sentences at a time. A piece that tokenizes
/// past the encoder window is windowed by the model itself.
const MAX_CHUNK_BYTES: usize = 1200;

/// Finds named entity mentions in text.
pub trait EntityRecognizer: Send + Sync {
    /// All mentions in document order.
    fn recognize(&self, text: &str) -> AppResult<Vec<Entity>>;

    /// Whether the recognizer can run without failing on missing resources.
    fn is_ready(&self) -> bool;
}

/// Empty or whitespace-only text never reaches the recognizer.
pub fn extract_entities(recognizer: &dyn EntityRecognizer, text: &str) -> AppResult<Vec<Entity>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entities: Vec<Entity> = recognizer
        .recognize(text)?
        .into_iter()
        .filter_map(|entity| {
            let mention = clean_mention(&entity.text);
            (!mention.is_empty()).then(|| Entity::new(mention, entity.label))
        })
        .collect();
    debug!(count = entities.len(), "Entities extracted");
    Ok(entities)
}

/// A mention spanning a line or column break reads as one line with single
/// spaces.
pub fn clean_mention(mention: &str) -> String {
    mention.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// BERT token classifier read from a local model directory on first use and
/// kept for the life of the process.
pub struct ModelEntityRecognizer {
    model_dir: PathBuf,
    model: OnceCell<BertTokenClassifier>,
}

impl ModelEntityRecognizer {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            model: OnceCell::new(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn model(&self) -> AppResult<&BertTokenClassifier> {
        self.model.get_or_try_init(|| {
            info!(model_dir = %self.model_dir.display(), "Loading NER model");
            BertTokenClassifier::load(&self.model_dir)
                .map_err(|e| AppError::model(format!("{:#}", e)))
        })
    }
}

impl EntityRecognizer for ModelEntityRecognizer {
    fn recognize(&self, text: &str) -> AppResult<Vec<Entity>> {
        let model = self.model()?;
        let mut entities = Vec::new();

        for (offset, chunk) in sentence_chunks(text, MAX_CHUNK_BYTES) {
            let tokens = model
                .tag(chunk)
                .map_err(|e| AppError::model(format!("Inference failed: {:#}", e)))?;
            for (start, end, kind) in decode_bio(&tokens) {
                let Some(mention) = chunk.get(start..end) else {
                    continue;
                };
                let mention = mention.trim();
                if mention.is_empty() {
                    continue;
                }
                debug!(offset = offset + start, label = %kind, "Entity span decoded");
                entities.push(Entity::new(mention, normalize_label(&kind)));
            }
        }

        Ok(entities)
    }

    fn is_ready(&self) -> bool {
        self.is_loaded() || BertTokenClassifier::files_present(&self.model_dir)
    }
}

/// Groups consecutive sentences into pieces of at most `max_bytes` (a single
/// longer sentence becomes its own piece). Yields each piece with its byte
/// offset in `text`.
pub fn sentence_chunks(text: &str, max_bytes: usize) -> Vec<(usize, &str)> {
    let mut chunks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;

    for (index, sentence) in text.split_sentence_bound_indices() {
        let chunk_start = *start.get_or_insert(index);
        let sentence_end = index + sentence.len();
        if sentence_end - chunk_start > max_bytes && end > chunk_start {
            chunks.push((chunk_start, &text[chunk_start..end]));
            start = Some(index);
        }
        end = sentence_end;
    }
    if let Some(chunk_start) = start {
        if end > chunk_start {
            chunks.push((chunk_start, &text[chunk_start..end]));
        }
    }

    chunks
        .into_iter()
        .filter(|(_, chunk)| !chunk.trim().is_empty())
        .collect()
}

/// Folds per-token BIO tags into `(start, end, type)` spans.
///
/// A word piece that continues the previous token's word always joins the
/// open entity, whatever its own tag says, so entities never split inside a
/// word.
pub(crate) fn decode_bio(tokens: &[TaggedToken]) -> Vec<(usize, usize, String)> {
    let mut spans: Vec<(usize, usize, String)> = Vec::new();
    let mut open: Option<(usize, usize, String)> = None;
    let mut previous_word: Option<u32> = None;

    for token in tokens {
        let continues_word = token.word.is_some() && token.word == previous_word;
        previous_word = token.word;

        if continues_word {
            if let Some(entity) = open.as_mut() {
                entity.1 = token.end;
                continue;
            }
        }

        match split_tag(&token.tag) {
            None => {
                if let Some(entity) = open.take() {
                    spans.push(entity);
                }
            }
            Some(('I', kind)) if open.as_ref().is_some_and(|e| e.2 == kind) => {
                if let Some(entity) = open.as_mut() {
                    entity.1 = token.end;
                }
            }
            Some((_, kind)) => {
                if let Some(entity) = open.take() {
                    spans.push(entity);
                }
                open = Some((token.start, token.end, kind.to_string()));
            }
        }
    }
    if let Some(entity) = open {
        spans.push(entity);
    }

    spans
}

/// `"B-ORG"` -> `('B', "ORG")`; `"O"` -> `None`. Untagged labels count as `B`.
fn split_tag(tag: &str) -> Option<(char, &str)> {
    if tag == "O" || tag.is_empty() {
        return None;
    }
    match tag.split_once('-') {
        Some((prefix, kind)) if prefix.len() == 1 => prefix.chars().next().map(|p| (p, kind)),
        _ => Some(('B', tag)),
    }
}

/// CoNLL label names mapped onto the `PERSON`/`ORG`/`GPE` vocabulary; anything
/// else passes through.
pub fn normalize_label(kind: &str) -> String {
    match kind {
        "PER" => "PERSON".to_string(),
        "LOC" => "GPE".to_string(),
        other => other.to_string(),
    }
}
