use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// BERT's position embedding table is 512 long; two slots go to `[CLS]` and
/// `[SEP]`.
const WINDOW_TOKENS: usize = 510;
/// Tokens shared by neighbouring windows so every token is tagged with some
/// context on both sides.
const WINDOW_OVERLAP: usize = 128;

const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PICKLE_FILE: &str = "pytorch_model.bin";

/// One model token with its predicted tag, byte span in the input, and the
/// index of the word it was split from.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedToken {
    pub tag: String,
    pub start: usize,
    pub end: usize,
    pub word: Option<u32>,
}

/// A slice `start..end` of the token sequence fed to the encoder at once.
/// Predictions are kept only for `keep_start..keep_end`; the kept ranges of
/// all windows partition the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindow {
    pub start: usize,
    pub end: usize,
    pub keep_start: usize,
    pub keep_end: usize,
}

/// Splits `len` tokens into windows of at most `size` tokens overlapping by
/// `overlap`.
pub fn token_windows(len: usize, size: usize, overlap: usize) -> Vec<TokenWindow> {
    if len == 0 {
        return Vec::new();
    }
    if len <= size {
        return vec![TokenWindow {
            start: 0,
            end: len,
            keep_start: 0,
            keep_end: len,
        }];
    }

    let overlap = overlap.min(size.saturating_sub(1));
    let step = size - overlap;
    let mut windows = Vec::new();
    let mut start = 0;
    let mut keep_start = 0;

    loop {
        let end = (start + size).min(len);
        if end == len {
            windows.push(TokenWindow {
                start,
                end,
                keep_start,
                keep_end: len,
            });
            break;
        }
        let keep_end = start + step + overlap / 2;
        windows.push(TokenWindow {
            start,
            end,
            keep_start,
            keep_end,
        });
        start += step;
        keep_start = keep_end;
    }

    windows
}

#[derive(Deserialize)]
struct LabelConfig {
    id2label: HashMap<String, String>,
}

/// A BERT encoder with a linear token-classification head, as published for
/// CoNLL-style NER checkpoints.
pub struct BertTokenClassifier {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    cls_id: u32,
    sep_id: u32,
    device: Device,
}

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            info!("NER device: Metal");
            return dev;
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) {
            info!("NER device: CUDA");
            return dev;
        }
    }
    info!("NER device: CPU");
    Device::Cpu
}

impl BertTokenClassifier {
    pub fn files_present(model_dir: &Path) -> bool {
        model_dir.join(TOKENIZER_FILE).exists()
            && model_dir.join(CONFIG_FILE).exists()
            && (model_dir.join(SAFETENSORS_FILE).exists() || model_dir.join(PICKLE_FILE).exists())
    }

    pub fn load(model_dir: &Path) -> Result<Self> {
        let start = Instant::now();
        let device = select_device();

        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
        })?;
        // long inputs are windowed in `tag`, never cut
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow!("Failed to disable truncation: {}", e))?;
        tokenizer.with_padding(None);
        let cls_id = tokenizer
            .token_to_id("[CLS]")
            .ok_or_else(|| anyhow!("Tokenizer has no [CLS] token"))?;
        let sep_id = tokenizer
            .token_to_id("[SEP]")
            .ok_or_else(|| anyhow!("Tokenizer has no [SEP] token"))?;

        let config_path = model_dir.join(CONFIG_FILE);
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)
            .with_context(|| format!("{} is not a BERT config", config_path.display()))?;
        let labels = ordered_labels(&raw_config)?;

        let tensors = read_weights(model_dir, &device)?;
        let has_bert_prefix = tensors.keys().any(|k| k.starts_with("bert."));
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);

        let encoder_vb = if has_bert_prefix { vb.pp("bert") } else { vb.clone() };
        let model = BertModel::load(encoder_vb, &config).context("Failed to build BERT encoder")?;
        let classifier = candle_nn::linear(config.hidden_size, labels.len(), vb.pp("classifier"))
            .context("Failed to build classification head")?;

        info!(
            labels = labels.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "NER model loaded"
        );

        Ok(Self {
            model,
            classifier,
            tokenizer,
            labels,
            cls_id,
            sep_id,
            device,
        })
    }

    /// Tags every token of `text`. Inputs longer than the encoder window are
    /// run as overlapping windows and stitched back together.
    pub fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let windows = token_windows(ids.len(), WINDOW_TOKENS, WINDOW_OVERLAP);
        if windows.len() > 1 {
            debug!(tokens = ids.len(), windows = windows.len(), "Tagging text in windows");
        }

        let mut predictions = vec![0u32; ids.len()];
        for window in &windows {
            let labels = self.classify(&ids[window.start..window.end])?;
            for index in window.keep_start..window.keep_end {
                predictions[index] = labels[index - window.start];
            }
        }

        let tagged = predictions
            .into_iter()
            .zip(encoding.get_offsets())
            .zip(encoding.get_word_ids())
            .filter(|((_, (start, end)), _)| end > start)
            .map(|((label, &(start, end)), &word)| TaggedToken {
                tag: self
                    .labels
                    .get(label as usize)
                    .cloned()
                    .unwrap_or_else(|| "O".to_string()),
                start,
                end,
                word,
            })
            .collect();

        Ok(tagged)
    }

    /// Class ids for one window of at most [`WINDOW_TOKENS`] ids, without the
    /// `[CLS]`/`[SEP]` positions.
    fn classify(&self, window: &[u32]) -> Result<Vec<u32>> {
        let mut input = Vec::with_capacity(window.len() + 2);
        input.push(self.cls_id);
        input.extend_from_slice(window);
        input.push(self.sep_id);

        let input_ids = Tensor::new(input.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, None)?;
        let logits = self.classifier.forward(&hidden)?;
        let labels: Vec<u32> = logits.squeeze(0)?.argmax(D::Minus1)?.to_vec1()?;

        Ok(labels[1..=window.len()].to_vec())
    }
}

fn read_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join(SAFETENSORS_FILE);
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device)
            .with_context(|| format!("Failed to read {}", safetensors.display()));
    }

    let pickle = model_dir.join(PICKLE_FILE);
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)
            .with_context(|| format!("Failed to read {}", pickle.display()))?;
        return Ok(weights.into_iter().collect());
    }

    bail!(
        "No model weights in {} (expected {} or {})",
        model_dir.display(),
        SAFETENSORS_FILE,
        PICKLE_FILE
    )
}

/// `id2label` as a vector indexed by class id.
fn ordered_labels(raw_config: &str) -> Result<Vec<String>> {
    let config: LabelConfig =
        serde_json::from_str(raw_config).context("config.json has no id2label table")?;

    let mut indexed = config
        .id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|id| (id, label))
                .map_err(|_| anyhow!("Non-numeric label id {:?}", id))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(id, _)| *id);

    for (position, (id, _)) in indexed.iter().enumerate() {
        if position != *id {
            bail!("id2label is not contiguous: missing id {}", position);
        }
    }
    if indexed.is_empty() {
        bail!("id2label is empty");
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_ordered_by_id() {
        let raw = r#"{"id2label": {"2": "I-PER", "0": "O", "1": "B-PER"}}"#;
        assert_eq!(ordered_labels(raw).unwrap(), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn gaps_in_label_ids_are_rejected() {
        let raw = r#"{"id2label": {"0": "O", "2": "B-PER"}}"#;
        assert!(ordered_labels(raw).is_err());
    }

    #[test]
    fn short_inputs_fit_one_window() {
        assert_eq!(
            token_windows(12, WINDOW_TOKENS, WINDOW_OVERLAP),
            vec![TokenWindow { start: 0, end: 12, keep_start: 0, keep_end: 12 }]
        );
        assert!(token_windows(0, WINDOW_TOKENS, WINDOW_OVERLAP).is_empty());
    }

    #[test]
    fn long_inputs_are_windowed_not_truncated() {
        let len = 1200;
        let windows = token_windows(len, WINDOW_TOKENS, WINDOW_OVERLAP);
        assert!(windows.len() > 1);

        let mut next = 0;
        for window in &windows {
            assert!(window.end - window.start <= WINDOW_TOKENS);
            assert!(window.start <= window.keep_start && window.keep_end <= window.end);
            assert_eq!(window.keep_start, next);
            next = window.keep_end;
        }
        assert_eq!(next, len);

        // a mention at the very end still lands in a window
        let last = windows.last().unwrap();
        assert!(last.keep_start <= len - 1 && len - 1 < last.keep_end);
    }

    #[test]
    fn windows_keep_context_on_both_sides() {
        let windows = token_windows(1000, 510, 128);
        let inner = &windows[1];
        assert!(inner.keep_start - inner.start >= 64);
        assert!(inner.end - inner.keep_end >= 64 || inner.end == 1000);
    }

    #[test]
    fn incomplete_model_dir_is_not_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        assert!(!BertTokenClassifier::files_present(dir.path()));
    }
}
