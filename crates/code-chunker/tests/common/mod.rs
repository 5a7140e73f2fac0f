#![allow(dead_code)]

use semchunk_embeddings::{EmbeddingError, EmbeddingModel, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Whitespace-separated words as tokens
fn words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Every distinct text gets its own axis, so no two chunks are ever similar.
pub struct OneHotModel {
    pub max: usize,
    axes: Mutex<HashMap<String, usize>>,
}

impl OneHotModel {
    pub const DIMENSION: usize = 256;

    pub fn new(max: usize) -> Self {
        Self {
            max,
            axes: Mutex::new(HashMap::new()),
        }
    }
}

impl EmbeddingModel for OneHotModel {
    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(words(text))
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut axes = self.axes.lock().unwrap();
        let next = axes.len();
        let axis = *axes.entry(text.to_string()).or_insert(next);
        let mut vector = vec![0.0; Self::DIMENSION];
        vector[axis % Self::DIMENSION] = 1.0;
        Ok(vector)
    }

    fn max_sequence_length(&self) -> usize {
        self.max
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }
}

/// Word tokens, vectors chosen by a caller-supplied rule
pub struct ScriptedModel {
    pub max: usize,
    rule: Box<dyn Fn(&str) -> Vec<f32> + Send + Sync>,
}

impl ScriptedModel {
    pub fn new(max: usize, rule: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static) -> Self {
        Self {
            max,
            rule: Box::new(rule),
        }
    }

    /// Every text encodes to the same vector
    pub fn uniform(max: usize) -> Self {
        Self::new(max, |_| vec![1.0, 0.0])
    }
}

impl EmbeddingModel for ScriptedModel {
    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(words(text))
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok((self.rule)(text))
    }

    fn max_sequence_length(&self) -> usize {
        self.max
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Fails to encode any text containing `poison`
pub struct FailingModel;

impl EmbeddingModel for FailingModel {
    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(words(text))
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("poison") {
            Err(EmbeddingError::EmbeddingGeneration("poisoned input".to_string()))
        } else {
            Ok(vec![1.0, 0.0])
        }
    }

    fn max_sequence_length(&self) -> usize {
        512
    }

    fn dimension(&self) -> usize {
        2
    }
}

pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
