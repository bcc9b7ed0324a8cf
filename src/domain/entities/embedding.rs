use serde::{Deserialize, Serialize};

use super::DocumentChunk;

/// Dense vector produced by the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// 0.0 when dimensions differ or either vector is zero.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }

        let norms = self.norm() * other.norm();
        if norms == 0.0 {
            return 0.0;
        }

        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        dot / norms
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// A chunk paired with the vector it is indexed under.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Embedding,
}
