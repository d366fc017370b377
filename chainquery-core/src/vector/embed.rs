//! Text embedding contract and a deterministic mock

use crate::{Error, Result};

/// Turns text into a dense vector of exactly `dim` components
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str, dim: usize) -> Result<Vec<f32>>;
}

impl<F> Embedder for F
where
    F: Fn(&str, usize) -> Result<Vec<f32>> + Send + Sync,
{
    fn embed(&self, text: &str, dim: usize) -> Result<Vec<f32>> {
        self(text, dim)
    }
}

/// Deterministic embedder for tests and demos
///
/// Folds the text's bytes into `dim` slots. Not semantically meaningful.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str, dim: usize) -> Result<Vec<f32>> {
        if dim == 0 {
            return Err(Error::validation("embedding dimension must be > 0"));
        }
        let mut v = vec![0.0_f32; dim];
        for (i, b) in text.as_bytes().iter().enumerate() {
            v[i % dim] += f32::from(*b) / 255.0;
        }
        Ok(v)
    }
}

/// Embed `text` and check the result has `dim` components
pub fn embed_checked(embedder: &dyn Embedder, text: &str, dim: usize) -> Result<Vec<f32>> {
    let vector = embedder.embed(text, dim)?;
    if vector.len() != dim {
        return Err(Error::validation(format!(
            "embedding dimension mismatch: expected {}, got {}",
            dim,
            vector.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_is_deterministic() {
        let a = HashEmbedder.embed("hello", 4).unwrap();
        let b = HashEmbedder.embed("hello", 4).unwrap();
        assert_eq!(a.len(), 4);
        assert_eq!(a, b);
        assert_ne!(a, HashEmbedder.embed("world", 4).unwrap());
    }

    #[test]
    fn test_hash_embedder_rejects_zero_dim() {
        assert!(matches!(
            HashEmbedder.embed("x", 0),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_closure_embedder_plugs_in() {
        let embedder = |_: &str, dim: usize| -> Result<Vec<f32>> { Ok(vec![1.0; dim]) };
        assert_eq!(embed_checked(&embedder, "a", 3).unwrap(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let embedder = |_: &str, _: usize| -> Result<Vec<f32>> { Ok(vec![1.0]) };
        let err = embed_checked(&embedder, "a", 3).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }
}
