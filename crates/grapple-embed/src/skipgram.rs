//! Skip-gram with negative sampling over token sequences.
//!
//! # The Core Insight
//!
//! Tokens appearing in similar contexts should have similar embeddings.
//! For graphs the "sentences" are random walks and the "words" are nodes
//! (and, for attributed methods, feature tokens interleaved with nodes).
//!
//! # Mathematical Foundation
//!
//! Skip-gram with negative sampling (SGNS) maximizes, per (center, context) pair:
//!
//! ```text
//! L = log σ(v_ctx · v_center) + Σᵢ E[log σ(-v_negᵢ · v_center)]
//! ```
//!
//! Levy & Goldberg (2014) showed SGNS implicitly factorizes a shifted PMI
//! matrix, `v_w · v_c ≈ PMI(w, c) - log k`, which is why walk co-occurrence
//! turns into geometric proximity.
//!
//! Negatives are drawn from the unigram distribution raised to 3/4, which
//! sits between over-sampling frequent tokens (power 1) and rare ones (power 0).
//!
//! # Example
//!
//! ```rust
//! use grapple_embed::skipgram::{SkipGramConfig, Word2Vec};
//!
//! let corpus = vec![vec![0usize, 1, 2, 1, 0], vec![2, 1, 0, 1, 2]];
//! let config = SkipGramConfig { embedding_dim: 8, ..Default::default() };
//! let model = Word2Vec::train(&corpus, config).unwrap();
//!
//! assert_eq!(model.vector(&1).unwrap().len(), 8);
//! assert!(model.vector(&7).is_none());
//! ```
//!
//! # References
//!
//! - Mikolov et al. (2013). "Distributed Representations of Words and Phrases."
//! - Levy & Goldberg (2014). "Neural Word Embedding as Implicit Matrix Factorization."

use grapple_core::walk::Walk;
use grapple_core::{Error, Result};
use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Upper bound on the negative sampling table length.
const NEG_TABLE_SIZE: usize = 1_000_000;

/// Skip-gram model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipGramConfig {
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// Maximum context window (each side); the effective window is sampled
    /// uniformly from `1..=window_size` per position.
    pub window_size: usize,
    /// Negative samples per positive pair.
    pub negative_samples: usize,
    /// Initial learning rate.
    pub learning_rate: f32,
    /// Learning rate reached at the end of training.
    pub min_learning_rate: f32,
    /// Passes over the corpus.
    pub epochs: usize,
    /// Tokens seen fewer times are dropped from the vocabulary.
    pub min_count: usize,
    /// Random seed.
    pub seed: u64,
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 128,
            window_size: 5,
            negative_samples: 5,
            learning_rate: 0.025,
            min_learning_rate: 0.0001,
            epochs: 1,
            min_count: 1,
            seed: 42,
        }
    }
}

impl SkipGramConfig {
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidParameter("embedding_dim must be positive".into()));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidParameter("window_size must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidParameter("epochs must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=self.learning_rate).contains(&self.min_learning_rate) {
            return Err(Error::InvalidParameter(format!(
                "min_learning_rate must be in [0, learning_rate], got {}",
                self.min_learning_rate
            )));
        }
        Ok(())
    }
}

/// Token <-> index mapping with occurrence counts.
///
/// Indices follow first appearance in the corpus.
#[derive(Debug, Clone)]
pub struct Vocabulary<T> {
    index: HashMap<T, u32>,
    tokens: Vec<T>,
    counts: Vec<u64>,
}

impl<T: Hash + Eq + Clone> Vocabulary<T> {
    /// Count tokens and keep those seen at least `min_count` times.
    pub fn build(corpus: &[Vec<T>], min_count: usize) -> Self {
        let mut order: Vec<T> = Vec::new();
        let mut counts: HashMap<T, u64> = HashMap::new();
        for sentence in corpus {
            for token in sentence {
                let c = counts.entry(token.clone()).or_insert_with(|| {
                    order.push(token.clone());
                    0
                });
                *c += 1;
            }
        }

        let mut vocab = Self {
            index: HashMap::new(),
            tokens: Vec::new(),
            counts: Vec::new(),
        };
        for token in order {
            let count = counts[&token];
            if count >= min_count as u64 {
                vocab.index.insert(token.clone(), vocab.tokens.len() as u32);
                vocab.tokens.push(token);
                vocab.counts.push(count);
            }
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of `token`, if kept.
    pub fn get(&self, token: &T) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Token at `idx`.
    pub fn token(&self, idx: u32) -> &T {
        &self.tokens[idx as usize]
    }

    /// Occurrence counts, indexed like the vocabulary.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Map a sentence to indices, dropping out-of-vocabulary tokens.
    pub fn encode(&self, sentence: &[T]) -> Vec<u32> {
        sentence.iter().filter_map(|t| self.get(t)).collect()
    }
}

/// Skip-gram model over token indices `0..num_tokens`.
///
/// Uses two embedding matrices:
/// - `embeddings`: target vectors (what we output)
/// - `context`: output-layer vectors (discarded after training)
pub struct SkipGram {
    /// Target embeddings: (num_tokens, embedding_dim), row major
    embeddings: Vec<f32>,
    /// Context embeddings: (num_tokens, embedding_dim)
    context: Vec<f32>,
    num_tokens: usize,
    config: SkipGramConfig,
    /// Negative sampling table (unigram^0.75)
    neg_table: Vec<u32>,
    current_lr: f32,
    words_processed: usize,
    total_words: usize,
    rng: StdRng,
}

impl SkipGram {
    /// Create a model with small random target vectors and zero context vectors.
    ///
    /// The negative table starts uniform; call [`SkipGram::build_neg_table`]
    /// with token frequencies for the unigram^0.75 distribution.
    pub fn new(num_tokens: usize, config: SkipGramConfig) -> Result<Self> {
        let dim = config.embedding_dim;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let bound = 0.5 / dim as f32;
        let dist = Uniform::new(-bound, bound)
            .map_err(|e| Error::InvalidParameter(format!("embedding init: {e}")))?;

        let embeddings: Vec<f32> = (0..num_tokens * dim).map(|_| dist.sample(&mut rng)).collect();

        Ok(Self {
            embeddings,
            context: vec![0.0; num_tokens * dim],
            num_tokens,
            config,
            neg_table: (0..num_tokens as u32).collect(),
            current_lr: config.learning_rate,
            words_processed: 0,
            total_words: 0,
            rng,
        })
    }

    /// Build the negative sampling table from token frequencies.
    pub fn build_neg_table(&mut self, frequencies: &[u64]) {
        let total: f64 = frequencies.iter().map(|&f| (f as f64).powf(0.75)).sum();
        if total == 0.0 {
            return;
        }
        let table_size = NEG_TABLE_SIZE.min(frequencies.len().max(1) * 1_000);

        let mut table = Vec::with_capacity(table_size);
        let mut cumulative = 0.0;
        for (token, &freq) in frequencies.iter().enumerate() {
            cumulative += (freq as f64).powf(0.75) / total;
            let target = ((cumulative * table_size as f64) as usize).min(table_size);
            let count = target.saturating_sub(table.len());
            table.extend(std::iter::repeat(token as u32).take(count));
        }
        // Rounding may leave a few slots
        while table.len() < table_size {
            table.push((frequencies.len() - 1) as u32);
        }

        self.neg_table = table;
    }

    /// Set total words for learning rate decay.
    pub fn set_total_words(&mut self, total: usize) {
        self.total_words = total;
    }

    /// Train `epochs` passes over an encoded corpus with linear rate decay.
    pub fn train(&mut self, corpus: &[Vec<u32>]) {
        let corpus_words: usize = corpus.iter().map(Vec::len).sum();
        self.set_total_words(corpus_words * self.config.epochs);

        for epoch in 0..self.config.epochs {
            for sentence in corpus {
                self.train_sentence(sentence);
            }
            debug!(epoch, lr = self.current_lr, "skip-gram epoch finished");
        }
    }

    /// Train on a single sentence.
    pub fn train_sentence(&mut self, sentence: &[u32]) {
        let window = self.config.window_size;
        let dim = self.config.embedding_dim;
        let mut neu1e = vec![0.0f32; dim];

        for (pos, &center) in sentence.iter().enumerate() {
            let actual_window = self.rng.random_range(1..=window);
            let start = pos.saturating_sub(actual_window);
            let end = (pos + actual_window + 1).min(sentence.len());

            for ctx_pos in start..end {
                if ctx_pos == pos {
                    continue;
                }
                let context_token = sentence[ctx_pos] as usize;

                neu1e.fill(0.0);
                self.train_pair(center as usize, context_token, 1.0, &mut neu1e);
                for _ in 0..self.config.negative_samples {
                    let neg_idx = self.rng.random_range(0..self.neg_table.len());
                    let neg = self.neg_table[neg_idx] as usize;
                    if neg != context_token {
                        self.train_pair(center as usize, neg, 0.0, &mut neu1e);
                    }
                }

                let t_offset = center as usize * dim;
                for (e, g) in self.embeddings[t_offset..t_offset + dim].iter_mut().zip(&neu1e) {
                    *e += g;
                }
            }

            self.words_processed += 1;
            self.update_lr();
        }
    }

    /// One logistic update of the context vector; the center gradient is
    /// accumulated into `neu1e` and applied once per (center, context) pair.
    fn train_pair(&mut self, center: usize, output: usize, label: f32, neu1e: &mut [f32]) {
        let dim = self.config.embedding_dim;
        let t = &self.embeddings[center * dim..(center + 1) * dim];
        let c = &mut self.context[output * dim..(output + 1) * dim];

        let dot: f32 = t.iter().zip(c.iter()).map(|(a, b)| a * b).sum();
        let sigmoid = 1.0 / (1.0 + (-dot.clamp(-6.0, 6.0)).exp());
        let grad = (label - sigmoid) * self.current_lr;

        for i in 0..dim {
            neu1e[i] += grad * c[i];
            c[i] += grad * t[i];
        }
    }

    fn update_lr(&mut self) {
        if self.total_words == 0 {
            return;
        }
        let progress = self.words_processed as f32 / self.total_words as f32;
        self.current_lr = (self.config.learning_rate
            - (self.config.learning_rate - self.config.min_learning_rate) * progress)
            .max(self.config.min_learning_rate);
    }

    /// Flat target matrix (num_tokens * embedding_dim).
    pub fn embeddings(&self) -> &[f32] {
        &self.embeddings
    }

    /// Target vector of token `idx`.
    pub fn embedding(&self, idx: usize) -> &[f32] {
        let dim = self.config.embedding_dim;
        &self.embeddings[idx * dim..(idx + 1) * dim]
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    /// Learning rate after the last processed word.
    pub fn current_learning_rate(&self) -> f32 {
        self.current_lr
    }
}

/// Vocabulary plus trained skip-gram model, queried by token.
pub struct Word2Vec<T> {
    vocab: Vocabulary<T>,
    model: SkipGram,
}

impl<T: Hash + Eq + Clone + Debug> Word2Vec<T> {
    /// Build the vocabulary from `corpus` and train on it.
    pub fn train(corpus: &[Vec<T>], config: SkipGramConfig) -> Result<Self> {
        config.validate()?;
        let vocab = Vocabulary::build(corpus, config.min_count);
        if vocab.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "empty vocabulary (min_count = {})",
                config.min_count
            )));
        }

        let encoded: Vec<Vec<u32>> = corpus.iter().map(|s| vocab.encode(s)).collect();
        let mut model = SkipGram::new(vocab.len(), config)?;
        model.build_neg_table(vocab.counts());
        model.train(&encoded);

        debug!(
            vocab = vocab.len(),
            sentences = corpus.len(),
            dim = config.embedding_dim,
            "skip-gram training finished"
        );
        Ok(Self { vocab, model })
    }

    /// Vector of `token`, if it is in the vocabulary.
    pub fn vector(&self, token: &T) -> Option<&[f32]> {
        self.vocab
            .get(token)
            .map(|idx| self.model.embedding(idx as usize))
    }

    /// Stack the vectors of `tokens`, in order, into a `(len, dim)` matrix.
    pub fn embedding_for<I>(&self, tokens: I) -> Result<Array2<f64>>
    where
        I: IntoIterator<Item = T>,
    {
        let dim = self.model.embedding_dim();
        let mut data = Vec::new();
        let mut rows = 0;
        for token in tokens {
            let v = self
                .vector(&token)
                .ok_or_else(|| Error::MissingToken(format!("{token:?}")))?;
            data.extend(v.iter().map(|&x| f64::from(x)));
            rows += 1;
        }
        Array2::from_shape_vec((rows, dim), data)
            .map_err(|e| Error::InvalidParameter(format!("embedding shape: {e}")))
    }

    pub fn vocabulary(&self) -> &Vocabulary<T> {
        &self.vocab
    }

    pub fn model(&self) -> &SkipGram {
        &self.model
    }
}

/// Train on node walks and gather the `(node_count, dim)` node matrix.
pub(crate) fn embed_walks(
    walks: &[Walk],
    node_count: usize,
    config: SkipGramConfig,
) -> Result<Array2<f64>> {
    let model = Word2Vec::train(walks, config)?;
    model.embedding_for(0..node_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_skipgram_init() {
        let model = SkipGram::new(100, SkipGramConfig::default()).unwrap();
        assert_eq!(model.num_tokens(), 100);
        assert_eq!(model.embedding_dim(), 128);
        let bound = 0.5 / 128.0;
        assert!(model.embeddings().iter().all(|x| x.abs() <= bound));
    }

    #[test]
    fn test_vocabulary_min_count() {
        let corpus = vec![vec!["a", "b", "a"], vec!["c", "a", "b"]];
        let vocab = Vocabulary::build(&corpus, 2);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.get(&"a"), Some(0));
        assert_eq!(vocab.get(&"b"), Some(1));
        assert_eq!(vocab.get(&"c"), None);
        assert_eq!(vocab.counts(), &[3, 2]);
        assert_eq!(vocab.encode(&["c", "b", "a"]), vec![1, 0]);
    }

    #[test]
    fn test_neg_table_follows_frequency() {
        let mut model = SkipGram::new(2, SkipGramConfig::default()).unwrap();
        model.build_neg_table(&[81, 1]);
        let zeros = model.neg_table.iter().filter(|&&t| t == 0).count();
        // 81^0.75 = 27 vs 1 -> about 27/28 of the table
        let frac = zeros as f64 / model.neg_table.len() as f64;
        assert!((frac - 27.0 / 28.0).abs() < 0.01, "fraction {frac}");
    }

    #[test]
    fn test_learning_rate_decays() {
        let config = SkipGramConfig {
            embedding_dim: 8,
            epochs: 2,
            ..Default::default()
        };
        let mut model = SkipGram::new(4, config).unwrap();
        model.train(&[vec![0, 1, 2, 3], vec![3, 2, 1, 0]]);
        assert!((model.current_learning_rate() - config.min_learning_rate).abs() < 1e-6);
    }

    #[test]
    fn test_cooccurring_tokens_are_closer() {
        // Two disjoint "topics": {0,1,2} and {3,4,5}
        let mut corpus = Vec::new();
        for i in 0..200 {
            let a = i % 3;
            corpus.push(vec![a, (a + 1) % 3, (a + 2) % 3, a]);
            corpus.push(vec![3 + a, 3 + (a + 1) % 3, 3 + (a + 2) % 3, 3 + a]);
        }
        let config = SkipGramConfig {
            embedding_dim: 16,
            window_size: 2,
            learning_rate: 0.05,
            epochs: 5,
            ..Default::default()
        };
        let model = Word2Vec::train(&corpus, config).unwrap();
        let same = cosine(model.vector(&0).unwrap(), model.vector(&1).unwrap());
        let other = cosine(model.vector(&0).unwrap(), model.vector(&4).unwrap());
        assert!(same > other, "same-topic {same} vs cross-topic {other}");
    }

    #[test]
    fn test_training_is_reproducible() {
        let corpus = vec![vec![0usize, 1, 2, 3, 2, 1], vec![3, 2, 1, 0]];
        let config = SkipGramConfig {
            embedding_dim: 8,
            ..Default::default()
        };
        let a = Word2Vec::train(&corpus, config).unwrap();
        let b = Word2Vec::train(&corpus, config).unwrap();
        assert_eq!(a.model().embeddings(), b.model().embeddings());
    }

    #[test]
    fn test_embedding_for_missing_token() {
        let corpus = vec![vec![0usize, 1, 0]];
        let config = SkipGramConfig {
            embedding_dim: 4,
            min_count: 2,
            ..Default::default()
        };
        let model = Word2Vec::train(&corpus, config).unwrap();
        assert!(model.embedding_for([0usize]).is_ok());
        assert!(matches!(model.embedding_for([0usize, 1]), Err(Error::MissingToken(_))));
    }

    #[test]
    fn test_invalid_config() {
        let config = SkipGramConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(Word2Vec::train(&[vec![0usize, 1]], config).is_err());
    }
}
