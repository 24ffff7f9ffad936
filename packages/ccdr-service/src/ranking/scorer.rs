//! Scoring models and the trainer that produces replacements for them.

use std::sync::Arc;

use ccdr_config::Training;

use crate::{BoxFuture, Embedding};

pub trait Scorer
where
	Self: Send + Sync,
{
	fn score(&self, query: &[f32], candidate: &[f32]) -> f32;
}

/// A labelled (query, candidate) pair resolved against the embedding caches.
#[derive(Clone)]
pub struct TrainingExample {
	pub query: Embedding,
	pub candidate: Embedding,
	pub target: f32,
}

/// Point-in-time input to a retraining run.
pub struct TrainingSnapshot {
	pub examples: Vec<TrainingExample>,
	pub tags: Vec<String>,
}

pub trait ScorerTrainer
where
	Self: Send + Sync,
{
	fn train(&self, snapshot: Arc<TrainingSnapshot>) -> BoxFuture<'_, color_eyre::Result<Arc<dyn Scorer>>>;
}

/// Untrained model served until the first swap.
pub struct CosineScorer;
impl Scorer for CosineScorer {
	fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
		cosine(query, candidate)
	}
}

/// Per-dimension weighted cosine, `sum(w_i * q_i * c_i) + b` over unit vectors.
///
/// With unit weights and zero bias it ranks exactly like [`CosineScorer`].
#[derive(Debug, Clone)]
pub struct DiagonalScorer {
	weights: Vec<f32>,
	bias: f32,
}
impl DiagonalScorer {
	pub fn identity(dimensions: usize) -> Self {
		Self { weights: vec![1.0; dimensions], bias: 0.0 }
	}

	fn features(query: &[f32], candidate: &[f32]) -> Vec<f32> {
		let query_norm = norm(query);
		let candidate_norm = norm(candidate);

		if query_norm == 0.0 || candidate_norm == 0.0 {
			return vec![0.0; query.len().min(candidate.len())];
		}

		query
			.iter()
			.zip(candidate)
			.map(|(q, c)| (q / query_norm) * (c / candidate_norm))
			.collect()
	}

	fn predict(&self, features: &[f32]) -> f32 {
		features
			.iter()
			.enumerate()
			.map(|(i, feature)| self.weights.get(i).copied().unwrap_or(1.0) * feature)
			.sum::<f32>()
			+ self.bias
	}
}
impl Scorer for DiagonalScorer {
	fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
		self.predict(&Self::features(query, candidate))
	}
}

/// Fits a [`DiagonalScorer`] with squared-error SGD on a blocking thread.
pub struct DiagonalTrainer {
	epochs: u32,
	learning_rate: f32,
}
impl DiagonalTrainer {
	pub fn new(cfg: &Training) -> Self {
		Self { epochs: cfg.epochs, learning_rate: cfg.learning_rate }
	}

	pub fn fit(&self, snapshot: &TrainingSnapshot) -> color_eyre::Result<DiagonalScorer> {
		let Some(first) = snapshot.examples.first() else {
			return Err(color_eyre::eyre::eyre!("Training snapshot has no examples."));
		};
		let dimensions = first.query.len();
		let mut model = DiagonalScorer::identity(dimensions);
		let rows = snapshot
			.examples
			.iter()
			.filter(|example| example.query.len() == dimensions && example.candidate.len() == dimensions)
			.map(|example| (DiagonalScorer::features(&example.query, &example.candidate), example.target))
			.collect::<Vec<_>>();

		tracing::debug!(
			examples = rows.len(),
			tags = snapshot.tags.len(),
			epochs = self.epochs,
			"Fitting diagonal scorer."
		);

		for _ in 0..self.epochs {
			for (features, target) in &rows {
				let residual = model.predict(features) - target;

				for (weight, feature) in model.weights.iter_mut().zip(features) {
					*weight -= self.learning_rate * residual * feature;
				}

				model.bias -= self.learning_rate * residual;
			}
		}

		if model.weights.iter().any(|weight| !weight.is_finite()) || !model.bias.is_finite() {
			return Err(color_eyre::eyre::eyre!("Training diverged."));
		}

		Ok(model)
	}
}
impl ScorerTrainer for DiagonalTrainer {
	fn train(&self, snapshot: Arc<TrainingSnapshot>) -> BoxFuture<'_, color_eyre::Result<Arc<dyn Scorer>>> {
		let trainer = Self { epochs: self.epochs, learning_rate: self.learning_rate };

		Box::pin(async move {
			let model = tokio::task::spawn_blocking(move || trainer.fit(&snapshot)).await??;

			Ok(Arc::new(model) as Arc<dyn Scorer>)
		})
	}
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let denominator = norm(a) * norm(b);

	if denominator == 0.0 {
		return 0.0;
	}

	a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>() / denominator
}

fn norm(vector: &[f32]) -> f32 {
	vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}
