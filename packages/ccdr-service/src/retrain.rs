//! Periodic retraining driver.

use std::{sync::Arc, time::Duration};

use tokio::{
	sync::watch,
	task::JoinHandle,
	time::{self as tokio_time, MissedTickBehavior},
};

use crate::ranking::{RankingService, RetrainOutcome};

/// Stops the loop between ticks. A run that already took its snapshot finishes first.
pub struct RetrainHandle {
	shutdown: watch::Sender<bool>,
	join: JoinHandle<()>,
}
impl RetrainHandle {
	pub async fn shutdown(self) {
		let _ = self.shutdown.send(true);

		if let Err(err) = self.join.await {
			tracing::error!(error = %err, "Retraining loop terminated abnormally.");
		}
	}
}

pub fn spawn_retrain_loop(ranking: Arc<RankingService>, interval: Duration) -> RetrainHandle {
	let (shutdown, receiver) = watch::channel(false);
	let join = tokio::spawn(run_retrain_loop(ranking, interval, receiver));

	RetrainHandle { shutdown, join }
}

pub async fn run_retrain_loop(
	ranking: Arc<RankingService>,
	interval: Duration,
	mut shutdown: watch::Receiver<bool>,
) {
	let mut ticker = tokio_time::interval(interval);

	// Overlapping runs are never queued.
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
	ticker.tick().await;

	loop {
		tokio::select! {
			_ = ticker.tick() => {},
			changed = shutdown.changed() => {
				if changed.is_err() || *shutdown.borrow() {
					break;
				}

				continue;
			},
		}

		match ranking.retrain_and_swap().await {
			RetrainOutcome::Swapped { generation, examples } => {
				tracing::debug!(generation, examples, "Retraining tick swapped the model.");
			},
			RetrainOutcome::Failed { message } => {
				tracing::warn!(error = %message, "Retraining tick failed.");
			},
			RetrainOutcome::Skipped | RetrainOutcome::NoFeedback => {},
		}
	}

	tracing::info!("Retraining loop stopped.");
}
