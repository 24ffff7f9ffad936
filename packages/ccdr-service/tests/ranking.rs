mod support;

use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use ccdr_domain::{Area, Outcome, Query, Record};
use ccdr_service::{
	DiagonalTrainer, Error, FeedbackRetention, OutcomeKind, RankingService, RankingSettings,
	RetrainOutcome, spawn_retrain_loop,
};

use support::{FailingEmbedding, FailingTrainer, SlowEmbedding, SlowTrainer, TopicEmbedding};

fn tags(candidates: &[&str]) -> Vec<String> {
	candidates.iter().map(|tag| tag.to_string()).collect()
}

async fn seeded(ranking: &RankingService) {
	for (tag, record) in
		[("stadium", support::stadium()), ("hospital", support::hospital()), ("school", support::school())]
	{
		ranking.on_record_added(tag, &record).await.expect("Failed to cache record.");
	}
}

fn topic_ranking(
	trainer: Arc<dyn ccdr_service::ScorerTrainer>,
	settings: RankingSettings,
) -> Arc<RankingService> {
	support::ranking_service(Arc::new(TopicEmbedding::new()), trainer, settings)
}

#[tokio::test]
async fn ties_keep_candidate_order() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);
	let twin = Record::new(Area::Culture, "theatre", "Twin Hall");

	ranking.on_record_added("a", &twin).await.expect("Failed to cache record.");
	ranking.on_record_added("b", &twin).await.expect("Failed to cache record.");

	let query = Query::new("concert");
	let forward = ranking.rank(&query, &tags(&["a", "b"])).await.expect("Ranking failed.");
	let backward = ranking.rank(&query, &tags(&["b", "a"])).await.expect("Ranking failed.");

	assert_eq!(forward.items[0].score, forward.items[1].score);
	assert_eq!(
		forward.items.iter().map(|item| item.tag.as_str()).collect::<Vec<_>>(),
		vec!["a", "b"]
	);
	assert_eq!(
		backward.items.iter().map(|item| item.tag.as_str()).collect::<Vec<_>>(),
		vec!["b", "a"]
	);
}

#[tokio::test]
async fn uncached_candidates_are_dropped() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let ranked = ranking
		.rank(&Query::new("stadium"), &tags(&["ghost", "stadium", "school"]))
		.await
		.expect("Ranking failed.");

	assert_eq!(
		ranked.items.iter().map(|item| item.tag.as_str()).collect::<Vec<_>>(),
		vec!["stadium", "school"]
	);
}

#[tokio::test]
async fn empty_candidates_skip_the_embedder() {
	let embedder = Arc::new(TopicEmbedding::new());
	let ranking = support::ranking_service(
		embedder.clone(),
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);
	let ranked = ranking.rank(&Query::new("stadium"), &[]).await.expect("Ranking failed.");

	assert!(ranked.items.is_empty());
	assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_queries_reuse_the_cached_embedding() {
	let embedder = Arc::new(TopicEmbedding::new());
	let ranking = support::ranking_service(
		embedder.clone(),
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let before = embedder.calls.load(Ordering::SeqCst);
	let candidates = tags(&["stadium", "hospital"]);

	ranking.rank(&Query::new("Stadium"), &candidates).await.expect("Ranking failed.");
	ranking.rank(&Query::new("  stadium "), &candidates).await.expect("Ranking failed.");

	assert_eq!(embedder.calls.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn slow_embedder_times_out() {
	let settings =
		RankingSettings { embed_timeout: Duration::from_millis(20), ..RankingSettings::default() };
	let ranking = support::ranking_service(
		Arc::new(SlowEmbedding { delay: Duration::from_millis(500) }),
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		settings,
	);
	let err = ranking
		.on_record_added("stadium", &support::stadium())
		.await
		.expect_err("Expected a timeout.");

	assert!(matches!(err, Error::EmbeddingTimeout { timeout_ms: 20 }));
	assert!(!ranking.is_cached("stadium"));
}

#[tokio::test]
async fn provider_failure_is_not_an_empty_result() {
	let ranking = support::ranking_service(
		Arc::new(FailingEmbedding),
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);
	let err = ranking
		.rank(&Query::new("stadium"), &tags(&["stadium"]))
		.await
		.expect_err("Expected a provider failure.");

	assert!(matches!(err, Error::EmbeddingUnavailable { .. }));
}

#[tokio::test]
async fn feedback_of_the_wrong_kind_is_rejected() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { outcome: OutcomeKind::Relevance, ..RankingSettings::default() },
	);

	assert!(matches!(
		ranking.record_feedback("hash", "stadium", Outcome::Click(true)),
		Err(Error::InvalidRequest { .. })
	));
	assert!(ranking.record_feedback("hash", "stadium", Outcome::Relevance(0.5)).is_ok());
	assert!(matches!(
		ranking.record_feedback("hash", "stadium", Outcome::Relevance(f32::NAN)),
		Err(Error::InvalidRequest { .. })
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ranks_see_exactly_one_generation() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::from_millis(200), 42.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let query = Query::new("stadium");
	let candidates = tags(&["stadium", "hospital", "school"]);

	ranking.rank(&query, &candidates).await.expect("Ranking failed.");
	ranking.record_feedback(&query.hash, "stadium", Outcome::Click(true)).expect("Feedback failed.");

	let retrain = tokio::spawn({
		let ranking = ranking.clone();

		async move { ranking.retrain_and_swap().await }
	});
	let mut readers = Vec::new();

	for _ in 0..8 {
		let ranking = ranking.clone();
		let query = query.clone();
		let candidates = candidates.clone();

		readers.push(tokio::spawn(async move {
			let mut seen = Vec::new();

			for _ in 0..40 {
				seen.push(ranking.rank(&query, &candidates).await.expect("Ranking failed."));
				tokio::time::sleep(Duration::from_millis(10)).await;
			}

			seen
		}));
	}

	let mut generations = Vec::new();

	for reader in readers {
		for ranked in reader.await.expect("Reader panicked.") {
			let trained = ranked.items.iter().filter(|item| item.score == 42.0).count();

			match ranked.generation {
				0 => assert_eq!(trained, 0),
				1 => assert_eq!(trained, ranked.items.len()),
				other => panic!("Unexpected generation {other}."),
			}

			generations.push(ranked.generation);
		}
	}

	assert_eq!(
		retrain.await.expect("Retrain panicked."),
		RetrainOutcome::Swapped { generation: 1, examples: 1 }
	);
	assert!(generations.contains(&0));
	assert!(generations.contains(&1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_retrains_are_skipped() {
	let trainer = Arc::new(SlowTrainer::new(Duration::from_millis(200), 1.0));
	let ranking = topic_ranking(trainer.clone(), RankingSettings::default());

	seeded(&ranking).await;

	let query = Query::new("school");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "school", Outcome::Click(true)).expect("Feedback failed.");

	let first = tokio::spawn({
		let ranking = ranking.clone();

		async move { ranking.retrain_and_swap().await }
	});

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(ranking.retrain_and_swap().await, RetrainOutcome::Skipped);
	assert!(matches!(first.await.expect("Retrain panicked."), RetrainOutcome::Swapped { .. }));
	assert_eq!(trainer.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pruning_keeps_feedback_recorded_during_training() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::from_millis(150), 1.0)),
		RankingSettings { retention: FeedbackRetention::Prune, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	let query = Query::new("hospital");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");

	let retrain = tokio::spawn({
		let ranking = ranking.clone();

		async move { ranking.retrain_and_swap().await }
	});

	tokio::time::sleep(Duration::from_millis(50)).await;
	ranking.record_feedback(&query.hash, "school", Outcome::Click(false)).expect("Feedback failed.");

	assert_eq!(
		retrain.await.expect("Retrain panicked."),
		RetrainOutcome::Swapped { generation: 1, examples: 1 }
	);
	assert_eq!(ranking.pending_feedback(), 1);
}

#[tokio::test]
async fn retained_feedback_is_trained_again() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let query = Query::new("hospital");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");

	assert!(matches!(ranking.retrain_and_swap().await, RetrainOutcome::Swapped { generation: 1, .. }));
	assert!(matches!(ranking.retrain_and_swap().await, RetrainOutcome::Swapped { generation: 2, .. }));
	assert_eq!(ranking.pending_feedback(), 1);
	assert_eq!(ranking.pinned_queries(), 1);
}

#[tokio::test]
async fn failed_training_keeps_the_serving_model() {
	let ranking = topic_ranking(Arc::new(FailingTrainer), RankingSettings::default());

	seeded(&ranking).await;

	let query = Query::new("stadium");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "stadium", Outcome::Click(true)).expect("Feedback failed.");

	assert!(matches!(ranking.retrain_and_swap().await, RetrainOutcome::Failed { .. }));
	assert_eq!(ranking.generation(), 0);
	assert_eq!(ranking.pending_feedback(), 1);
}

#[tokio::test]
async fn feedback_without_a_known_query_is_not_trainable() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;
	ranking.record_feedback("unseen", "stadium", Outcome::Click(true)).expect("Feedback failed.");

	assert_eq!(ranking.retrain_and_swap().await, RetrainOutcome::NoFeedback);
	assert_eq!(ranking.generation(), 0);
}

#[tokio::test]
async fn fresh_queries_train_after_the_query_cache_fills() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { query_cache_capacity: 1, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	let candidates = tags(&["stadium", "hospital"]);
	let stadium = Query::new("stadium");
	let hospital = Query::new("hospital");

	ranking.rank(&stadium, &candidates).await.expect("Ranking failed.");
	ranking.rank(&hospital, &candidates).await.expect("Ranking failed.");
	ranking.record_feedback(&hospital.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");

	assert_eq!(
		ranking.retrain_and_swap().await,
		RetrainOutcome::Swapped { generation: 1, examples: 1 }
	);
	assert_eq!(ranking.cached_queries(), 1);
}

#[tokio::test]
async fn feedback_trains_once_its_query_is_searched_again() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { query_cache_capacity: 1, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	let candidates = tags(&["stadium", "hospital"]);
	let stadium = Query::new("stadium");
	let hospital = Query::new("hospital");

	ranking.rank(&hospital, &candidates).await.expect("Ranking failed.");
	ranking.rank(&stadium, &candidates).await.expect("Ranking failed.");
	assert_eq!(ranking.cached_queries(), 1);

	ranking.record_feedback(&hospital.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");

	assert_eq!(ranking.retrain_and_swap().await, RetrainOutcome::NoFeedback);

	ranking.rank(&hospital, &candidates).await.expect("Ranking failed.");

	assert_eq!(
		ranking.retrain_and_swap().await,
		RetrainOutcome::Swapped { generation: 1, examples: 1 }
	);
}

#[tokio::test]
async fn pruning_keeps_feedback_that_could_not_train() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { retention: FeedbackRetention::Prune, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	let query = Query::new("hospital");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");
	ranking.record_feedback("unseen", "stadium", Outcome::Click(true)).expect("Feedback failed.");

	assert_eq!(
		ranking.retrain_and_swap().await,
		RetrainOutcome::Swapped { generation: 1, examples: 1 }
	);
	assert_eq!(ranking.pending_feedback(), 1);
}

#[tokio::test]
async fn pruning_releases_pinned_queries() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { retention: FeedbackRetention::Prune, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	let query = Query::new("hospital");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");

	assert_eq!(ranking.pinned_queries(), 1);
	assert!(matches!(ranking.retrain_and_swap().await, RetrainOutcome::Swapped { .. }));
	assert_eq!(ranking.pending_feedback(), 0);
	assert_eq!(ranking.pinned_queries(), 0);
}

#[tokio::test]
async fn pinned_queries_are_bounded_by_the_query_capacity() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings { query_cache_capacity: 1, ..RankingSettings::default() },
	);

	seeded(&ranking).await;

	for text in ["stadium", "hospital", "school"] {
		let query = Query::new(text);

		ranking.prime_query(&query).await.expect("Failed to prime query.");
		ranking.record_feedback(&query.hash, text, Outcome::Click(true)).expect("Feedback failed.");
	}

	assert_eq!(ranking.pinned_queries(), 1);
	assert_eq!(ranking.pending_feedback(), 3);
}

#[tokio::test]
async fn diagonal_trainer_promotes_clicked_candidates() {
	let ranking = topic_ranking(
		Arc::new(DiagonalTrainer::new(&ccdr_config::Training { epochs: 200, learning_rate: 0.2 })),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let query = Query::new("stadium hospital");
	let candidates = tags(&["stadium", "hospital"]);

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "hospital", Outcome::Click(true)).expect("Feedback failed.");
	ranking.record_feedback(&query.hash, "stadium", Outcome::Click(false)).expect("Feedback failed.");

	assert!(matches!(ranking.retrain_and_swap().await, RetrainOutcome::Swapped { examples: 2, .. }));

	let ranked = ranking.rank(&query, &candidates).await.expect("Ranking failed.");

	assert_eq!(ranked.generation, 1);
	assert_eq!(ranked.items[0].tag, "hospital");
}

#[tokio::test(start_paused = true)]
async fn retrain_loop_swaps_on_each_tick_until_shutdown() {
	let ranking = topic_ranking(
		Arc::new(SlowTrainer::new(Duration::ZERO, 1.0)),
		RankingSettings::default(),
	);

	seeded(&ranking).await;

	let query = Query::new("school");

	ranking.prime_query(&query).await.expect("Failed to prime query.");
	ranking.record_feedback(&query.hash, "school", Outcome::Click(true)).expect("Feedback failed.");

	let handle = spawn_retrain_loop(ranking.clone(), Duration::from_secs(10));

	assert_eq!(ranking.generation(), 0);

	tokio::time::sleep(Duration::from_secs(25)).await;

	let generation = ranking.generation();

	assert_eq!(generation, 2);

	handle.shutdown().await;
	tokio::time::sleep(Duration::from_secs(30)).await;

	assert_eq!(ranking.generation(), generation);
}
