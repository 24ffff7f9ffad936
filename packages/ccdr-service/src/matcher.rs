//! Online clustering of record embeddings plus an exact lookup by canonical type.
//!
//! [`EcmMatcher`] follows the evolving clustering method: a cluster is a centre and a radius,
//! a sample inside some radius joins that cluster untouched, otherwise the closest cluster (by
//! distance plus radius) grows toward the sample unless doing so would exceed twice the distance
//! threshold, in which case the sample seeds a new cluster.

use std::{
	collections::{BTreeMap, HashMap},
	sync::RwLock,
};

use ccdr_domain::fold;

pub trait Matcher
where
	Self: Send + Sync,
{
	/// Indexes `tag`, replacing any previous placement of the same tag.
	fn index(&self, tag: &str, kind: &str, embedding: &[f32]);

	/// Returns whether the tag was indexed.
	fn remove(&self, tag: &str) -> bool;

	/// Tags whose canonical type equals `kind` after case and accent folding.
	fn tags_of_type(&self, kind: &str) -> Vec<String>;

	fn cluster_ids(&self) -> Vec<u64>;

	fn tags_in_cluster(&self, cluster_id: u64) -> Vec<String>;
}

struct Cluster {
	center: Vec<f32>,
	radius: f32,
	tags: Vec<String>,
}

#[derive(Default)]
struct EcmState {
	next_id: u64,
	clusters: BTreeMap<u64, Cluster>,
	membership: HashMap<String, (u64, String)>,
	kinds: HashMap<String, Vec<String>>,
}
impl EcmState {
	fn place(&mut self, embedding: &[f32], distance_threshold: f32) -> u64 {
		let mut inside: Option<(u64, f32)> = None;
		let mut closest: Option<(u64, f32)> = None;

		for (id, cluster) in &self.clusters {
			let Some(distance) = euclidean(&cluster.center, embedding) else {
				continue;
			};

			if distance <= cluster.radius && inside.is_none_or(|(_, best)| distance < best) {
				inside = Some((*id, distance));
			}

			let reach = distance + cluster.radius;

			if closest.is_none_or(|(_, best)| reach < best) {
				closest = Some((*id, reach));
			}
		}

		if let Some((id, _)) = inside {
			return id;
		}

		if let Some((id, reach)) = closest
			&& reach <= 2.0 * distance_threshold
			&& let Some(cluster) = self.clusters.get_mut(&id)
		{
			let radius = reach / 2.0;
			let distance = reach - cluster.radius;

			if distance > 0.0 {
				let ratio = radius / distance;

				for (center, sample) in cluster.center.iter_mut().zip(embedding) {
					*center = sample + (*center - sample) * ratio;
				}
			}

			cluster.radius = radius;

			return id;
		}

		let id = self.next_id;

		self.next_id += 1;
		self.clusters.insert(id, Cluster { center: embedding.to_vec(), radius: 0.0, tags: Vec::new() });

		id
	}

	fn detach(&mut self, tag: &str) -> bool {
		let Some((cluster_id, kind)) = self.membership.remove(tag) else {
			return false;
		};

		if let Some(cluster) = self.clusters.get_mut(&cluster_id) {
			cluster.tags.retain(|member| member != tag);

			if cluster.tags.is_empty() {
				self.clusters.remove(&cluster_id);
			}
		}
		if let Some(tags) = self.kinds.get_mut(&kind) {
			tags.retain(|member| member != tag);

			if tags.is_empty() {
				self.kinds.remove(&kind);
			}
		}

		true
	}
}

pub struct EcmMatcher {
	distance_threshold: f32,
	state: RwLock<EcmState>,
}
impl EcmMatcher {
	pub fn new(distance_threshold: f32) -> Self {
		Self { distance_threshold, state: RwLock::new(EcmState::default()) }
	}

	pub fn len(&self) -> usize {
		self.state.read().unwrap_or_else(|err| err.into_inner()).membership.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl Matcher for EcmMatcher {
	fn index(&self, tag: &str, kind: &str, embedding: &[f32]) {
		let mut state = self.state.write().unwrap_or_else(|err| err.into_inner());

		state.detach(tag);

		let cluster_id = state.place(embedding, self.distance_threshold);
		let kind = fold(kind);

		if let Some(cluster) = state.clusters.get_mut(&cluster_id) {
			cluster.tags.push(tag.to_string());
		}

		state.kinds.entry(kind.clone()).or_default().push(tag.to_string());
		state.membership.insert(tag.to_string(), (cluster_id, kind));
	}

	fn remove(&self, tag: &str) -> bool {
		self.state.write().unwrap_or_else(|err| err.into_inner()).detach(tag)
	}

	fn tags_of_type(&self, kind: &str) -> Vec<String> {
		let state = self.state.read().unwrap_or_else(|err| err.into_inner());

		state.kinds.get(&fold(kind)).cloned().unwrap_or_default()
	}

	fn cluster_ids(&self) -> Vec<u64> {
		self.state.read().unwrap_or_else(|err| err.into_inner()).clusters.keys().copied().collect()
	}

	fn tags_in_cluster(&self, cluster_id: u64) -> Vec<String> {
		let state = self.state.read().unwrap_or_else(|err| err.into_inner());

		state.clusters.get(&cluster_id).map(|cluster| cluster.tags.clone()).unwrap_or_default()
	}
}

fn euclidean(a: &[f32], b: &[f32]) -> Option<f32> {
	if a.len() != b.len() {
		return None;
	}

	Some(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt())
}
