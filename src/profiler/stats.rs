//! Aggregation of the profiler's event stream.

use super::ProfileEvent;
use crate::error::{ToolbarError, ToolbarResult};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Identity of a profiled scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FuncKey {
	/// Source file of the scope's opening location.
	pub file: String,
	/// Line of the scope's opening location.
	pub line: u32,
	/// Scope name.
	pub function: String,
}

/// Aggregated numbers for one scope.
///
/// `calls` counts every activation; `primitive_calls` only those not
/// reached through recursion. `total_time` is self time, `cumulative_time`
/// includes callees and counts each recursive chain once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncStats {
	/// Total number of activations.
	pub calls: u64,
	/// Activations not reached through recursion.
	pub primitive_calls: u64,
	/// Time spent in the scope itself.
	pub total_time: Duration,
	/// Time spent in the scope and everything below it.
	pub cumulative_time: Duration,
}

struct ActiveCall {
	key: FuncKey,
	entered_at: u64,
	child_time: u64,
}

/// Statistics loaded from a profile event file.
#[derive(Debug, Default)]
pub struct ProfileStats {
	entries: HashMap<FuncKey, FuncStats>,
}

impl ProfileStats {
	/// Load and aggregate the event stream written by a
	/// [`super::Profiler`].
	///
	/// Scopes still open at the end of the stream (a cancelled view
	/// future) are treated as exiting at the last recorded timestamp.
	pub fn load(path: &Path) -> ToolbarResult<Self> {
		let raw = fs::read_to_string(path)?;
		let mut entries: HashMap<FuncKey, FuncStats> = HashMap::new();
		let mut stack: Vec<ActiveCall> = Vec::new();
		let mut last_t = 0u64;

		for line in raw.lines().filter(|line| !line.trim().is_empty()) {
			let event: ProfileEvent = serde_json::from_str(line)
				.map_err(|err| ToolbarError::ProfileError(format!("bad profile event: {err}")))?;
			match event {
				ProfileEvent::Enter {
					file,
					line,
					function,
					t,
				} => {
					last_t = t;
					stack.push(ActiveCall {
						key: FuncKey {
							file,
							line,
							function,
						},
						entered_at: t,
						child_time: 0,
					});
				}
				ProfileEvent::Exit { t } => {
					last_t = t;
					let call = stack.pop().ok_or_else(|| {
						ToolbarError::ProfileError(
							"exit event without matching enter".to_string(),
						)
					})?;
					Self::account(&mut entries, &mut stack, call, t);
				}
			}
		}
		while let Some(call) = stack.pop() {
			Self::account(&mut entries, &mut stack, call, last_t);
		}

		Ok(Self { entries })
	}

	fn account(
		entries: &mut HashMap<FuncKey, FuncStats>,
		stack: &mut Vec<ActiveCall>,
		call: ActiveCall,
		exit_t: u64,
	) {
		let span = exit_t.saturating_sub(call.entered_at);
		let self_time = span.saturating_sub(call.child_time);
		let recursive = stack.iter().any(|active| active.key == call.key);

		let stats = entries.entry(call.key).or_default();
		stats.calls += 1;
		stats.total_time += Duration::from_nanos(self_time);
		if !recursive {
			stats.primitive_calls += 1;
			stats.cumulative_time += Duration::from_nanos(span);
		}

		if let Some(parent) = stack.last_mut() {
			parent.child_time += span;
		}
	}

	/// Total number of recorded activations across all scopes.
	pub fn total_calls(&self) -> u64 {
		self.entries.values().map(|stats| stats.calls).sum()
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the profile recorded anything at all.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Stats for one scope, if recorded.
	pub fn get(&self, key: &FuncKey) -> Option<&FuncStats> {
		self.entries.get(key)
	}

	/// All scopes, cumulative time descending.
	pub fn sorted_by_cumulative(&self) -> Vec<(&FuncKey, &FuncStats)> {
		let mut list: Vec<_> = self.entries.iter().collect();
		list.sort_by(|(key_a, a), (key_b, b)| {
			b.cumulative_time
				.cmp(&a.cumulative_time)
				.then_with(|| b.total_time.cmp(&a.total_time))
				.then_with(|| key_a.function.cmp(&key_b.function))
		});
		list
	}
}
