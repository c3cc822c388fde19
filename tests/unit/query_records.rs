//! Query-record display properties over the public API.

use crate::common::builders::{QueryRecordBuilder, frame};
use crate::common::fixtures::{connections, renderer};
use grappelli::Panel;
use grappelli::SqlPanel;
use grappelli::db::{ConnectionRegistry, QueryLog};
use grappelli::ui::TemplateRenderer;
use rstest::*;
use std::sync::Arc;

#[rstest]
fn builder_derives_the_flags_the_recorder_would(
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let (_registry, log) = connections;
	log.push(
		QueryRecordBuilder::new()
			.sql("  SELECT * FROM users")
			.duration_ms(750.0)
			.build(),
	);
	log.push(
		QueryRecordBuilder::new()
			.sql("UPDATE users SET active = 1")
			.duration_ms(10.0)
			.build(),
	);

	let records = log.records();
	assert!(records[0].is_slow);
	assert!(records[0].is_select);
	assert!(!records[1].is_slow);
	assert!(!records[1].is_select);
}

#[rstest]
fn stack_frames_reach_the_rendered_panel(
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
	renderer: Arc<TemplateRenderer>,
) {
	let (registry, log) = connections;
	let panel = SqlPanel::new(renderer, registry);
	log.push(
		QueryRecordBuilder::new()
			.sql("SELECT * FROM orders")
			.duration_ms(3.0)
			.stacktrace(vec![frame("src/views/orders.rs", 42, "order_list")])
			.build(),
	);

	let html = panel.content().unwrap();
	assert!(html.contains("src/views/orders.rs"));
	assert!(html.contains("order_list"));
}

#[rstest]
fn ratios_cover_the_timeline_once(connections: (Arc<ConnectionRegistry>, Arc<QueryLog>)) {
	let (registry, log) = connections;
	let panel = SqlPanel::new(Arc::new(TemplateRenderer::new()), registry);
	for duration in [25.0, 25.0, 50.0] {
		log.push(
			QueryRecordBuilder::new()
				.sql("SELECT 1")
				.duration_ms(duration)
				.build(),
		);
	}

	let stats = panel.init_stats();
	let ratios: Vec<f64> = stats.databases["default"]
		.iter()
		.map(|query| (query.duration / stats.sql_time) * 100.0)
		.collect();
	assert!((ratios.iter().sum::<f64>() - 100.0).abs() < 1e-9);
}
