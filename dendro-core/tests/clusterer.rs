//! Tests for the `Clusterer` orchestration API.

mod common;

use common::{Scenario, scenario, scenarios};
use dendro_core::{ClusterBuilder, ClusterError, ClusterErrorCode, Dendrogram, LinkageMethod};
use dendro_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing::Level;

fn clusterer_for(scenario: &Scenario) -> dendro_core::Clusterer {
    ClusterBuilder::new()
        .with_method(scenario.linkage())
        .with_optimization(scenario.optimize)
        .with_ignore_threshold(scenario.ignore_threshold)
        .build()
        .expect("scenario configuration must be valid")
}

#[rstest]
fn builder_defaults() {
    let builder = ClusterBuilder::new();
    assert!(!builder.optimization());
    assert_eq!(builder.ignore_threshold(), 0);

    let clusterer = builder.build().expect("defaults valid");
    assert_eq!(clusterer.method(), LinkageMethod::Average);
    assert!(!clusterer.optimization());
}

#[rstest]
fn builder_rejects_unknown_method_name() {
    let err = ClusterBuilder::new()
        .with_method_name("nearest")
        .build()
        .expect_err("builder must reject unknown method names");
    assert_eq!(err.code(), ClusterErrorCode::UnknownMethod);
    assert!(matches!(err, ClusterError::UnknownMethod { ref name } if &**name == "nearest"));
}

#[rstest]
#[case::five_items_single("five_items_single")]
#[case::five_items_complete("five_items_complete")]
#[case::bridged_average_optimized("bridged_average_optimized")]
#[case::bridged_mcquitty("bridged_mcquitty")]
#[case::six_items_complete_optimized("six_items_complete_optimized")]
#[case::six_items_ward_bounded("six_items_ward_bounded")]
#[case::six_items_median("six_items_median")]
#[case::six_items_centroid_optimized("six_items_centroid_optimized")]
fn run_reproduces_scenario(#[case] name: &str) {
    let scenario = scenario(name);
    let hclust = clusterer_for(&scenario)
        .run(&scenario.matrix, &scenario.names)
        .expect("scenario input is valid");

    assert_eq!(hclust.newick(), scenario.newick, "{name}: newick");
    assert_eq!(hclust.order(), scenario.order.as_slice(), "{name}: order");
    assert_eq!(hclust.dendrogram().leaf_count(), scenario.names.len());
}

#[rstest]
fn every_scenario_orders_each_name_once() {
    for scenario in scenarios() {
        let hclust = clusterer_for(&scenario)
            .run(&scenario.matrix, &scenario.names)
            .expect("scenario input is valid");
        let mut order = hclust.order().to_vec();
        order.sort();
        let mut names = scenario.names.clone();
        names.sort();
        assert_eq!(order, names, "{}", scenario.name);
    }
}

#[rstest]
fn optimization_keeps_topology() {
    let scenario = scenario("bridged_average_optimized");
    let plain = ClusterBuilder::new()
        .with_method(LinkageMethod::Average)
        .build()
        .expect("configuration valid")
        .run(&scenario.matrix, &scenario.names)
        .expect("input valid");
    let optimized = clusterer_for(&scenario)
        .run(&scenario.matrix, &scenario.names)
        .expect("input valid");

    let heights = |d: &Dendrogram| d.node_heights();
    let plain_heights = heights(plain.dendrogram());
    let optimized_heights = heights(optimized.dendrogram());
    assert_eq!(plain_heights.len(), optimized_heights.len());
    for (left, right) in plain_heights.iter().zip(&optimized_heights) {
        assert!((left - right).abs() < 1e-9, "{left} vs {right}");
    }
}

#[rstest]
fn run_single_item_yields_bare_name() {
    let hclust = ClusterBuilder::new()
        .with_optimization(true)
        .build()
        .expect("configuration valid")
        .run(&[vec![0.0]], &["solo"])
        .expect("a single item is valid");
    assert_eq!(hclust.newick(), "solo");
    assert_eq!(hclust.order(), ["solo".to_owned()].as_slice());
    assert!(hclust.dendrogram().clusters().is_empty());
}

#[rstest]
fn into_parts_returns_owned_outputs() {
    let scenario = scenario("five_items_single");
    let (dendrogram, newick, order) = clusterer_for(&scenario)
        .run(&scenario.matrix, &scenario.names)
        .expect("input valid")
        .into_parts();
    assert_eq!(dendrogram.root(), 8);
    assert_eq!(newick, scenario.newick);
    assert_eq!(order, scenario.order);
}

#[rstest]
fn run_records_span_fields_and_completion_event() {
    let scenario = scenario("six_items_complete_optimized");
    let clusterer = clusterer_for(&scenario);
    let (result, layer) =
        RecordingLayer::capture(|| clusterer.run(&scenario.matrix, &scenario.names));
    result.expect("input valid");

    let span = layer.span("core.run").expect("core.run span must close");
    assert_eq!(span.field("items"), Some("6"));
    assert_eq!(span.field("method"), Some("complete"));
    assert_eq!(span.field("optimization"), Some("true"));
    assert_eq!(span.field("ignore_threshold"), Some("0"));
    assert!(layer.span("core.cluster").is_some());
    assert!(layer.span("core.optimize").is_some());

    let infos = layer.events_at(Level::INFO);
    let completed = infos
        .iter()
        .find(|event| event.message() == Some("clustering completed"))
        .expect("completion event must be emitted");
    assert_eq!(completed.field("leaves"), Some("6"));
}

#[rstest]
fn run_skips_optimizer_span_when_disabled() {
    let scenario = scenario("five_items_single");
    let clusterer = clusterer_for(&scenario);
    let (result, layer) =
        RecordingLayer::capture(|| clusterer.run(&scenario.matrix, &scenario.names));
    result.expect("input valid");
    assert!(layer.span("core.optimize").is_none());
}

#[rstest]
fn run_warns_before_rejecting_a_ragged_matrix() {
    let matrix = vec![vec![0.0, 1.0], vec![1.0]];
    let clusterer = ClusterBuilder::new().build().expect("defaults valid");
    let (result, layer) = RecordingLayer::capture(|| clusterer.run(&matrix, &["a", "b"]));

    let err = result.expect_err("ragged matrix must be rejected");
    assert_eq!(err.code(), ClusterErrorCode::NonSquareMatrix);

    let warnings = layer.events_at(Level::WARN);
    let rejected = warnings
        .iter()
        .find(|event| event.message() == Some("distance matrix rejected"))
        .expect("rejection must be logged");
    assert_eq!(rejected.field("code"), Some("DENDRO_NON_SQUARE_MATRIX"));
}

#[rstest]
fn run_rejects_mismatched_names() {
    let scenario = scenario("five_items_complete");
    let err = clusterer_for(&scenario)
        .run(&scenario.matrix, &scenario.names[..4])
        .expect_err("four names for five items must be rejected");
    assert!(matches!(
        err,
        ClusterError::NameLengthMismatch { names: 4, items: 5 }
    ));
}
