use paramex::document::{FlattenedDocument, StructuredPage};
use paramex::page_map::{reconcile, uniform_estimate, MappingSource, PageEvidence, PageReconciler};
use paramex::ExtractorConfig;
use pretty_assertions::assert_eq;

mod common;

fn evidence(pairs: &[(usize, u32)]) -> PageEvidence {
    pairs.iter().copied().collect()
}

#[test]
fn test_no_evidence_spreads_lines_uniformly() {
    common::setup();

    let mapping = reconcile(&PageEvidence::new(), 1000, Some(10));

    assert_eq!(mapping.len(), 1000);
    assert_eq!(mapping.source(), MappingSource::Estimated);
    assert_eq!(mapping.page_for_line(0), Some(1));
    assert_eq!(mapping.page_for_line(99), Some(1));
    assert_eq!(mapping.page_for_line(100), Some(2));
    assert_eq!(mapping.page_for_line(999), Some(10));
    assert!(mapping.distribution().values().all(|&count| count == 100));
}

#[test]
fn test_last_page_absorbs_remainder() {
    let pages = uniform_estimate(10, 3);

    // 3 lines per page, line 9 would be page 4 but is clamped
    let assigned: Vec<u32> = pages.values().copied().collect();
    assert_eq!(assigned, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 3]);
}

#[test]
fn test_more_pages_than_lines() {
    let mapping = reconcile(&PageEvidence::new(), 3, Some(10));

    assert_eq!(mapping.as_slice(), &[1, 2, 3]);
}

#[test]
fn test_gap_fill_carries_last_known_page() {
    let observed = evidence(&[(0, 1), (10, 2), (20, 3)]);

    let mapping = reconcile(&observed, 30, Some(3));

    assert_eq!(mapping.source(), MappingSource::Structural);
    assert_eq!(mapping.page_for_line(9), Some(1));
    assert_eq!(mapping.page_for_line(10), Some(2));
    assert_eq!(mapping.page_for_line(19), Some(2));
    assert_eq!(mapping.page_for_line(29), Some(3));
}

#[test]
fn test_lines_before_first_observation_take_first_page() {
    let observed = evidence(&[(5, 2), (6, 2), (7, 3)]);

    let mapping = reconcile(&observed, 10, Some(3));

    assert_eq!(mapping.as_slice(), &[2, 2, 2, 2, 2, 2, 2, 3, 3, 3]);
}

#[test]
fn test_sparse_evidence_falls_back_to_estimate() {
    // One observation over 100 lines is under the 10% coverage floor
    let observed = evidence(&[(50, 4)]);

    let mapping = reconcile(&observed, 100, Some(4));

    assert_eq!(mapping.source(), MappingSource::Estimated);
    assert_eq!(mapping.page_for_line(0), Some(1));
    assert_eq!(mapping.page_for_line(25), Some(2));
    assert_eq!(mapping.page_for_line(99), Some(4));
}

#[test]
fn test_out_of_range_observations_are_discarded() {
    let observed = evidence(&[(0, 7), (42, 1)]);

    let mapping = reconcile(&observed, 10, Some(3));

    assert_eq!(mapping.source(), MappingSource::Estimated);
    assert!(mapping.as_slice().iter().all(|&page| (1..=3).contains(&page)));
}

#[test]
fn test_missing_total_pages_is_single_page() {
    let mapping = reconcile(&PageEvidence::new(), 5, None);

    assert_eq!(mapping.total_pages(), 1);
    assert_eq!(mapping.as_slice(), &[1, 1, 1, 1, 1]);
}

#[test]
fn test_empty_document() {
    let mapping = reconcile(&PageEvidence::new(), 0, Some(4));

    assert!(mapping.is_empty());
    assert_eq!(mapping.page_for_line(0), None);
}

#[test]
fn test_every_line_mapped_within_bounds() {
    let observed = evidence(&[(3, 2), (17, 5), (40, 1)]);

    for line_count in [0, 1, 7, 18, 41, 250] {
        let mapping = reconcile(&observed, line_count, Some(5));
        assert_eq!(mapping.len(), line_count);
        assert!(mapping.as_slice().iter().all(|&page| (1..=5).contains(&page)));
    }
}

#[test]
fn test_structural_anchor_assigns_window() {
    common::setup();

    let mut lines = vec!["Title A".to_string()];
    lines.extend((1..35).map(|i| format!("body text {}", i)));
    lines.push("Electrical Characteristics".to_string());
    lines.extend((0..4).map(|i| format!("row {}", i)));
    let document = FlattenedDocument::from_lines(lines);

    let pages = vec![
        StructuredPage::new(1, "Title A\nbody text 1"),
        StructuredPage::new(2, "\n  Electrical Characteristics  \nrow 0"),
    ];

    let reconciler = PageReconciler::default();
    let found = reconciler.collect_evidence(&document, &pages);
    assert_eq!(found.get(&0), Some(&1));
    assert_eq!(found.get(&29), Some(&1));
    assert_eq!(found.get(&30), None);
    assert_eq!(found.get(&35), Some(&2));

    let mapping = reconciler.map_document(&document, &pages, None, Some(2));
    assert_eq!(mapping.source(), MappingSource::Structural);
    assert_eq!(mapping.page_for_line(32), Some(1));
    assert_eq!(mapping.page_for_line(35), Some(2));
    assert_eq!(mapping.page_for_line(39), Some(2));
}

#[test]
fn test_blank_lines_never_anchor_a_page() {
    let document = FlattenedDocument::from_lines(vec!["", "  ", "Features", "more"]);
    let pages = vec![StructuredPage::new(1, "Features")];

    let found = PageReconciler::default().collect_evidence(&document, &pages);

    assert_eq!(found.keys().next(), Some(&2));
}

#[test]
fn test_window_follows_config() {
    let config = ExtractorConfig::default().with_structural_window(2);
    let document = FlattenedDocument::from_lines(vec!["Page one", "a1", "a2", "a3"]);
    let pages = vec![StructuredPage::new(1, "Page one")];

    let found = PageReconciler::from_config(&config).collect_evidence(&document, &pages);

    assert_eq!(found, evidence(&[(0, 1), (1, 1)]));
}

#[test]
fn test_supplied_evidence_overrides_structural() {
    let document = FlattenedDocument::from_lines(vec!["Cover", "x", "y", "z"]);
    let pages = vec![StructuredPage::new(1, "Cover")];
    let supplied = evidence(&[(2, 2)]);
    let config = ExtractorConfig::default().with_structural_window(2);

    let mapping = PageReconciler::from_config(&config).map_document(
        &document,
        &pages,
        Some(&supplied),
        Some(2),
    );

    assert_eq!(mapping.as_slice(), &[1, 1, 2, 2]);
}
