//! End-to-end tests for legacy page consolidation
//!
//! Each test runs the real stack: filesystem page store, job queues, and
//! both sqlite index backends, all on a temporary directory.

mod common;

use common::TestWiki;
use fernwiki_maintenance::index::IndexOperation;

// =============================================================================
// Consolidation Tests
// =============================================================================

#[tokio::test]
async fn test_legacy_only_page_is_consolidated_and_indexed() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page(
        "LabInventory",
        "---\nowner: ines\n---\nThe microscope lives in cabinet three",
    );

    wiki.consolidate().await;

    assert_eq!(wiki.page_names(), vec!["lab_inventory"]);
    assert_eq!(wiki.quarantined_files(), vec!["LabInventory.md"]);

    // Both indexes see the canonical identifier
    assert_eq!(
        wiki.frontmatter
            .value_of("lab_inventory", "owner")
            .unwrap(),
        Some("ines".to_string())
    );
    assert_eq!(wiki.fulltext.search("microscope", 10), vec!["lab_inventory"]);
}

#[tokio::test]
async fn test_consolidation_purges_an_indexed_legacy_name() {
    let wiki = TestWiki::spawn();
    wiki.writer
        .save(
            "LabInventory",
            b"---\nowner: ines\n---\nThe beakers live on the top shelf",
        )
        .unwrap();
    wiki.wait_for_index().await;
    assert_eq!(wiki.fulltext.search("beakers", 10), vec!["LabInventory"]);

    wiki.consolidate().await;

    // No stale rows under the legacy identifier in either index
    assert_eq!(wiki.fulltext.search("beakers", 10), vec!["lab_inventory"]);
    assert_eq!(
        wiki.frontmatter.value_of("LabInventory", "owner").unwrap(),
        None
    );
    assert_eq!(
        wiki.frontmatter.value_of("lab_inventory", "owner").unwrap(),
        Some("ines".to_string())
    );
}

#[tokio::test]
async fn test_richer_legacy_text_replaces_the_canonical_shadow() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page(
        "LabInventory",
        "A long and carefully maintained inventory of everything in the lab",
    );
    wiki.write_raw_page("lab_inventory", "stub");

    wiki.consolidate().await;

    // Exactly one page survives, with the richer text
    assert_eq!(wiki.page_names(), vec!["lab_inventory"]);
    assert_eq!(
        wiki.page_text("lab_inventory"),
        "A long and carefully maintained inventory of everything in the lab"
    );
    assert_eq!(wiki.quarantined_files(), vec!["LabInventory.md"]);
}

#[tokio::test]
async fn test_richer_canonical_text_survives_the_shadow_conflict() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page("LabInventory", "stub");
    wiki.write_raw_page(
        "lab_inventory",
        "The canonical page already has the better write-up",
    );

    wiki.consolidate().await;

    assert_eq!(wiki.page_names(), vec!["lab_inventory"]);
    assert_eq!(
        wiki.page_text("lab_inventory"),
        "The canonical page already has the better write-up"
    );
    // The losing legacy file is quarantined, not destroyed
    assert_eq!(wiki.quarantined_files(), vec!["LabInventory.md"]);
}

#[tokio::test]
async fn test_several_legacy_spellings_collapse_onto_one_page() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page("MeetingNotes", "short notes");
    wiki.write_raw_page("Meeting-Notes", "the much longer set of meeting notes");
    wiki.write_raw_page("unrelated_page", "left alone");

    wiki.consolidate().await;

    assert_eq!(wiki.page_names(), vec!["meeting_notes", "unrelated_page"]);
    assert_eq!(
        wiki.page_text("meeting_notes"),
        "the much longer set of meeting notes"
    );
    assert_eq!(
        wiki.quarantined_files(),
        vec!["Meeting-Notes.md", "MeetingNotes.md"]
    );
}

#[tokio::test]
async fn test_rescan_after_consolidation_changes_nothing() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page("LabInventory", "text");

    wiki.consolidate().await;
    let pages_after_first = wiki.page_names();
    let quarantined_after_first = wiki.quarantined_files();

    wiki.consolidate().await;

    assert_eq!(wiki.page_names(), pages_after_first);
    assert_eq!(wiki.quarantined_files(), quarantined_after_first);
}

// =============================================================================
// Write Path Tests
// =============================================================================

#[tokio::test]
async fn test_saving_through_the_writer_updates_both_indexes() {
    let wiki = TestWiki::spawn();

    wiki.writer
        .save(
            "garden_plan",
            b"---\nseason: spring\n---\nPlant the tomatoes near the fence",
        )
        .unwrap();
    wiki.wait_for_index().await;

    assert_eq!(
        wiki.frontmatter.value_of("garden_plan", "season").unwrap(),
        Some("spring".to_string())
    );
    assert_eq!(wiki.fulltext.search("tomatoes", 10), vec!["garden_plan"]);
}

#[tokio::test]
async fn test_deleting_through_the_writer_clears_both_indexes() {
    let wiki = TestWiki::spawn();
    wiki.writer
        .save("garden_plan", b"---\nseason: spring\n---\nTomatoes")
        .unwrap();
    wiki.wait_for_index().await;

    wiki.writer.delete("garden_plan").unwrap();
    wiki.wait_for_index().await;

    assert_eq!(wiki.page_names(), Vec::<String>::new());
    assert_eq!(wiki.quarantined_files(), vec!["garden_plan.md"]);
    assert_eq!(
        wiki.frontmatter.value_of("garden_plan", "season").unwrap(),
        None
    );
    assert!(wiki.fulltext.search("Tomatoes", 10).is_empty());
}

// =============================================================================
// Reindex Tests
// =============================================================================

#[tokio::test]
async fn test_bulk_reindex_rebuilds_indexes_for_every_page() {
    let wiki = TestWiki::spawn();
    wiki.write_raw_page("first_page", "---\nteam: core\n---\nalpha beta");
    wiki.write_raw_page("second_page", "---\nteam: core\n---\ngamma delta");

    let page_ids: Vec<String> = wiki.page_names();
    wiki.index
        .enqueue_bulk(&page_ids, IndexOperation::Add)
        .unwrap();
    wiki.wait_for_index().await;

    assert_eq!(
        wiki.frontmatter.pages_with("team", "core").unwrap(),
        vec!["first_page", "second_page"]
    );
    assert_eq!(wiki.fulltext.search("gamma", 10), vec!["second_page"]);
}
