//! Duplicate detection and history retention, end to end through the files

use idea_engine::{
    similarity, DuplicateReason, IdeaTracker, IdeaType, TrackerConfig, MAX_TRACKED_IDEAS,
};

fn open(dir: &tempfile::TempDir) -> IdeaTracker {
    IdeaTracker::open(dir.path().join("ideas_history.json"), TrackerConfig::default()).unwrap()
}

#[test]
fn test_similarity_properties() {
    let samples = [
        "",
        "a",
        "Widget",
        "A new kind of widget",
        "invoices for freelancers",
        "ñandú",
    ];
    for a in samples {
        if !a.is_empty() {
            assert_eq!(similarity(a, a), 1.0);
        }
        for b in samples {
            let ab = similarity(a, b);
            assert_eq!(ab, similarity(b, a), "asymmetric for {:?} / {:?}", a, b);
            assert!((0.0..=1.0).contains(&ab));
        }
    }
    assert_eq!(similarity(&"Foo".to_lowercase(), &"foo".to_lowercase()), 1.0);
}

#[test]
fn test_empty_tracker_accepts_everything() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = open(&dir);
    assert_eq!(tracker.is_duplicate("Widget", "A new kind of widget"), None);
}

#[test]
fn test_exact_name_after_add() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = open(&dir);
    tracker.add_idea("Widget", "A new kind of widget", IdeaType::SaaS, 70).unwrap();

    let reason = tracker.is_duplicate("widget", "anything").unwrap();
    assert_eq!(reason, DuplicateReason::ExactName);
    assert_eq!(reason.to_string(), "exact name match");
}

#[test]
fn test_similar_description_names_prior_idea() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = open(&dir);
    tracker
        .add_idea(
            "InvoiceFlow",
            "Helps freelancers track invoices and get paid faster",
            IdeaType::MicroSaaS,
            75,
        )
        .unwrap();

    let reason = tracker
        .is_duplicate(
            "PayChaser",
            "Helps freelancers track their invoices and get paid faster online",
        )
        .unwrap();
    assert!(reason.to_string().contains("InvoiceFlow"), "reason: {}", reason);
}

#[test]
fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut tracker = open(&dir);
        tracker.add_idea("Widget", "A new kind of widget", IdeaType::Extension, 70).unwrap();
    }

    let tracker = open(&dir);
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.ideas()[0].idea_type, "Extension");
    assert!(tracker.is_duplicate("WIDGET", "different").is_some());
}

#[test]
fn test_history_keeps_most_recent_thousand() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = open(&dir);

    for i in 0..=MAX_TRACKED_IDEAS {
        tracker
            .add_idea(&format!("idea-{}", i), &format!("description {}", i), IdeaType::SaaS, 50)
            .unwrap();
    }

    assert_eq!(tracker.len(), MAX_TRACKED_IDEAS);
    assert_eq!(tracker.names().len(), MAX_TRACKED_IDEAS);
    assert_eq!(tracker.names()[0], "idea-1");
    assert_eq!(tracker.names()[MAX_TRACKED_IDEAS - 1], format!("idea-{}", MAX_TRACKED_IDEAS));
    assert_eq!(tracker.ideas()[0].name, "idea-1");

    let reopened = open(&dir);
    assert_eq!(reopened.len(), MAX_TRACKED_IDEAS);
    assert_eq!(reopened.names().len(), MAX_TRACKED_IDEAS);
    assert_eq!(reopened.names()[0], "idea-1");
}
