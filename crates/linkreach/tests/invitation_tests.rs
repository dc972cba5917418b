//! Loading and answering received invitations against scripted pages.

use std::time::Duration;

use linkreach::batch::CancelFlag;
use linkreach::config::InvitationsConfig;
use linkreach::invitations::{InvitationDecision, InvitationManager, InvitationOutcome};
use linkreach::testing::{invitations_page, InvitationCard, ScriptedDriver};

fn driver_with(config: &InvitationsConfig, cards: &[InvitationCard]) -> ScriptedDriver {
    ScriptedDriver::new().with_page(&config.url, invitations_page(&config.locators, cards))
}

fn names(cards: usize) -> Vec<InvitationCard> {
    (0..cards)
        .map(|i| InvitationCard::new(i, &format!("Inviter {}", i)))
        .collect()
}

#[test]
fn test_lazily_loaded_cards_are_scrolled_in() {
    let config = InvitationsConfig::default();
    let cards = vec![
        InvitationCard::new(0, "Ada"),
        InvitationCard::new(1, "Alan"),
        InvitationCard::new(2, "Grace"),
        InvitationCard::new(3, "Edsger").after_scrolls(1),
        InvitationCard::new(4, "Barbara").after_scrolls(1),
        InvitationCard::new(5, "Donald").after_scrolls(2),
    ];
    let mut driver = driver_with(&config, &cards);
    let manager = InvitationManager::from_config(&config);

    let invitations = manager.load(&mut driver).unwrap();

    let loaded: Vec<&str> = invitations.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(loaded, vec!["Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald"]);
    assert_eq!(driver.bottom_scrolls(), 3);
}

#[test]
fn test_empty_page_has_no_invitations() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &[]);
    let manager = InvitationManager::from_config(&config);

    let invitations = manager.load(&mut driver).unwrap();

    assert!(invitations.is_empty());
    assert_eq!(driver.bottom_scrolls(), 0);
    assert!(driver.elapsed() >= config.load_timeout());
}

#[test]
fn test_unreachable_page_is_an_error() {
    let config = InvitationsConfig::default();
    let mut driver = ScriptedDriver::new().unreachable(&config.url);
    let manager = InvitationManager::from_config(&config);

    assert!(manager.load(&mut driver).is_err());
}

#[test]
fn test_cards_without_name_are_left_out() {
    let config = InvitationsConfig::default();
    let cards = vec![
        InvitationCard::new(0, "Ada"),
        InvitationCard::new(1, ""),
        InvitationCard::new(2, "Grace").name_only_in_label(),
    ];
    let mut driver = driver_with(&config, &cards);
    let manager = InvitationManager::from_config(&config);

    let invitations = manager.load(&mut driver).unwrap();

    let loaded: Vec<&str> = invitations.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(loaded, vec!["Ada", "Grace"]);
}

#[test]
fn test_details_are_extracted() {
    let config = InvitationsConfig::default();
    let cards = vec![InvitationCard::new(0, "Ada Lovelace")
        .headline("Analyst at Engines Ltd")
        .mutual("Charles Babbage is a mutual connection")
        .sent("Yesterday")
        .follows_you()];
    let mut driver = driver_with(&config, &cards);
    let manager = InvitationManager::from_config(&config);

    let invitation = manager.load(&mut driver).unwrap().remove(0);

    assert_eq!(invitation.headline.as_deref(), Some("Analyst at Engines Ltd"));
    assert_eq!(
        invitation.mutual_connections.as_deref(),
        Some("Charles Babbage is a mutual connection")
    );
    assert_eq!(invitation.time_sent.as_deref(), Some("Yesterday"));
    assert_eq!(
        invitation.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/inviter-0")
    );
    assert!(invitation.follows_you);
    assert!(!invitation.is_verified);
}

fn ada() -> InvitationCard {
    InvitationCard::new(0, "Ada")
}

fn ada_with_broken_accept() -> InvitationCard {
    InvitationCard::new(0, "Ada").failing_accept()
}

/// Represents one single-invitation answer case.
struct RespondTestCase {
    name: &'static str,
    card: fn() -> InvitationCard,
    decision: InvitationDecision,
    expected: InvitationOutcome,
    expected_clicks: &'static [&'static str],
}

const RESPOND_TESTS: &[RespondTestCase] = &[
    RespondTestCase {
        name: "accept",
        card: ada,
        decision: InvitationDecision::Accept,
        expected: InvitationOutcome::Accepted,
        expected_clicks: &["accept-0"],
    },
    RespondTestCase {
        name: "ignore",
        card: ada,
        decision: InvitationDecision::Ignore,
        expected: InvitationOutcome::Ignored,
        expected_clicks: &["ignore-0"],
    },
    RespondTestCase {
        name: "skip",
        card: ada,
        decision: InvitationDecision::Skip,
        expected: InvitationOutcome::Skipped,
        expected_clicks: &[],
    },
    RespondTestCase {
        name: "broken_accept_button",
        card: ada_with_broken_accept,
        decision: InvitationDecision::Accept,
        expected: InvitationOutcome::Failed,
        expected_clicks: &[],
    },
    RespondTestCase {
        name: "ignore_still_works_when_accept_is_broken",
        card: ada_with_broken_accept,
        decision: InvitationDecision::Ignore,
        expected: InvitationOutcome::Ignored,
        expected_clicks: &["ignore-0"],
    },
];

#[test]
fn test_respond_outcomes() {
    let config = InvitationsConfig::default();
    let manager = InvitationManager::from_config(&config);

    for case in RESPOND_TESTS {
        let mut driver = driver_with(&config, &[(case.card)()]);
        let invitation = manager.load(&mut driver).unwrap().remove(0);

        let outcome = manager.respond(&mut driver, &invitation, case.decision);

        assert_eq!(outcome, case.expected, "case {}", case.name);
        let clicks: Vec<&str> = driver.clicked().iter().map(String::as_str).collect();
        assert_eq!(clicks, case.expected_clicks, "case {}", case.name);
    }
}

#[test]
fn test_answered_card_cannot_be_answered_again() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &names(1));
    let manager = InvitationManager::from_config(&config);
    let invitation = manager.load(&mut driver).unwrap().remove(0);

    assert_eq!(
        manager.respond(&mut driver, &invitation, InvitationDecision::Accept),
        InvitationOutcome::Accepted
    );
    assert_eq!(
        manager.respond(&mut driver, &invitation, InvitationDecision::Ignore),
        InvitationOutcome::Failed
    );
}

#[test]
fn test_accept_all_answers_every_card() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &names(3));
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();

    let report = manager.review(&mut driver, &invitations, &CancelFlag::new(), |_, _, _| {
        Some(InvitationDecision::Accept)
    });

    assert_eq!(report.accepted, 3);
    assert_eq!(report.remaining, 0);
    assert!(!report.interrupted);
    let clicks: Vec<&str> = driver.clicked().iter().map(String::as_str).collect();
    assert_eq!(clicks, vec!["accept-0", "accept-1", "accept-2"]);
}

#[test]
fn test_failed_answer_is_counted_and_review_continues() {
    let config = InvitationsConfig::default();
    let cards = vec![
        InvitationCard::new(0, "Ada").failing_accept(),
        InvitationCard::new(1, "Alan"),
    ];
    let mut driver = driver_with(&config, &cards);
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();

    let report = manager.review(&mut driver, &invitations, &CancelFlag::new(), |_, _, _| {
        Some(InvitationDecision::Accept)
    });

    assert_eq!((report.accepted, report.failed), (1, 1));
    assert_eq!(report.answered[0].outcome, InvitationOutcome::Failed);
    assert_eq!(report.answered[0].name, "Ada");
    assert_eq!(report.answered[1].outcome, InvitationOutcome::Accepted);
}

#[test]
fn test_stop_leaves_the_rest_unanswered() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &names(3));
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();

    let mut seen = Vec::new();
    let report = manager.review(&mut driver, &invitations, &CancelFlag::new(), |_, position, total| {
        seen.push((position, total));
        (position == 1).then_some(InvitationDecision::Ignore)
    });

    assert_eq!(seen, vec![(1, 3), (2, 3)]);
    assert_eq!(report.ignored, 1);
    assert_eq!(report.answered.len(), 1);
    assert_eq!(report.remaining, 2);
    assert!(!report.interrupted);
}

#[test]
fn test_cancel_stops_before_next_invitation() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &names(3));
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();

    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let report = manager.review(&mut driver, &invitations, &cancel, move |_, _, _| {
        flag.cancel();
        Some(InvitationDecision::Accept)
    });

    assert!(report.interrupted);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.remaining, 2);
}

#[test]
fn test_answers_are_spaced_out() {
    let config = InvitationsConfig {
        after_action_ms: 2_000,
        between_actions_ms: 3_000,
        ..InvitationsConfig::default()
    };
    let mut driver = driver_with(&config, &names(2));
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();
    let loaded_at = driver.elapsed();

    manager.review(&mut driver, &invitations, &CancelFlag::new(), |_, _, _| {
        Some(InvitationDecision::Ignore)
    });

    assert_eq!(driver.elapsed() - loaded_at, Duration::from_millis(7_000));
}

#[test]
fn test_skips_are_not_spaced_out() {
    let config = InvitationsConfig::default();
    let mut driver = driver_with(&config, &names(3));
    let manager = InvitationManager::from_config(&config);
    let invitations = manager.load(&mut driver).unwrap();
    let loaded_at = driver.elapsed();

    let report = manager.review(&mut driver, &invitations, &CancelFlag::new(), |_, _, _| {
        Some(InvitationDecision::Skip)
    });

    assert_eq!(report.skipped, 3);
    assert_eq!(driver.elapsed(), loaded_at);
    assert!(driver.clicked().is_empty());
}
