use schedule_cell::models::SemanticStatus;
use schedule_cell::services::status::StatusTranslator;

#[test]
fn test_persisted_aliases_collapse_to_one_status() {
    let translator = StatusTranslator::default();

    assert_eq!(translator.to_semantic("Trống"), SemanticStatus::Available);
    assert_eq!(translator.to_semantic("Còn trống"), SemanticStatus::Available);
    assert_eq!(translator.to_semantic("  đã hủy "), SemanticStatus::Cancelled);
    assert_eq!(translator.to_semantic("Chờ thanh toán"), SemanticStatus::PendingPayment);
}

#[test]
fn test_booked_round_trip_is_lossy() {
    let translator = StatusTranslator::default();

    let persisted = translator.to_persisted(&SemanticStatus::Booked);
    assert_eq!(persisted, "Đang hoạt động");

    // Both claimed names share one label, so the way back lands on Active.
    let back = translator.to_semantic(&persisted);
    assert_eq!(back, SemanticStatus::Active);
    assert_ne!(back, SemanticStatus::Booked);
    assert!(back.is_claimed());
}

#[test]
fn test_unmapped_values_pass_through() {
    let translator = StatusTranslator::default();

    let status = translator.to_semantic("Tạm ngưng");
    assert_eq!(status, SemanticStatus::Unknown("Tạm ngưng".to_string()));
    assert_eq!(translator.to_persisted(&status), "Tạm ngưng");

    // Semantic names are accepted directly.
    assert_eq!(translator.to_semantic("confirmed"), SemanticStatus::Confirmed);
}

#[test]
fn test_registered_alias_extends_forward_table_only() {
    let mut translator = StatusTranslator::new();
    translator.register_persisted("Open", SemanticStatus::Available);

    assert_eq!(translator.to_semantic("open"), SemanticStatus::Available);
    assert_eq!(translator.to_persisted(&SemanticStatus::Available), "Trống");
}

#[test]
fn test_lifecycle_transitions() {
    use SemanticStatus::*;

    assert!(Available.can_transition_to(&Booked));
    assert!(Booked.can_transition_to(&PendingPayment));
    assert!(PendingPayment.can_transition_to(&Confirmed));
    assert!(Confirmed.can_transition_to(&Completed));
    assert!(Active.can_transition_to(&Cancelled));

    assert!(!Available.can_transition_to(&Completed));
    assert!(!Completed.can_transition_to(&Available));
    assert!(!Cancelled.can_transition_to(&Booked));
    assert!(!Available.can_transition_to(&Unknown("x".to_string())));

    // A record with an unrecognised status can be repaired.
    assert!(Unknown("Tạm ngưng".to_string()).can_transition_to(&Available));
}
