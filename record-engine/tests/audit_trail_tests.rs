use std::sync::Arc;

use event_fanout::{ChangeFanout, EntityKind, Operation, Subscription};
use record_engine::{
    AuditAction, DisasterPatch, GeoMatcher, NewDisaster, NewReport, NewResource, RecordService,
    ReportPatch, VerificationStatus,
};
use store_layer::{GeoPoint, MemoryStore};
use uuid::Uuid;

struct Harness {
    service: RecordService,
    matcher: GeoMatcher,
    events: Subscription,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let fanout = Arc::new(ChangeFanout::default());
    let events = fanout.subscribe();
    Harness {
        service: RecordService::new(store.clone(), fanout),
        matcher: GeoMatcher::new(store),
        events,
    }
}

fn flood(title: &str) -> NewDisaster {
    NewDisaster {
        title: Some(title.to_string()),
        location: Some(GeoPoint { lat: 40.7, lng: -74.0 }),
        description: Some("river burst its banks".to_string()),
        tags: vec!["flood".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn every_mutation_appends_exactly_one_audit_entry() {
    let mut h = harness();
    let created = h
        .service
        .create_disaster(flood("Flood A"), "citizen1")
        .await
        .unwrap();
    assert_eq!(created.audit_trail.len(), 1);

    let mut latest = created.clone();
    for n in 2..=4 {
        latest = h
            .service
            .update_disaster(
                created.id,
                DisasterPatch {
                    description: Some(format!("update {n}")),
                    ..Default::default()
                },
                "reliefAdmin",
            )
            .await
            .unwrap();
        assert_eq!(latest.audit_trail.len(), n);
    }

    // Oldest first, never reordered.
    assert_eq!(latest.audit_trail[0].action, AuditAction::Create);
    assert!(latest.audit_trail[1..]
        .iter()
        .all(|e| e.action == AuditAction::Update));
    assert!(latest
        .audit_trail
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn flood_a_scenario() {
    let mut h = harness();
    let created = h
        .service
        .create_disaster(flood("Flood A"), "citizen1")
        .await
        .unwrap();
    assert_eq!(created.audit_trail[0].action, AuditAction::Create);
    assert_eq!(created.audit_trail[0].actor_id, "citizen1");

    let updated = h
        .service
        .update_disaster(
            created.id,
            DisasterPatch {
                title: Some("Flood A - Updated".to_string()),
                ..Default::default()
            },
            "reliefAdmin",
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Flood A - Updated");
    // Partial update: everything not in the patch is untouched.
    assert_eq!(updated.location, created.location);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.tags, created.tags);

    assert_eq!(updated.audit_trail.len(), 2);
    assert_eq!(updated.audit_trail[0].actor_id, "citizen1");
    assert_eq!(updated.audit_trail[1].action, AuditAction::Update);
    assert_eq!(updated.audit_trail[1].actor_id, "reliefAdmin");

    // The create event and then an update event with the new title but the
    // original location.
    let create_event = h.events.recv().await.unwrap();
    assert_eq!(create_event.operation, Operation::Create);
    let update_event = h.events.recv().await.unwrap();
    assert_eq!(update_event.entity_kind, EntityKind::Disaster);
    assert_eq!(update_event.operation, Operation::Update);
    assert_eq!(update_event.payload["title"], "Flood A - Updated");
    assert_eq!(update_event.payload["location"]["lat"], 40.7);
}

#[tokio::test]
async fn delete_is_observable_and_event_carries_final_trail() {
    let mut h = harness();
    let created = h
        .service
        .create_disaster(flood("Flood B"), "citizen1")
        .await
        .unwrap();
    h.service
        .delete_disaster(created.id, "netrunnerX")
        .await
        .unwrap();

    assert!(h.service.get_disaster(created.id).await.is_err());

    let _create = h.events.recv().await.unwrap();
    let delete_event = h.events.recv().await.unwrap();
    assert_eq!(delete_event.operation, Operation::Delete);

    // The payload is the full final entity snapshot, not just the id.
    assert_eq!(delete_event.payload["id"], created.id.to_string());
    assert_eq!(delete_event.payload["title"], "Flood B");
    assert_eq!(delete_event.payload["location"]["lat"], 40.7);
    assert_eq!(delete_event.payload["tags"][0], "flood");

    let trail = delete_event.payload["audit_trail"].as_array().unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0]["action"], "create");
    assert_eq!(trail[1]["action"], "delete");
    assert_eq!(trail[1]["actor_id"], "netrunnerX");
}

#[tokio::test]
async fn create_validates_required_fields() {
    let h = harness();
    let err = h
        .service
        .create_disaster(NewDisaster::default(), "citizen1")
        .await
        .unwrap_err();
    assert!(err.is_client_fault(), "expected validation error, got {err}");

    let err = h
        .service
        .create_report(
            NewReport {
                content: Some("water rising".to_string()),
                ..Default::default()
            },
            "citizen1",
        )
        .await
        .unwrap_err();
    assert!(err.is_client_fault());

    let err = h
        .service
        .create_resource(
            NewResource {
                disaster_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
            "reliefAdmin",
        )
        .await
        .unwrap_err();
    assert!(err.is_client_fault());
}

#[tokio::test]
async fn update_of_missing_entity_is_not_found() {
    let h = harness();
    let err = h
        .service
        .update_disaster(Uuid::new_v4(), DisasterPatch::default(), "citizen1")
        .await
        .unwrap_err();
    assert!(matches!(err, error_common::ReliefError::NotFound(_)));

    let err = h
        .service
        .delete_disaster(Uuid::new_v4(), "citizen1")
        .await
        .unwrap_err();
    assert!(matches!(err, error_common::ReliefError::NotFound(_)));
}

#[tokio::test]
async fn verification_status_survives_unrelated_updates() {
    let h = harness();
    let disaster = h
        .service
        .create_disaster(flood("Flood C"), "citizen1")
        .await
        .unwrap();
    let report = h
        .service
        .create_report(
            NewReport {
                disaster_id: Some(disaster.id),
                content: Some("need food in NYC".to_string()),
                image_url: None,
            },
            "citizen2",
        )
        .await
        .unwrap();
    assert_eq!(report.verification_status, VerificationStatus::Pending);

    let verified = h
        .service
        .update_report(
            report.id,
            ReportPatch {
                verification_status: Some(VerificationStatus::Verified),
                ..Default::default()
            },
            "reliefAdmin",
        )
        .await
        .unwrap();
    assert_eq!(verified.verification_status, VerificationStatus::Verified);

    // A content-only update must not reset the status.
    let edited = h
        .service
        .update_report(
            report.id,
            ReportPatch {
                content: Some("need food and water in NYC".to_string()),
                ..Default::default()
            },
            "citizen2",
        )
        .await
        .unwrap();
    assert_eq!(edited.verification_status, VerificationStatus::Verified);
    assert_eq!(edited.audit_trail.len(), 3);
}

#[tokio::test]
async fn listings_filter_and_order_newest_first() {
    let h = harness();
    let flood_a = h
        .service
        .create_disaster(flood("Flood A"), "citizen1")
        .await
        .unwrap();
    let quake = h
        .service
        .create_disaster(
            NewDisaster {
                title: Some("Quake".to_string()),
                tags: vec!["earthquake".to_string()],
                ..Default::default()
            },
            "citizen2",
        )
        .await
        .unwrap();

    let all = h.service.list_disasters(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, quake.id, "newest first");

    let floods = h.service.list_disasters(Some("flood")).await.unwrap();
    assert_eq!(floods.len(), 1);
    assert_eq!(floods[0].id, flood_a.id);

    for content in ["first", "second"] {
        h.service
            .create_report(
                NewReport {
                    disaster_id: Some(flood_a.id),
                    content: Some(content.to_string()),
                    image_url: None,
                },
                "citizen1",
            )
            .await
            .unwrap();
    }
    let pending = h
        .service
        .list_reports(Some(flood_a.id), Some(VerificationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].content, "second");

    let none = h
        .service
        .list_reports(Some(quake.id), None)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn nearby_respects_radius_and_disaster_scope() {
    let h = harness();
    let disaster = h
        .service
        .create_disaster(flood("Flood D"), "citizen1")
        .await
        .unwrap();
    let other = h
        .service
        .create_disaster(flood("Flood E"), "citizen1")
        .await
        .unwrap();

    let center = GeoPoint { lat: 40.7, lng: -74.0 };
    let spots = [
        ("close shelter", disaster.id, 40.705, -74.0),
        ("far shelter", disaster.id, 41.5, -74.0),
        ("other disaster shelter", other.id, 40.7, -74.0),
    ];
    for (name, did, lat, lng) in spots {
        h.service
            .create_resource(
                NewResource {
                    disaster_id: Some(did),
                    name: Some(name.to_string()),
                    location: Some(GeoPoint { lat, lng }),
                    ..Default::default()
                },
                "reliefAdmin",
            )
            .await
            .unwrap();
    }

    let nearby = h.matcher.nearby(disaster.id, center, 10_000.0).await.unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].name, "close shelter");
    for resource in &nearby {
        assert_eq!(resource.disaster_id, disaster.id);
        let distance = resource.location.unwrap().distance_m(&center);
        assert!(distance <= 10_000.0);
    }

    let err = h
        .matcher
        .nearby(disaster.id, GeoPoint { lat: 95.0, lng: 0.0 }, 10_000.0)
        .await
        .unwrap_err();
    assert!(err.is_client_fault());

    let err = h
        .matcher
        .nearby(disaster.id, center, -5.0)
        .await
        .unwrap_err();
    assert!(err.is_client_fault());
}
