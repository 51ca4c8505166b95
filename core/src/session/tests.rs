use std::time::{Duration, Instant};

use aurafx_shared::{
    BehaviorLayer, BehaviorParams, EffectDefinition, EffectId, MAX_LAYERS, MovementKind,
    PlacementLayer, PlacementParams, Rarity,
};

use super::*;
use crate::catalog::{Catalog, LegacyCatalog};
use crate::config::PreviewConfig;
use crate::resolver::{EffectRef, Origin, Resolver};
use crate::sync::{ChangeKind, SyncClient, SyncMessage};

fn id(s: &str) -> EffectId {
    EffectId::parse(s).unwrap()
}

fn layered(name: &str) -> EffectDefinition {
    EffectDefinition::new(id(name)).with_layer(BehaviorLayer::default(), PlacementLayer::default())
}

/// Viewer with one built-in and one authored definition
fn client() -> SyncClient {
    let mut registry = Registry::new();
    registry.apply_builtins(vec![layered("shipped")]);
    registry.apply_authored_snapshot(vec![layered("mine")]);
    SyncClient::new(registry, Catalog::new())
}

fn sent(client: &mut SyncClient) -> Vec<SyncMessage> {
    client
        .drain_outgoing()
        .iter()
        .map(|frame| SyncMessage::from_bytes(frame).unwrap())
        .collect()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =============================================================
// Debounce
// =============================================================

#[test]
fn test_burst_of_edits_rebuilds_once() {
    let client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    let t0 = Instant::now();
    for (i, offset) in [0, 6, 12, 18, 24].into_iter().enumerate() {
        session
            .mutate_field(
                FieldEdit::Behavior {
                    layer: 0,
                    edit: BehaviorEdit::Size(1.0 + i as f32),
                },
                t0 + ms(offset),
            )
            .unwrap();
    }
    let last = t0 + ms(24);

    let mut rebuilds = Vec::new();
    for step in 0..400 {
        let now = t0 + ms(step);
        if session.tick(now) {
            rebuilds.push(now);
        }
    }

    assert_eq!(rebuilds.len(), 1);
    assert!(rebuilds[0] >= last + ms(100));
    assert!(!session.preview_pending());
}

#[test]
fn test_rebuild_uses_latest_working_copy() {
    let client = client();
    let mut session = EditingSession::new(ms(50));
    session.select(client.registry(), &id("mine")).unwrap();

    let t0 = Instant::now();
    session
        .mutate_field(
            FieldEdit::Placement {
                layer: 0,
                edit: PlacementEdit::Radius(2.0),
            },
            t0,
        )
        .unwrap();
    session
        .mutate_field(
            FieldEdit::Placement {
                layer: 0,
                edit: PlacementEdit::Radius(3.0),
            },
            t0 + ms(10),
        )
        .unwrap();

    assert!(!session.tick(t0 + ms(59)));
    assert!(session.preview_override(&id("mine")).is_none());
    assert!(session.tick(t0 + ms(60)));

    let preview = session.preview_override(&id("mine")).unwrap();
    assert_eq!(preview.placement_layers()[0].radius(), 3.0);
}

#[test]
fn test_debounce_from_config() {
    let session = EditingSession::from_config(&PreviewConfig { debounce_ms: 250 });
    assert_eq!(session.debounce(), ms(250));
    assert_eq!(EditingSession::default().debounce(), DEFAULT_PREVIEW_DEBOUNCE);
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn test_select_edit_save() {
    let mut client = client();
    let mut session = EditingSession::default();
    assert_eq!(session.state(), SessionState::Idle);

    session.select(client.registry(), &id("mine")).unwrap();
    assert_eq!(session.state(), SessionState::Clean);
    assert!(!session.dirty());
    assert_eq!(session.save(&mut client), Err(SessionError::NothingToSave));

    session
        .mutate_field(
            FieldEdit::Behavior {
                layer: 0,
                edit: BehaviorEdit::Movement(MovementKind::Swirl),
            },
            Instant::now(),
        )
        .unwrap();
    assert_eq!(session.state(), SessionState::Dirty);
    assert!(session.dirty());

    assert_eq!(session.save(&mut client), Ok(SaveOutcome::Updated));
    assert_eq!(session.state(), SessionState::Clean);
    assert_eq!(session.snapshot(), session.working());
    assert_eq!(
        client.registry().get(&id("mine")).unwrap().behavior_layers()[0].movement(),
        MovementKind::Swirl
    );

    let messages = sent(&mut client);
    assert!(matches!(
        &messages[..],
        [SyncMessage::DefinitionChange(change)]
            if change.kind == ChangeKind::Update && change.id == "aurafx:mine" && change.body.is_some()
    ));
}

#[test]
fn test_new_definition_saves_as_create() {
    let mut client = client();
    let mut session = EditingSession::default();

    session.begin_new(client.registry(), id("fresh")).unwrap();
    assert!(session.is_new());
    assert!(session.dirty());

    session
        .mutate_field(FieldEdit::AddLayer, Instant::now())
        .unwrap();
    assert_eq!(session.state(), SessionState::New);

    assert_eq!(session.save(&mut client), Ok(SaveOutcome::Created));
    assert_eq!(session.state(), SessionState::Clean);
    assert!(client.registry().is_authored(&id("fresh")));

    let messages = sent(&mut client);
    assert!(matches!(
        &messages[..],
        [SyncMessage::DefinitionChange(change)] if change.kind == ChangeKind::Create
    ));
}

#[test]
fn test_begin_new_rejects_existing_ids() {
    let client = client();
    let mut session = EditingSession::default();
    assert_eq!(
        session.begin_new(client.registry(), id("shipped")),
        Err(SessionError::AlreadyExists(id("shipped")))
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_select_unknown_id() {
    let client = client();
    let mut session = EditingSession::default();
    assert_eq!(
        session.select(client.registry(), &id("ghost")),
        Err(SessionError::NotFound(id("ghost")))
    );
}

#[test]
fn test_idle_session_refuses_work() {
    let mut client = client();
    let mut session = EditingSession::default();
    let now = Instant::now();

    assert_eq!(
        session.mutate_field(FieldEdit::AddLayer, now),
        Err(SessionError::NothingSelected)
    );
    assert_eq!(session.save(&mut client), Err(SessionError::NothingSelected));
    assert_eq!(session.revert(), Err(SessionError::NothingSelected));
    assert_eq!(session.delete(&mut client), Err(SessionError::NothingSelected));
    assert!(!session.tick(now));
}

#[test]
fn test_revert_restores_snapshot() {
    let client = client();
    let mut session = EditingSession::new(ms(10));
    session.select(client.registry(), &id("mine")).unwrap();
    let original = session.working().cloned();

    let t0 = Instant::now();
    session
        .mutate_field(FieldEdit::AddLayer, t0)
        .unwrap();
    assert!(session.tick(t0 + ms(10)));
    assert!(session.preview_override(&id("mine")).is_some());

    session.revert().unwrap();
    assert_eq!(session.state(), SessionState::Clean);
    assert_eq!(session.working().cloned(), original);
    assert!(session.preview_override(&id("mine")).is_none());
}

#[test]
fn test_revert_abandons_new_definition() {
    let client = client();
    let mut session = EditingSession::default();
    session.begin_new(client.registry(), id("draft")).unwrap();
    session.revert().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.working().is_none());
}

#[test]
fn test_delete_builtin_is_refused() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("shipped")).unwrap();

    assert_eq!(
        session.delete(&mut client),
        Err(SessionError::Registry(RegistryError::Permission(id("shipped"))))
    );
    assert!(client.registry().contains(&id("shipped")));
    assert_eq!(session.state(), SessionState::Clean);
    assert!(sent(&mut client).is_empty());
}

#[test]
fn test_delete_authored() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    session.delete(&mut client).unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!client.registry().contains(&id("mine")));

    let messages = sent(&mut client);
    assert!(matches!(
        &messages[..],
        [SyncMessage::DeleteRequest(request)] if request.id == "aurafx:mine"
    ));
}

#[test]
fn test_delete_unsaved_definition() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.begin_new(client.registry(), id("draft")).unwrap();
    assert_eq!(
        session.delete(&mut client),
        Err(SessionError::NotFound(id("draft")))
    );
}

#[test]
fn test_edit_errors_leave_session_untouched() {
    let client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    let result = session.mutate_field(
        FieldEdit::Behavior {
            layer: 5,
            edit: BehaviorEdit::Speed(2.0),
        },
        Instant::now(),
    );
    assert_eq!(
        result,
        Err(SessionError::LayerOutOfRange { index: 5, count: 1 })
    );
    assert_eq!(session.state(), SessionState::Clean);
    assert!(!session.preview_pending());
}

#[test]
fn test_layer_limit() {
    let client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    let now = Instant::now();
    for _ in 1..MAX_LAYERS {
        session.mutate_field(FieldEdit::AddLayer, now).unwrap();
    }
    assert_eq!(session.working().unwrap().layer_count(), MAX_LAYERS);
    assert_eq!(
        session.mutate_field(FieldEdit::AddLayer, now),
        Err(SessionError::LayerLimit { max: MAX_LAYERS })
    );
}

#[test]
fn test_mutate_with_keeps_id_and_repairs() {
    let client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    session
        .mutate_with(
            |def| {
                let swirl = BehaviorLayer::new(BehaviorParams {
                    movement: MovementKind::Swirl,
                    ..Default::default()
                });
                let (mut behavior, _) = def.into_layers();
                behavior.push(swirl);
                EffectDefinition::new(id("renamed")).with_behavior_layers(behavior)
            },
            Instant::now(),
        )
        .unwrap();

    let working = session.working().unwrap();
    assert_eq!(working.id(), &id("mine"));
    assert!(working.is_paired());
    assert_eq!(working.layer_count(), 2);
}

// =============================================================
// Preview and resolution
// =============================================================

#[test]
fn test_live_preview_through_resolver() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();
    session
        .mutate_field(
            FieldEdit::Placement {
                layer: 0,
                edit: PlacementEdit::Count(12),
            },
            Instant::now(),
        )
        .unwrap();

    let legacy = LegacyCatalog::new();
    let reference = EffectRef::Definition(id("mine"));
    {
        let resolver =
            Resolver::new(client.registry(), client.catalog(), &legacy).with_preview(&session);
        assert_eq!(resolver.resolve(&reference).origin(), Some(Origin::Authored));
    }

    session.set_preview_mode(true, &mut client);
    {
        let resolver =
            Resolver::new(client.registry(), client.catalog(), &legacy).with_preview(&session);
        let resolution = resolver.resolve(&reference);
        assert_eq!(resolution.origin(), Some(Origin::PreviewSession));
        assert_eq!(resolution.placement_layers()[0].count(), 12);
    }

    // Toggling to the current mode sends nothing
    session.set_preview_mode(true, &mut client);
    let messages = sent(&mut client);
    assert!(matches!(
        &messages[..],
        [SyncMessage::PreviewToggle(toggle)]
            if toggle.enable && toggle.target.as_deref() == Some("aurafx:mine")
    ));
}

#[test]
fn test_preview_override_wins_over_live_preview() {
    let mut client = client();
    let mut session = EditingSession::new(ms(10));
    session.select(client.registry(), &id("mine")).unwrap();
    session.set_preview_mode(true, &mut client);

    let t0 = Instant::now();
    session
        .mutate_field(FieldEdit::AddLayer, t0)
        .unwrap();
    assert!(session.tick(t0 + ms(10)));

    let legacy = LegacyCatalog::new();
    let reference = EffectRef::Definition(id("mine"));
    let resolver =
        Resolver::new(client.registry(), client.catalog(), &legacy).with_preview(&session);
    let resolution = resolver.resolve(&reference);
    assert_eq!(resolution.origin(), Some(Origin::PreviewOverride));
    assert_eq!(resolution.definition().unwrap().layer_count(), 2);
}

#[test]
fn test_save_hands_resolution_back_to_registry() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    let t0 = Instant::now();
    session
        .mutate_field(
            FieldEdit::Placement {
                layer: 0,
                edit: PlacementEdit::Radius(3.0),
            },
            t0,
        )
        .unwrap();
    assert!(session.tick(t0 + ms(200)));
    assert!(session.preview_override(&id("mine")).is_some());

    session.save(&mut client).unwrap();
    assert!(session.preview_override(&id("mine")).is_none());
    assert!(!session.preview_pending());

    // An authoritative snapshot disagrees with what this node saved
    let remote = EffectDefinition::new(id("mine")).with_layer(
        BehaviorLayer::default(),
        PlacementLayer::new(PlacementParams {
            radius: 7.0,
            ..Default::default()
        }),
    );
    client.registry_mut().apply_authored_snapshot(vec![remote]);

    let legacy = LegacyCatalog::new();
    let resolver =
        Resolver::new(client.registry(), client.catalog(), &legacy).with_preview(&session);
    let effect_ref = EffectRef::Definition(id("mine"));
    let resolution = resolver.resolve(&effect_ref);
    assert_eq!(resolution.origin(), Some(Origin::Authored));
    assert_eq!(resolution.placement_layers()[0].radius(), 7.0);
}

#[test]
fn test_close_drops_pending_rebuild() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();
    session.set_preview_mode(true, &mut client);

    let t0 = Instant::now();
    session
        .mutate_field(FieldEdit::AddLayer, t0)
        .unwrap();
    session.close();

    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.preview_mode());
    assert!(!session.tick(t0 + ms(500)));
    assert!(session.live_preview(&id("mine")).is_none());
}

// =============================================================
// Publishing
// =============================================================

#[test]
fn test_publish_requires_clean_saved_definition() {
    let mut client = client();
    let mut session = EditingSession::default();
    let listing = Listing::new(id("shop/mine"), "Mine");

    session.begin_new(client.registry(), id("draft")).unwrap();
    assert!(matches!(
        session.publish(&mut client, listing.clone()),
        Err(SessionError::Unpublishable { reason: "never saved", .. })
    ));

    session.select(client.registry(), &id("mine")).unwrap();
    session
        .mutate_field(
            FieldEdit::Metadata(MetadataEdit::DisplayName(Some("Mine".to_string()))),
            Instant::now(),
        )
        .unwrap();
    assert!(matches!(
        session.publish(&mut client, listing),
        Err(SessionError::Unpublishable { reason: "unsaved changes", .. })
    ));
}

#[test]
fn test_publish_sends_entry() {
    let mut client = client();
    let mut session = EditingSession::default();
    session.select(client.registry(), &id("mine")).unwrap();

    let mut listing = Listing::new(id("shop/mine"), "Mine");
    listing.rarity = Some(Rarity::Epic);
    listing.price = Some(250);

    let entry = session.publish(&mut client, listing).unwrap();
    assert_eq!(entry.definition_ref, id("mine"));
    assert_eq!(client.catalog().get(&id("shop/mine")), Some(&entry));

    let messages = sent(&mut client);
    assert!(matches!(
        &messages[..],
        [SyncMessage::PublishRequest(request)]
            if request.entry.definition_ref == "aurafx:mine"
                && request.entry.rarity.as_deref() == Some("epic")
    ));
}
