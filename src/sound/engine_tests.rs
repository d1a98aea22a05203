use super::*;
use crate::sound::backend::{SimulatedBackend, SoundBackend};
use crate::sound::channel::ChannelResource;
use crate::storage::MemoryStore;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

struct Harness {
    backend: Arc<SimulatedBackend>,
    store: Arc<MemoryStore>,
    engine: BackgroundSoundEngine,
}

fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
    let backend = Arc::new(SimulatedBackend::new());
    let registry = Arc::new(SoundChannelRegistry::new(backend.clone()));
    let engine = BackgroundSoundEngine::new(registry, store.clone(), &AppConfig::ephemeral());
    Harness {
        backend,
        store,
        engine,
    }
}

fn harness() -> Harness {
    harness_with_store(Arc::new(MemoryStore::new()))
}

impl Harness {
    fn playing(&self) -> Vec<ChannelName> {
        self.engine.registry().playing().unwrap()
    }
}

#[test]
fn test_default_volume_without_record() {
    let h = harness();
    let state = h.engine.snapshot().unwrap();
    assert_eq!(state.volume, 0.5);
    assert_eq!(state.active_channel, None);
}

#[test]
fn test_persisted_volume_is_restored() {
    let h = harness_with_store(Arc::new(MemoryStore::with_entries([(
        "backgroundSoundVolume",
        "0.35",
    )])));
    assert_eq!(h.engine.snapshot().unwrap().volume, 0.35);
}

#[test]
fn test_unparsable_volume_record_falls_back() {
    let h = harness_with_store(Arc::new(MemoryStore::with_entries([(
        "backgroundSoundVolume",
        "loud",
    )])));
    assert_eq!(h.engine.snapshot().unwrap().volume, 0.5);
}

#[test]
fn test_out_of_range_volume_record_is_clamped() {
    let h = harness_with_store(Arc::new(MemoryStore::with_entries([(
        "backgroundSoundVolume",
        "3.5",
    )])));
    assert_eq!(h.engine.snapshot().unwrap().volume, 1.0);
}

#[test]
fn test_play_starts_single_channel() {
    let h = harness();
    let state = h.engine.play(Some("rain")).unwrap();

    assert_eq!(state.active_channel, Some(ChannelName::Rain));
    assert_eq!(h.playing(), vec![ChannelName::Rain]);
}

#[test]
fn test_play_same_channel_toggles_off() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    let state = h.engine.play(Some("rain")).unwrap();

    assert_eq!(state.active_channel, None);
    assert!(h.playing().is_empty());
}

#[test]
fn test_switching_channels_keeps_one_playing() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    let state = h.engine.play(Some("cafe")).unwrap();

    assert_eq!(state.active_channel, Some(ChannelName::Cafe));
    assert_eq!(h.playing(), vec![ChannelName::Cafe]);
}

#[test]
fn test_play_none_stops_playback() {
    let h = harness();
    h.engine.play(Some("birds")).unwrap();
    let state = h.engine.play(None).unwrap();

    assert_eq!(state.active_channel, None);
    assert!(h.playing().is_empty());
}

#[test]
fn test_unknown_channel_clears_active() {
    let h = harness();
    h.engine.play(Some("cafe")).unwrap();
    let state = h.engine.play(Some("thunder")).unwrap();

    assert_eq!(state.active_channel, None);
    assert!(h.playing().is_empty());
    // No resource is created for unknown names
    assert_eq!(h.backend.creations(), 1);
}

#[test]
fn test_resources_reused_across_plays() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    h.engine.play(Some("cafe")).unwrap();
    h.engine.play(Some("rain")).unwrap();
    h.engine.play(Some("rain")).unwrap();
    h.engine.play(Some("rain")).unwrap();

    assert_eq!(h.backend.creations(), 2);
    assert_eq!(h.backend.channel(ChannelName::Rain).unwrap().start_calls(), 3);
}

#[test]
fn test_switching_resumes_without_rewind() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    let rain = h.backend.channel(ChannelName::Rain).unwrap();
    rain.advance(Duration::from_secs(30));

    h.engine.play(Some("cafe")).unwrap();
    h.engine.play(Some("rain")).unwrap();

    assert_eq!(rain.position(), Duration::from_secs(30));
}

#[test]
fn test_stop_all_rewinds_every_channel() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    let rain = h.backend.channel(ChannelName::Rain).unwrap();
    rain.advance(Duration::from_secs(12));

    let state = h.engine.stop_all().unwrap();

    assert_eq!(state.active_channel, None);
    assert!(h.playing().is_empty());
    assert_eq!(rain.position(), Duration::ZERO);
    // Resources stay registered for reuse
    assert!(h.engine.registry().get(ChannelName::Rain).unwrap().is_some());
}

#[test]
fn test_stop_all_without_channels_is_harmless() {
    let h = harness();
    let state = h.engine.stop_all().unwrap();
    assert_eq!(state.active_channel, None);
    assert_eq!(h.backend.creations(), 0);
}

#[test]
fn test_set_volume_applies_to_all_channels_and_persists() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    h.engine.play(Some("cafe")).unwrap();

    let state = h.engine.set_volume(0.8).unwrap();
    assert_eq!(state.volume, 0.8);
    assert_eq!(h.backend.channel(ChannelName::Rain).unwrap().volume(), 0.8);
    assert_eq!(h.backend.channel(ChannelName::Cafe).unwrap().volume(), 0.8);
    assert_eq!(h.store.get("backgroundSoundVolume").as_deref(), Some("0.8"));
}

#[test]
fn test_set_volume_clamps_into_range() {
    let h = harness();
    assert_eq!(h.engine.set_volume(1.7).unwrap().volume, 1.0);
    assert_eq!(h.engine.set_volume(-0.2).unwrap().volume, 0.0);
    assert_eq!(h.store.get("backgroundSoundVolume").as_deref(), Some("0"));
}

#[test]
fn test_set_volume_rejects_non_finite() {
    let h = harness();
    h.engine.set_volume(0.4).unwrap();

    assert!(matches!(
        h.engine.set_volume(f32::NAN),
        Err(SoundError::InvalidVolume { .. })
    ));
    assert!(h.engine.set_volume(f32::INFINITY).is_err());
    assert_eq!(h.engine.snapshot().unwrap().volume, 0.4);
    assert_eq!(h.store.get("backgroundSoundVolume").as_deref(), Some("0.4"));
}

#[test]
fn test_new_channel_gets_current_volume() {
    let h = harness();
    h.engine.set_volume(0.25).unwrap();
    h.engine.play(Some("birds")).unwrap();

    assert_eq!(h.backend.channel(ChannelName::Birds).unwrap().volume(), 0.25);
}

#[test]
fn test_volume_read_once_at_startup() {
    let h = harness();
    h.store.set("backgroundSoundVolume", "0.9");
    assert_eq!(h.engine.snapshot().unwrap().volume, 0.5);
}

#[test]
fn test_failed_start_keeps_active_channel() {
    let h = harness();
    h.engine.play(Some("rain")).unwrap();
    h.engine.play(None).unwrap();
    h.backend
        .channel(ChannelName::Rain)
        .unwrap()
        .set_fail_starts(true);

    let state = h.engine.play(Some("rain")).unwrap();

    assert_eq!(state.active_channel, Some(ChannelName::Rain));
    assert!(h.playing().is_empty());
}

#[test]
fn test_failed_load_keeps_active_channel() {
    let h = harness();
    h.backend.fail_loads_for(ChannelName::Birds);

    let state = h.engine.play(Some("birds")).unwrap();

    assert_eq!(state.active_channel, Some(ChannelName::Birds));
    assert!(h.playing().is_empty());
}

#[test]
fn test_preload_creates_every_channel_once() {
    let h = harness();
    h.backend.fail_loads_for(ChannelName::Cafe);

    assert_eq!(h.engine.preload().unwrap(), 2);
    h.engine.play(Some("rain")).unwrap();
    assert_eq!(h.backend.creations(), 2);
}

#[test]
fn test_play_channel_matches_play_by_name() {
    let h = harness();
    let state = h.engine.play_channel(ChannelName::Cafe).unwrap();
    assert_eq!(state.active_channel, Some(ChannelName::Cafe));

    let state = h.engine.play_channel(ChannelName::Cafe).unwrap();
    assert_eq!(state.active_channel, None);
}

#[test]
fn test_observers_see_each_change() {
    let h = harness();
    let mut rx = h.engine.subscribe();

    h.engine.play(Some("rain")).unwrap();
    h.engine.set_volume(0.1).unwrap();
    h.engine.stop_all().unwrap();

    assert_eq!(rx.try_recv().unwrap().active_channel, Some(ChannelName::Rain));
    assert_eq!(rx.try_recv().unwrap().volume, 0.1);
    assert_eq!(rx.try_recv().unwrap().active_channel, None);
}

/// Backend whose `birds` creation panics, poisoning the registry lock.
struct PanickingBirds(SimulatedBackend);

impl SoundBackend for PanickingBirds {
    fn create(&self, channel: ChannelName) -> Result<Arc<dyn ChannelResource>, SoundError> {
        if channel == ChannelName::Birds {
            panic!("birds asset exploded");
        }
        self.0.create(channel)
    }
}

#[test]
fn test_poisoned_registry_leaves_state_untouched() {
    let registry = Arc::new(SoundChannelRegistry::new(Arc::new(PanickingBirds(
        SimulatedBackend::new(),
    ))));
    let engine = BackgroundSoundEngine::new(
        Arc::clone(&registry),
        Arc::new(MemoryStore::new()),
        &AppConfig::ephemeral(),
    );
    engine.play(Some("rain")).unwrap();
    let mut rx = engine.subscribe();

    let poisoned = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = registry.get_or_create(ChannelName::Birds, 0.5);
    }));
    assert!(poisoned.is_err());

    assert!(matches!(
        engine.play(Some("cafe")),
        Err(SoundError::LockPoisoned { .. })
    ));
    assert!(engine.set_volume(0.9).is_err());

    let state = engine.snapshot().unwrap();
    assert_eq!(state.active_channel, Some(ChannelName::Rain));
    assert_eq!(state.volume, 0.5);
    assert!(rx.try_recv().is_err());
}
