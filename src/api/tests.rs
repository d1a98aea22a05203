use super::*;

// The global context is shared by every test in this binary, so each test
// only touches state no other test here relies on.

fn ensure_init() -> &'static AppContext {
    init(AppConfig::ephemeral());
    context()
}

#[test]
fn test_get_version() {
    assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_context_is_created_once() {
    let first = ensure_init();
    assert!(!init(AppConfig::default()));
    assert!(std::ptr::eq(first, context()));
    // Second config was ignored
    assert_eq!(
        context().config().storage.backend,
        crate::config::StoreBackend::Memory
    );
}

#[test]
fn test_timer_calls_reach_shared_engine() {
    ensure_init();
    let mut handle = timer_handle();

    set_completed_sessions(6).unwrap();

    assert_eq!(timer_state().unwrap().completed_sessions, 6);
    assert_eq!(handle.latest().unwrap().completed_sessions, 6);
}

#[test]
fn test_invalid_volume_rejected_through_api() {
    ensure_init();
    assert!(matches!(
        set_sound_volume(f32::NAN),
        Err(SoundError::InvalidVolume { .. })
    ));
}
