use super::*;
use crate::kernel::language::ViewKind;

#[test]
fn one_lifecycle_per_path() {
    let mut registry = FileRegistry::default();
    let path = Path::new("/ws/a.md");

    registry.dispatch(path, FileEvent::Hydrate { dirty: false });
    registry.dispatch(path, FileEvent::Edit);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.state(path), Some(FileState::Dirty));
}

#[test]
fn dispatch_existing_does_not_create() {
    let mut registry = FileRegistry::default();
    let path = Path::new("/ws/a.md");

    assert!(registry
        .dispatch_existing(path, FileEvent::ExternalChange)
        .is_none());
    assert!(registry.is_empty());
}

#[test]
fn epochs_are_published_and_survive_eviction() {
    let epochs = EpochBoard::new();
    let mut registry = FileRegistry::new(epochs.clone());
    let path = Path::new("/ws/a.txt");

    registry.dispatch(path, FileEvent::Hydrate { dirty: true });
    registry.dispatch(path, FileEvent::Revert);
    assert_eq!(epochs.current(path), 1);

    registry.dispatch(path, FileEvent::ClearDone { epoch: 1 });
    registry.dispatch(path, FileEvent::ReloadDone { epoch: 1 });
    assert_eq!(registry.state(path), Some(FileState::Clean));

    assert!(registry.evict_if_disposable(path));
    assert!(!registry.contains(path));

    let fresh = registry.ensure(path);
    assert_eq!(fresh.state(), FileState::Idle);
    assert_eq!(fresh.epoch(), 1);
}

#[test]
fn dirty_or_busy_lifecycles_are_kept() {
    let mut registry = FileRegistry::default();
    let dirty = Path::new("/ws/dirty.txt");
    let saving = Path::new("/ws/saving.txt");

    registry.dispatch(dirty, FileEvent::Hydrate { dirty: true });
    registry.dispatch(saving, FileEvent::Hydrate { dirty: true });
    registry.dispatch(
        saving,
        FileEvent::Save {
            content: "x".to_string(),
            view_kind: ViewKind::Source,
        },
    );

    assert!(!registry.evict_if_disposable(dirty));
    assert!(!registry.evict_if_disposable(saving));
    assert!(!registry.all_settled());
    assert_eq!(registry.len(), 2);
}
