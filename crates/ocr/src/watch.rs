use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use scanrename_core::RenameConfig;

/// Paths from `event` that are newly present in the folder and batch-eligible.
pub fn eligible_arrivals(event: &Event, config: &RenameConfig) -> Vec<PathBuf> {
    // Renames out of the folder (the batch's own moves) are not arrivals.
    let arrived: Vec<&PathBuf> = match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().collect()
        }
        // Paths are [from, to]; only the destination is new.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().into_iter().collect()
        }
        _ => Vec::new(),
    };
    arrived
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| config.is_eligible(&n))
        })
        .cloned()
        .collect()
}

/// Spawn a notify watcher on `watch_dir` that sends eligible new file paths to `tx`.
/// Returns the watcher; it must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    config: RenameConfig,
    tx: Sender<PathBuf>,
) -> notify::Result<impl Watcher> {
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        match event {
            Ok(ev) => {
                for path in eligible_arrivals(&ev, &config) {
                    let _ = tx.send(path);
                }
            }
            Err(e) => tracing::warn!("Watch error: {e}"),
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    fn event(kind: EventKind, names: &[&str]) -> Event {
        names
            .iter()
            .fold(Event::new(kind), |ev, n| ev.add_path(PathBuf::from("/scans").join(n)))
    }

    #[test]
    fn created_scan_is_forwarded() {
        let ev = event(EventKind::Create(CreateKind::File), &["SCN_0001.jpg"]);
        let paths = eligible_arrivals(&ev, &RenameConfig::default());
        assert_eq!(paths, vec![PathBuf::from("/scans/SCN_0001.jpg")]);
    }

    #[test]
    fn renamed_into_folder_is_forwarded() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["SCN_0002.jpg"],
        );
        assert_eq!(eligible_arrivals(&ev, &RenameConfig::default()).len(), 1);
    }

    #[test]
    fn renamed_out_of_folder_is_not_an_arrival() {
        let config = RenameConfig::default();
        for mode in [RenameMode::From, RenameMode::Any, RenameMode::Other] {
            let ev = event(EventKind::Modify(ModifyKind::Name(mode)), &["SCN_0001.jpg"]);
            assert!(eligible_arrivals(&ev, &config).is_empty(), "{mode:?}");
        }
    }

    #[test]
    fn rename_pair_forwards_only_destination() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["SCN_0001.jpg", "SCN_0001b.jpg"],
        );
        let paths = eligible_arrivals(&ev, &RenameConfig::default());
        assert_eq!(paths, vec![PathBuf::from("/scans/SCN_0001b.jpg")]);
    }

    #[test]
    fn rename_pair_leaving_eligibility_forwards_nothing() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["SCN_0001.jpg", "Jane Doe 4821 12-01-2023.jpg"],
        );
        assert!(eligible_arrivals(&ev, &RenameConfig::default()).is_empty());
    }

    #[test]
    fn ineligible_and_removed_files_are_dropped() {
        let config = RenameConfig::default();
        let created = event(
            EventKind::Create(CreateKind::File),
            &["notes.txt", "SCN_0001.png", "XYZ_0001.jpg"],
        );
        assert!(eligible_arrivals(&created, &config).is_empty());

        let removed = event(EventKind::Remove(RemoveKind::File), &["SCN_0001.jpg"]);
        assert!(eligible_arrivals(&removed, &config).is_empty());
    }
}
