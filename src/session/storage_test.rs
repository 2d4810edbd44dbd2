use super::*;

fn temp_file_storage() -> (tempfile::TempDir, FileStorage) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let storage = FileStorage::new(dir.path().join("nested").join("session.json"));
    (dir, storage)
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("token").unwrap(), None);

    storage.set("token", "abc").unwrap();
    assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
    assert_eq!(storage.len(), 1);

    storage.remove("token").unwrap();
    assert!(storage.is_empty());
}

#[test]
fn memory_storage_remove_missing_key_is_ok() {
    let storage = MemoryStorage::new();
    assert!(storage.remove("user").is_ok());
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_missing_file_reads_as_empty() {
    let (_dir, storage) = temp_file_storage();
    assert_eq!(storage.get("token").unwrap(), None);
    assert!(!storage.path().exists());
}

#[test]
fn file_storage_creates_parent_dirs_and_persists() {
    let (_dir, storage) = temp_file_storage();
    storage.set("token", "t-1").unwrap();
    assert!(storage.path().exists());

    let reopened = FileStorage::new(storage.path());
    assert_eq!(reopened.get("token").unwrap().as_deref(), Some("t-1"));
}

#[test]
fn file_storage_apply_writes_and_removes_together() {
    let (_dir, storage) = temp_file_storage();
    storage.apply(&[("token", "t-1"), ("user", "{}")], &[]).unwrap();
    storage.apply(&[("token", "t-2")], &["user"]).unwrap();

    assert_eq!(storage.get("token").unwrap().as_deref(), Some("t-2"));
    assert_eq!(storage.get("user").unwrap(), None);
}

#[test]
fn file_storage_removing_last_key_deletes_file() {
    let (_dir, storage) = temp_file_storage();
    storage.set("token", "t-1").unwrap();
    storage.remove("token").unwrap();
    assert!(!storage.path().exists());
}

#[test]
fn file_storage_leaves_no_temp_file_behind() {
    let (_dir, storage) = temp_file_storage();
    storage.set("token", "t-1").unwrap();
    storage.set("user", "{}").unwrap();

    let parent = storage.path().parent().unwrap();
    let names: Vec<_> = std::fs::read_dir(parent).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(names, ["session.json"]);
}

#[cfg(unix)]
#[test]
fn file_storage_session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, storage) = temp_file_storage();
    storage.set("token", "secret-bearer").unwrap();
    storage.set("user", "{}").unwrap();

    let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o077, 0, "session file mode {mode:o}");
}

#[cfg(unix)]
#[test]
fn file_storage_concurrent_writers_never_tear_the_file() {
    let (_dir, storage) = temp_file_storage();
    storage.set("token", "seed").unwrap();
    let path = storage.path().to_path_buf();

    let writers: Vec<_> = (0..4)
        .map(|n| {
            let path = path.clone();
            std::thread::spawn(move || {
                // Separate instances model separate processes: no shared lock.
                let storage = FileStorage::new(path);
                for i in 0..25 {
                    storage.set("token", &format!("w{n}-{i}")).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let token = FileStorage::new(&path).get("token").unwrap().unwrap();
    assert!(token.ends_with("-24"), "last write of some writer, got {token}");
}

#[test]
fn file_storage_corrupt_file_is_reported_on_read() {
    let (_dir, storage) = temp_file_storage();
    std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
    std::fs::write(storage.path(), "not json").unwrap();

    assert!(matches!(storage.get("token"), Err(StorageError::Corrupt { .. })));
}

#[test]
fn file_storage_corrupt_file_is_replaced_on_write() {
    let (_dir, storage) = temp_file_storage();
    std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
    std::fs::write(storage.path(), "[1, 2, 3]").unwrap();

    storage.set("token", "fresh").unwrap();
    assert_eq!(storage.get("token").unwrap().as_deref(), Some("fresh"));
}

#[test]
fn file_storage_unwritable_location_errors() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();
    let storage = FileStorage::new(blocker.join("session.json"));

    assert!(matches!(storage.set("token", "t"), Err(StorageError::Io { .. })));
}
