use tempfile::TempDir;
use wetodo_core::list::List;
use wetodo_core::store::{FsStore, LIST_DIR, ListStore, StoreError, load_list, load_lists};
use wetodo_core::{Command, ErrorCode, Modification, UserId, modify_and_save};

async fn open_store() -> (FsStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = FsStore::open(dir.path()).await.unwrap();
    (store, dir)
}

fn issue(command: Command, data: &str) -> Modification {
    Modification::create(command, UserId::local_default(), data).unwrap()
}

#[tokio::test]
async fn saved_list_reloads_with_same_entries() {
    let (store, dir) = open_store().await;
    let mut list = List::new("Groceries*");
    list.add_user(UserId::local_default());

    modify_and_save(&mut list, issue(Command::Create, "check|Milk"), &store)
        .await
        .unwrap();
    modify_and_save(&mut list, issue(Command::Check, "0"), &store)
        .await
        .unwrap();

    assert!(dir.path().join(LIST_DIR).join(list.uuid()).exists());

    let loaded = load_list(&store, list.uuid()).await.unwrap();
    assert!(loaded.report.is_clean());
    assert_eq!(loaded.list.title(), "Groceries");
    assert!(loaded.list.is_favorite());
    assert_eq!(loaded.list.entries(), list.entries());
    assert_eq!(loaded.list.to_text(), list.to_text());
}

#[tokio::test]
async fn read_all_is_sorted_and_skips_temp_files() {
    let (store, dir) = open_store().await;
    for uuid in ["c", "a", "b"] {
        store.save(&List::with_uuid(uuid, uuid)).await.unwrap();
    }
    std::fs::write(dir.path().join(LIST_DIR).join(".x.tmp"), "junk").unwrap();

    let all = store.read_all().await.unwrap();
    let uuids: Vec<&str> = all.iter().map(|s| s.uuid.as_str()).collect();
    assert_eq!(uuids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn missing_list_reads_as_none_and_deletes_as_not_found() {
    let (store, _dir) = open_store().await;
    assert_eq!(store.read("nope").await.unwrap(), None);

    let err = store.delete("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = load_list(&store, "nope").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ListNotFound);
}

#[tokio::test]
async fn delete_removes_the_file() {
    let (store, _dir) = open_store().await;
    let list = List::with_uuid("gone", "Gone");
    store.save(&list).await.unwrap();
    store.delete("gone").await.unwrap();
    assert!(store.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn traversal_ids_are_refused() {
    let (store, _dir) = open_store().await;
    for uuid in ["../escape", "a/b", "..", "", ".hidden"] {
        let err = store.read(uuid).await.unwrap_err();
        assert!(matches!(err, StoreError::Security(_)), "{uuid:?}");
    }
}

#[tokio::test]
async fn corrupt_lists_degrade_instead_of_failing() {
    let (store, dir) = open_store().await;
    let lists = dir.path().join(LIST_DIR);
    std::fs::write(lists.join("empty"), "").unwrap();
    std::fs::write(
        lists.join("partial"),
        "Partial\nlocal:0\n1 CREATE local:0 note|kept\nnot a line\n2 RENAME local:0 9|x\n",
    )
    .unwrap();

    let loaded = load_lists(&store).await.unwrap();
    assert_eq!(loaded.len(), 1);
    let partial = &loaded[0];
    assert_eq!(partial.list.uuid(), "partial");
    assert_eq!(partial.list.entries().len(), 1);
    assert_eq!(partial.report.skipped.len(), 1);
    assert_eq!(partial.report.replay.failures.len(), 1);
}

#[tokio::test]
async fn undecodable_file_and_stray_dir_do_not_hide_other_lists() {
    let (store, dir) = open_store().await;
    let lists = dir.path().join(LIST_DIR);
    store.save(&List::with_uuid("good", "Good")).await.unwrap();
    std::fs::write(lists.join("binary"), [0xff, 0xfe, 0x00]).unwrap();
    std::fs::create_dir(lists.join("stray")).unwrap();

    let all = store.read_all().await.unwrap();
    let uuids: Vec<&str> = all.iter().map(|s| s.uuid.as_str()).collect();
    assert_eq!(uuids, vec!["good"]);

    let loaded = load_lists(&store).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].list.title(), "Good");
}
