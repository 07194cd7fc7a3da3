use wetodo_core::entry::{ChangeKind, Entry, EntryKind};
use wetodo_core::list::{List, parse_list};
use wetodo_core::{Command, Modification, UserId};

fn line(s: &str) -> Modification {
    Modification::parse_line(s).expect("well-formed line")
}

fn list_from(lines: &[&str]) -> List {
    let mut list = List::with_uuid("props", "Props");
    for l in lines {
        list.add_modification(line(l));
    }
    list.reset();
    list
}

fn titles(list: &List) -> Vec<&str> {
    list.entries().iter().map(Entry::title).collect()
}

#[test]
fn modification_lines_round_trip() {
    for s in [
        "0 CREATE local:0 note|a",
        "1234 CREATE g:123 note|fff",
        "1700000000000 CHANGEDESC gh:42 3|multi word | with pipes",
        "5 LISTRENAME local:2 New title with  double spaces",
        "99 RELOCATE local:0 1|0",
    ] {
        assert_eq!(line(s).to_string(), s);
    }
}

#[test]
fn replay_is_deterministic() {
    let mut list = list_from(&[
        "1 CREATE local:0 check|one",
        "2 CREATE local:1 note|two",
        "3 CREATE local:0 check|three",
        "4 CHECK local:1 0",
        "5 RENAME local:0 1|TWO",
        "6 RELOCATE local:0 2|0",
        "7 DELETE local:1 1",
        "8 CHANGEDESC local:0 2|d",
    ]);
    let first = list.entries().to_vec();
    let next = list.next_id();

    for _ in 0..3 {
        assert!(list.reset().is_clean());
        assert_eq!(list.entries(), first.as_slice());
        assert_eq!(list.next_id(), next);
    }
}

#[test]
fn create_ids_strictly_increase() {
    let list = list_from(&[
        "30 CREATE local:0 note|c",
        "10 CREATE local:0 note|a",
        "20 CREATE local:0 note|b",
        "40 CREATE local:0 note|d",
    ]);
    let ids: Vec<u64> = list.entries().iter().map(Entry::id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(titles(&list), vec!["a", "b", "c", "d"]);
}

#[test]
fn delete_purges_dependents() {
    let list = list_from(&[
        "1 CREATE local:0 check|gone",
        "2 RENAME local:0 0|renamed",
        "3 DELETE local:0 0",
    ]);
    assert!(list.entries().is_empty());
    let remaining: Vec<String> = list.modifications().iter().map(ToString::to_string).collect();
    assert_eq!(remaining, vec!["3 DELETE local:0 0"]);

    let mut replayed = list.clone();
    assert!(replayed.reset().is_clean());
    assert!(replayed.entries().is_empty());
    assert_eq!(replayed.modifications().len(), 1);
}

#[test]
fn check_twice_toggles_back_and_logs_both() {
    let list = list_from(&[
        "1 CREATE local:0 check|task",
        "2 CHECK local:0 0",
        "3 CHECK local:1 0",
    ]);
    let entry = &list.entries()[0];
    assert!(!entry.checked());
    let kinds: Vec<ChangeKind> = entry.changes().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Create, ChangeKind::Check, ChangeKind::Uncheck]
    );
    assert_eq!(entry.changes()[2].user.as_str(), "local:1");
}

#[test]
fn relocate_boundaries() {
    let base = [
        "1 CREATE local:0 note|a",
        "2 CREATE local:0 note|b",
        "3 CREATE local:0 note|c",
    ];

    let mut lines = base.to_vec();
    lines.push("4 RELOCATE local:0 0|99");
    assert_eq!(titles(&list_from(&lines)), vec!["b", "c", "a"]);

    for payload in ["4 RELOCATE local:0 0|-2", "4 RELOCATE local:0 junk"] {
        let mut lines = base.to_vec();
        lines.push(payload);
        let list = list_from(&lines);
        assert_eq!(titles(&list), vec!["a", "b", "c"], "{payload}");
    }
}

#[test]
fn clear_compacts_and_second_clear_is_noop() {
    let mut list = list_from(&[
        "1 CREATE local:0 note|a",
        "2 CREATE local:0 note|b",
        "3 CHECK local:0 0",
    ]);
    let watermark = list.next_id().to_string();
    list.modify(Modification::new(
        chrono::DateTime::from_timestamp_millis(10).expect("time"),
        Command::Clear,
        UserId::local_default(),
        watermark.clone(),
    )
    .expect("clear"))
    .expect("apply");
    assert_eq!(list.modifications().len(), 1);
    assert!(list.entries().is_empty());

    list.modify(line(&format!("11 CLEAR local:0 {watermark}")))
        .expect("second clear");
    assert_eq!(list.modifications().len(), 1);
    assert_eq!(list.modifications()[0].epoch_millis(), 11);
    assert!(list.entries().is_empty());
}

#[test]
fn serialization_fixture() {
    let mut list = List::with_uuid("fixture", "Example List");
    list.add_user(UserId::parse("gh:1234").expect("user"));
    list.modify(line("1234 CREATE g:123 note|fff")).expect("create");

    let text = list.to_text();
    assert_eq!(text, "Example List\ngh:1234\n1234 CREATE g:123 note|fff");

    let (parsed, report) = parse_list("fixture", &text).expect("parse");
    assert!(report.is_clean());
    assert_eq!(parsed.title(), "Example List");
    assert_eq!(parsed.users().len(), 1);
    assert_eq!(parsed.entries().len(), 1);
    assert_eq!(parsed.entries()[0].title(), "fff");
    assert_eq!(parsed.entries()[0].kind(), &EntryKind::Note);
}

#[test]
fn favorite_flag_round_trips() {
    let list = List::new("Foo*");
    assert_eq!(list.title(), "Foo");
    assert!(list.is_favorite());
    assert!(list.to_text().starts_with("Foo*\n"));

    let (parsed, _) = parse_list(list.uuid(), &list.to_text()).expect("parse");
    assert!(parsed.is_favorite());
    assert_eq!(parsed.title(), "Foo");
}

#[test]
fn unknown_commands_never_reach_the_log() {
    let err = Modification::parse_line("1 EXPLODE local:0 x").unwrap_err();
    assert_eq!(err.code(), wetodo_core::ErrorCode::UnknownCommand);
}
