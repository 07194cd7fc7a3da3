use chrono::DateTime;
use proptest::prelude::*;
use wetodo_core::{Command, Modification, UserId};

pub fn arb_user() -> impl Strategy<Value = UserId> + Clone {
    "[a-z]{1,6}:[0-9]{1,5}".prop_map(|raw| UserId::parse(&raw).unwrap())
}

/// Any payload the line grammar accepts.
pub fn arb_data() -> impl Strategy<Value = String> + Clone {
    "[a-zA-Z0-9 |*:\\\\-]{1,24}"
}

pub fn arb_command() -> impl Strategy<Value = Command> + Clone {
    prop::sample::select(Command::ALL.to_vec())
}

/// A canonical log line with an arbitrary payload.
pub fn arb_line() -> impl Strategy<Value = String> + Clone {
    (0i64..4_000_000_000_000, arb_command(), arb_user(), arb_data())
        .prop_map(|(ms, command, user, data)| format!("{ms} {command} {user} {data}"))
}

fn payload(command: Command, id: u64, target: u64, word: &str, kind: &str) -> String {
    match command {
        Command::Create => format!("{kind}|{word}"),
        Command::Delete | Command::Check => id.to_string(),
        Command::Rename | Command::ChangeDesc => format!("{id}|{word}"),
        Command::Relocate => format!("{id}|{target}"),
        Command::ListRename => word.to_string(),
        Command::Clear => target.to_string(),
    }
}

/// A modification with a payload that mostly makes sense for its command.
pub fn arb_modification() -> impl Strategy<Value = Modification> + Clone {
    let command = prop_oneof![
        4 => Just(Command::Create),
        2 => Just(Command::Delete),
        2 => Just(Command::Check),
        1 => Just(Command::Rename),
        1 => Just(Command::ChangeDesc),
        2 => Just(Command::Relocate),
        1 => Just(Command::ListRename),
        1 => Just(Command::Clear),
    ];
    (
        0i64..200,
        command,
        0u64..8,
        0u64..8,
        "[a-z]{1,8}",
        prop::sample::select(vec!["note", "check", "rule"]),
        arb_user(),
    )
        .prop_map(|(ms, command, id, target, word, kind, user)| {
            let time = DateTime::from_timestamp_millis(ms).unwrap();
            Modification::new(time, command, user, payload(command, id, target, &word, kind))
                .unwrap()
        })
}

pub fn arb_log() -> impl Strategy<Value = Vec<Modification>> {
    prop::collection::vec(arb_modification(), 0..40)
}
