#![allow(missing_docs)]
#![allow(dead_code)]

/// One tool-call session, as a stream of top-level events.
pub const EVENTS: [&str; 4] = [
    r#"{"type":"start","id":1}"#,
    r#"{"type":"delta","id":1,"text":"Hel"}"#,
    r#"{"type":"delta","id":1,"text":"lo, \"world\""}"#,
    r#"{"type":"stop","id":1,"usage":[12,0.5,null]}"#,
];

// The same events, newline separated, cut on awkward seams: inside a
// string, inside an escape run, between a number and its terminator, and
// inside a literal.
#[rustfmt::skip]
pub const STREAM: [&str; 9] = [
    r#"{"type":"sta"#,                                             // inside a string
    r#"rt","id":1}"#,                                              // completes event 0
    "\n{\"type\":\"delta\",\"id\":1,\"text\":\"Hel\"}\n{\"ty",     // completes event 1, starts event 2
    r#"pe":"delta","id":1,"text":"lo, \"wor"#,                     // inside escaped text
    r#"ld\""}"#,                                                   // completes event 2
    "\n{\"type\":\"stop\",\"id\":",
    "1",                                                           // number without its terminator
    r#","usage":[12,0.5,nu"#,                                      // inside a literal
    r#"ll]}"#,                                                     // completes event 3
];

#[test]
fn stream_is_the_events_joined() {
    assert_eq!(STREAM.concat(), EVENTS.join("\n"));
}
