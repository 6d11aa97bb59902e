//! Properties of log-row formatting.

use livedoc_session::LogEvent;
use livedoc_session::server_log::format_batch;
use proptest::prelude::*;

fn event(time: u8) -> LogEvent {
    LogEvent {
        created_time: format!("12:00:{time:02}"),
        level_name: "INFO".into(),
        logger_name: "acederbergio".into(),
        line_number: 1,
        message: "x".into(),
    }
}

proptest! {
    #[test]
    fn a_time_is_shown_exactly_when_it_changes(times in prop::collection::vec(0u8..3, 0..40)) {
        let events: Vec<LogEvent> = times.iter().copied().map(event).collect();
        let rows = format_batch(&events);
        prop_assert_eq!(rows.len(), events.len());
        for (index, row) in rows.iter().enumerate() {
            let changed = index == 0 || times[index] != times[index - 1];
            prop_assert_eq!(row.time.is_some(), changed);
        }
    }

    #[test]
    fn unrecognized_messages_survive_verbatim(message in "[a-z ]{0,30}") {
        let rows = format_batch(&[LogEvent { message: message.clone(), ..event(0) }]);
        prop_assert_eq!(rows[0].message.text(), message);
    }
}
