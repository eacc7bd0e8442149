//! Alert composer: one message per cycle

/// Join the lines fired this cycle into a single message body.
///
/// Returns `None` when nothing fired, so the sink is not called.
pub fn compose(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}
