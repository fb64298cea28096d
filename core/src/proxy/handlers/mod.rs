pub mod categories;
pub mod chat;
pub mod demo;
pub mod download;

/// Short random id prefixed to a request's log lines
pub(crate) fn new_trace_id() -> String {
    use rand::Rng;
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
