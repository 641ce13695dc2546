use nanoid::nanoid;

pub(crate) fn generate_id() -> String {
    nanoid!()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
