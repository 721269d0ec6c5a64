//! Store keys. Every key is scoped to a user identity so two accounts on one
//! device never share drafts, caches or reminders.

pub fn draft(user_id: &str) -> String {
    format!("draft:{user_id}")
}

pub fn cache(user_id: &str, resource: &str) -> String {
    format!("cache:{user_id}:{resource}")
}

pub fn reminder(user_id: &str) -> String {
    format!("reminder:{user_id}")
}

pub fn override_state(user_id: &str) -> String {
    format!("override:{user_id}")
}
