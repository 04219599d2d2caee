use crate::data::{Meet, Reflection};

/// Return a copy of `meet` with `reflection` appended; `meet` itself is untouched.
#[must_use]
pub fn append_reflection(meet: &Meet, reflection: Reflection) -> Meet {
    let mut next = meet.clone();
    next.reflections.push(reflection);
    next
}
