use crate::domain::ports::UidSource;
use uuid::Uuid;

pub const UID_LEN: usize = 12;

/// 12 hex characters drawn from a v4 UUID. Unrelated to surrogate keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUid;

impl UidSource for RandomUid {
    fn next_uid(&self) -> String {
        let mut uid = Uuid::new_v4().simple().to_string();
        uid.truncate(UID_LEN);
        uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uid_shape() {
        let uid = RandomUid.next_uid();
        assert_eq!(uid.len(), UID_LEN);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_uids_do_not_repeat() {
        let uids: HashSet<String> = (0..10_000).map(|_| RandomUid.next_uid()).collect();
        assert_eq!(uids.len(), 10_000);
    }
}
