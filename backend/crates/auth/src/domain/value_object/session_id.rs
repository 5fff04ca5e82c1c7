use kernel::id::Id;

pub struct SessionMarker;
pub type SessionId = Id<SessionMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_new() {
        let session_id = SessionId::new();
        assert_eq!(session_id.as_uuid().get_version_num(), 4);
    }
}
