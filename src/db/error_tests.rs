//! Unit tests for database error types

#[cfg(test)]
mod tests {
    use crate::db::error::DbError;
    use crate::tags::RegistryError;
    use sled::transaction::TransactionError;
    use std::error::Error;

    #[test]
    fn test_picture_not_found_error() {
        let error = DbError::PictureNotFound("cat.jpg".to_string());
        assert_eq!(error.to_string(), "Picture not found: cat.jpg");
    }

    #[test]
    fn test_corrupt_entry_error() {
        let error = DbError::CorruptEntry("tagmap key of 3 bytes".to_string());
        assert_eq!(
            error.to_string(),
            "Corrupt database entry: tagmap key of 3 bytes"
        );
    }

    #[test]
    fn test_error_debug() {
        let error = DbError::DuplicatePicture("dog.png".to_string());
        let debug = format!("{error:?}");
        assert!(debug.contains("DuplicatePicture"));
        assert!(debug.contains("dog.png"));
    }

    #[test]
    fn test_error_source() {
        let error = DbError::InvalidInput("test".to_string());
        assert!(error.source().is_none());

        let error = DbError::from(RegistryError::AliasNotFound("kitty".to_string()));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_transaction_abort_unwraps_inner_error() {
        let error: DbError =
            TransactionError::Abort(DbError::PictureNotFound("x".to_string())).into();
        assert!(matches!(error, DbError::PictureNotFound(name) if name == "x"));
    }

    #[test]
    fn test_registry_conversion_round_trip() {
        let error: RegistryError = DbError::Registry(RegistryError::CircularAlias("a".into())).into();
        assert!(matches!(error, RegistryError::CircularAlias(_)));

        let error: RegistryError = DbError::InvalidInput("bad".into()).into();
        assert!(matches!(error, RegistryError::Backend(msg) if msg.contains("bad")));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DbError>();
    }
}
