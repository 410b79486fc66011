//! Unit tests for tag registry error types

#[cfg(test)]
mod tests {
    use crate::tags::error::RegistryError;

    #[test]
    fn test_invalid_name_display() {
        let error = RegistryError::InvalidName(":any".to_string());
        assert_eq!(error.to_string(), "Invalid tag name: ':any'");
    }

    #[test]
    fn test_alias_exists_display() {
        let error = RegistryError::AliasExists("kitty".into(), "cat".into());
        assert_eq!(error.to_string(), "Alias 'kitty' already exists for 'cat'");
    }

    #[test]
    fn test_alias_chain_display() {
        let error = RegistryError::AliasChain("kitty".into(), "cat".into());
        let message = error.to_string();
        assert!(message.contains("kitty"));
        assert!(message.contains("cannot be an alias target"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegistryError>();
    }
}
