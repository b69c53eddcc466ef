pub fn get_version_string() -> String {
    format!("{}-{}", env!("GIT_COUNT"), env!("GIT_HASH"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_has_count_and_hash() {
        let version = get_version_string();
        assert!(version.contains('-'));
        assert!(!version.contains('\n'));
    }
}
