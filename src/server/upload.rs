use std::path::Path;

use tracing::{info, warn};

use crate::models::{ClickerError, Result, UserId, DEFAULT_AVATAR};

/// Reduce a client-supplied filename to a safe basename: ASCII letters,
/// digits, `.`, `-` and `_` only, whitespace becomes `_`, no leading or
/// trailing dots or underscores.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_matches(|c: char| c == '.' || c == '_').to_string()
}

/// Write an avatar under `dir` as `<user_id>_<sanitized name>` and return the stored name.
pub async fn save_avatar(dir: &Path, user_id: UserId, original_name: &str, bytes: &[u8]) -> Result<String> {
    let sanitized = sanitize_filename(original_name);
    if sanitized.is_empty() {
        return Err(ClickerError::Upload(format!("unusable filename: {:?}", original_name)));
    }
    if bytes.is_empty() {
        return Err(ClickerError::Upload("empty file".to_string()));
    }

    let stored = format!("{}_{}", user_id, sanitized);
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&stored), bytes).await?;

    info!("Saved avatar {} ({} bytes)", stored, bytes.len());
    Ok(stored)
}

/// Delete a replaced avatar. The shared default and names that do not belong
/// to `user_id` are left alone; a file already gone is not an error.
pub async fn remove_avatar(dir: &Path, user_id: UserId, stored: &str) -> bool {
    let owned = stored.starts_with(&format!("{}_", user_id));
    if stored == DEFAULT_AVATAR || !owned || sanitize_filename(stored) != stored {
        return false;
    }

    match tokio::fs::remove_file(dir.join(stored)).await {
        Ok(()) => {
            info!("Removed old avatar {}", stored);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove old avatar {}: {}", stored, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("avatar.png"), "avatar.png");
        assert_eq!(sanitize_filename("my avatar.png"), "my_avatar.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic.jpg"), "pic.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[tokio::test]
    async fn test_save_avatar_prefixes_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_avatar(dir.path(), 7, "me.png", b"png-bytes").await.unwrap();

        assert_eq!(stored, "7_me.png");
        let written = tokio::fs::read(dir.path().join(&stored)).await.unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_save_avatar_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_avatar(dir.path(), 1, "///", b"x").await.is_err());
        assert!(save_avatar(dir.path(), 1, "ok.png", b"").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_avatar_only_touches_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let mine = save_avatar(dir.path(), 3, "old.png", b"a").await.unwrap();
        let theirs = save_avatar(dir.path(), 4, "old.png", b"b").await.unwrap();
        tokio::fs::write(dir.path().join(DEFAULT_AVATAR), b"d").await.unwrap();

        assert!(!remove_avatar(dir.path(), 3, DEFAULT_AVATAR).await);
        assert!(!remove_avatar(dir.path(), 3, &theirs).await);
        assert!(remove_avatar(dir.path(), 3, &mine).await);
        assert!(!remove_avatar(dir.path(), 3, &mine).await);

        assert!(!dir.path().join(&mine).exists());
        assert!(dir.path().join(&theirs).exists());
        assert!(dir.path().join(DEFAULT_AVATAR).exists());
    }
}
