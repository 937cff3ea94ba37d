//! Per-platform construction of the editor launch command.
//!
//! The launch contract with JetBrains-family IDEs is
//! `<editor> --line <n> <file>`; everything else here is quoting and the
//! platform's detach idiom. The set of platforms is closed: adding one is
//! a new enum variant and a new match arm in [`build_jump_command`].

use std::fmt;

use crate::cache::CacheStore;
use crate::constants::COMMAND_TTL;
use crate::error::{Error, Result};
use crate::validate;

/// Target platform family for command construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the platform this process runs on.
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the launch command for `platform`.
///
/// Inputs are validated before any construction: empty paths and line 0
/// are rejected.
pub fn build_jump_command(
    platform: Platform,
    editor_path: &str,
    file_path: &str,
    line: u32,
) -> Result<String> {
    validate::non_empty_path(editor_path, "editor path")?;
    validate::non_empty_path(file_path, "file path")?;
    validate::line_number(line)?;

    Ok(match platform {
        Platform::Windows => format!(
            "{} --line {} {}",
            quote_double(editor_path),
            line,
            quote_double(file_path)
        ),
        // nohup + redirection + background keeps the GUI app's lifetime
        // independent of the host and avoids a flashing terminal window.
        Platform::MacOs | Platform::Linux => format!(
            "nohup {} --line {} {} > /dev/null 2>&1 &",
            quote_single(editor_path),
            line,
            quote_double(file_path)
        ),
    })
}

/// Double-quote, backslash-escaping embedded backslashes and quotes.
fn quote_double(path: &str) -> String {
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for ch in path.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Single-quote for POSIX shells; embedded single quotes use the
/// `'"'"'` idiom.
fn quote_single(path: &str) -> String {
    format!("'{}'", path.replace('\'', r#"'"'"'"#))
}

/// Caching wrapper over [`build_jump_command`].
///
/// Results are keyed by `(editor id, platform)` with a short TTL: the same
/// editor and platform yield the same command for a fixed file/line, and
/// callers tolerate a stale command only inside the TTL window.
#[derive(Clone)]
pub struct CommandCache {
    cache: CacheStore<String>,
}

impl CommandCache {
    pub fn new(cache: CacheStore<String>) -> Self {
        Self { cache }
    }

    pub fn build(
        &self,
        editor_id: &str,
        platform: Platform,
        editor_path: &str,
        file_path: &str,
        line: u32,
    ) -> Result<String> {
        let key = format!("command:{editor_id}:{platform}");
        if let Some(command) = self.cache.get(&key) {
            return Ok(command);
        }
        let command = build_jump_command(platform, editor_path, file_path, line)?;
        self.cache.set(&key, command.clone(), Some(COMMAND_TTL));
        Ok(command)
    }

    /// Drop the cached command for one editor/platform pair.
    pub fn invalidate(&self, editor_id: &str, platform: Platform) {
        self.cache.delete(&format!("command:{editor_id}:{platform}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unix_command_is_byte_exact() {
        let command = build_jump_command(
            Platform::MacOs,
            "/Applications/IntelliJ IDEA CE.app/Contents/MacOS/idea",
            "/Users/x/proj/src/main.kt",
            42,
        )
        .unwrap();
        assert_eq!(
            command,
            "nohup '/Applications/IntelliJ IDEA CE.app/Contents/MacOS/idea' --line 42 \"/Users/x/proj/src/main.kt\" > /dev/null 2>&1 &"
        );
    }

    #[test]
    fn linux_uses_the_same_detach_idiom() {
        let command =
            build_jump_command(Platform::Linux, "/usr/bin/idea", "/home/x/a.rs", 7).unwrap();
        assert_eq!(
            command,
            "nohup '/usr/bin/idea' --line 7 \"/home/x/a.rs\" > /dev/null 2>&1 &"
        );
    }

    #[test]
    fn windows_command_is_byte_exact() {
        let command = build_jump_command(
            Platform::Windows,
            r"C:\IDE\idea64.exe",
            r"C:\proj\Main.java",
            7,
        )
        .unwrap();
        assert_eq!(command, r#""C:\\IDE\\idea64.exe" --line 7 "C:\\proj\\Main.java""#);
    }

    #[test]
    fn embedded_single_quote_uses_posix_idiom() {
        let command = build_jump_command(
            Platform::Linux,
            "/opt/it's here/idea",
            "/home/x/a.rs",
            1,
        )
        .unwrap();
        assert!(command.starts_with(r#"nohup '/opt/it'"'"'s here/idea' --line 1"#));
    }

    #[test]
    fn embedded_double_quote_is_escaped_on_windows() {
        let command = build_jump_command(
            Platform::Windows,
            r#"C:\odd"name\idea.exe"#,
            r"C:\a.java",
            1,
        )
        .unwrap();
        assert!(command.starts_with(r#""C:\\odd\"name\\idea.exe""#));
    }

    #[test]
    fn rejects_invalid_inputs_before_construction() {
        assert!(build_jump_command(Platform::Linux, "", "/a.rs", 1).is_err());
        assert!(build_jump_command(Platform::Linux, "/usr/bin/idea", "", 1).is_err());
        assert!(build_jump_command(Platform::Linux, "/usr/bin/idea", "/a.rs", 0).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cache_returns_stale_command_only_inside_ttl() {
        let cache = CommandCache::new(CacheStore::default());

        let first = cache
            .build("ed-1", Platform::Linux, "/usr/bin/idea", "/home/x/a.rs", 10)
            .unwrap();
        // Within the TTL the cached command wins, line change and all.
        let second = cache
            .build("ed-1", Platform::Linux, "/usr/bin/idea", "/home/x/b.rs", 99)
            .unwrap();
        assert_eq!(first, second);

        tokio::time::advance(COMMAND_TTL + Duration::from_millis(10)).await;
        let third = cache
            .build("ed-1", Platform::Linux, "/usr/bin/idea", "/home/x/b.rs", 99)
            .unwrap();
        assert!(third.contains("--line 99"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_a_rebuild() {
        let cache = CommandCache::new(CacheStore::default());
        cache
            .build("ed-1", Platform::Linux, "/usr/bin/idea", "/home/x/a.rs", 10)
            .unwrap();
        cache.invalidate("ed-1", Platform::Linux);
        let rebuilt = cache
            .build("ed-1", Platform::Linux, "/usr/bin/idea", "/home/x/a.rs", 11)
            .unwrap();
        assert!(rebuilt.contains("--line 11"));
    }
}
