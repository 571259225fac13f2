use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::render::{DEFAULT_LIST_INDENT_PX, DEFAULT_PARALLEL_THRESHOLD, RenderOptions};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
    Text,
}

impl OutputFormat {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub perf: bool,
    pub parallel_threshold: Option<usize>,
    pub list_indent: Option<usize>,
    pub format: Option<OutputFormat>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two flag sets; `other` wins for valued options.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            perf: self.perf || other.perf,
            parallel_threshold: other.parallel_threshold.or(self.parallel_threshold),
            list_indent: other.list_indent.or(self.list_indent),
            format: other.format.or(self.format),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            parallel_threshold: self.parallel_threshold.unwrap_or(DEFAULT_PARALLEL_THRESHOLD),
            list_indent_px: self.list_indent.unwrap_or(DEFAULT_LIST_INDENT_PX),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("loom").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("loom")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("loom").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("loom").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".loomrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# loom defaults (saved with --save)".to_string()];
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(threshold) = flags.parallel_threshold {
        lines.push(format!("--parallel-threshold {threshold}"));
    }
    if let Some(indent) = flags.list_indent {
        lines.push(format!("--list-indent {indent}"));
    }
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format.as_str()));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of a token list. Unknown tokens and unparsable
/// values are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--perf" {
            flags.perf = true;
        } else if let Some((name, value)) = token.split_once('=') {
            apply_valued(&mut flags, name, value);
        } else if is_valued(token) {
            if let Some(next) = tokens.get(i + 1) {
                apply_valued(&mut flags, token, next);
                i += 1;
            }
        }
        i += 1;
    }
    flags
}

fn is_valued(name: &str) -> bool {
    matches!(
        name,
        "--parallel-threshold" | "--list-indent" | "--format" | "--render-debug-log"
    )
}

fn apply_valued(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--parallel-threshold" => flags.parallel_threshold = value.parse().ok(),
        "--list-indent" => flags.list_indent = value.parse().ok(),
        "--format" => flags.format = parse_format(value),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s {
        "html" => Some(OutputFormat::Html),
        "json" => Some(OutputFormat::Json),
        "text" => Some(OutputFormat::Text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "loom",
            "--perf",
            "--parallel-threshold",
            "8",
            "--format",
            "json",
            "--render-debug-log=render.log",
            "README.md",
        ]));
        assert!(flags.perf);
        assert_eq!(flags.parallel_threshold, Some(8));
        assert_eq!(flags.format, Some(OutputFormat::Json));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
        assert_eq!(flags.list_indent, None);
    }

    #[test]
    fn test_bad_numbers_are_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--list-indent", "wide", "--format=pdf"]));
        assert_eq!(flags.list_indent, None);
        assert_eq!(flags.format, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            format: Some(OutputFormat::Text),
            list_indent: Some(16),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            format: Some(OutputFormat::Html),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert_eq!(merged.format, Some(OutputFormat::Html));
        assert_eq!(merged.list_indent, Some(16));
    }

    #[test]
    fn test_render_options_defaults() {
        assert_eq!(ConfigFlags::default().render_options(), RenderOptions::default());
        let flags = ConfigFlags {
            parallel_threshold: Some(4),
            list_indent: Some(10),
            ..ConfigFlags::default()
        };
        let options = flags.render_options();
        assert_eq!(options.parallel_threshold, 4);
        assert_eq!(options.list_indent_px, 10);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".loomrc");
        let flags = ConfigFlags {
            perf: true,
            parallel_threshold: Some(100),
            list_indent: Some(12),
            format: Some(OutputFormat::Json),
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
