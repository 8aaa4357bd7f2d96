use kiln_core::config::{
    dirs_path, GlobalConfig, ProjectConfig, Settings, DEFAULT_MAX_EXPANSIONS,
};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_global_config_default_cache_dir() {
    let config = GlobalConfig::default();
    assert_eq!(config.cache.dir, "~/.kiln/cache");
    assert!(!config.git.use_ssh);
}

#[test]
fn test_global_config_parse_from_toml() {
    let toml = r#"
[cache]
dir = "/custom/cache"

[git]
use-ssh = true
"#;
    let config: GlobalConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.cache.dir, "/custom/cache");
    assert!(config.git.use_ssh);
}

#[test]
fn test_global_config_missing_file_is_default() {
    let tmp = TempDir::new().unwrap();
    let config = GlobalConfig::load_from(&tmp.path().join("missing.toml")).unwrap();
    assert_eq!(config.cache.dir, "~/.kiln/cache");
}

#[test]
fn test_dirs_path_contains_kiln() {
    assert!(dirs_path().ends_with(".kiln"));
}

#[test]
fn test_project_config_parse() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("kiln.toml"),
        r#"
[defaults]
use-ssh = true
fetch = false

[resolver]
max-expansions = 8

[repo-overrides]
Networking = "/Users/me/src/Networking"
"#,
    )
    .unwrap();
    let config = ProjectConfig::load(tmp.path()).unwrap();
    assert_eq!(config.defaults.use_ssh, Some(true));
    assert_eq!(config.defaults.fetch, Some(false));
    assert_eq!(config.resolver.max_expansions, Some(8));
    assert_eq!(
        config.repo_overrides.get("Networking").map(String::as_str),
        Some("/Users/me/src/Networking")
    );
}

#[test]
fn test_project_config_invalid_toml_is_config_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("kiln.toml"), "[defaults\nfetch = ").unwrap();
    let err = ProjectConfig::load(tmp.path()).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"), "got: {err}");
}

#[test]
fn test_settings_project_overrides_global() {
    let mut global = GlobalConfig::default();
    global.git.use_ssh = true;
    global.cache.dir = "/var/cache/kiln".to_string();
    let mut project = ProjectConfig::default();
    project.defaults.use_ssh = Some(false);

    let settings = Settings::resolve(Path::new("/work/app"), &global, &project);
    assert!(!settings.use_ssh);
    assert!(settings.fetch);
    assert_eq!(settings.max_expansions, DEFAULT_MAX_EXPANSIONS);
    assert_eq!(settings.repo_cache_path(), Path::new("/var/cache/kiln/repos"));
}

#[test]
fn test_settings_cli_overrides_everything() {
    let global = GlobalConfig::default();
    let mut project = ProjectConfig::default();
    project.defaults.fetch = Some(true);
    let settings = Settings::resolve(Path::new("/work/app"), &global, &project)
        .with_cli(Some(true), Some(false));
    assert!(settings.use_ssh);
    assert!(!settings.fetch);
}

#[test]
fn test_settings_layout_paths() {
    let settings = Settings::resolve(
        Path::new("/work/app"),
        &GlobalConfig::default(),
        &ProjectConfig::default(),
    );
    assert_eq!(settings.checkouts_path(), Path::new("/work/app/Kiln/Checkouts"));
    assert_eq!(settings.build_path(), Path::new("/work/app/Kiln/Build"));
}
