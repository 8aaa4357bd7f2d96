//! Sources backed by throwaway git repositories. Skipped when `git` is missing.

use std::path::{Path, PathBuf};
use std::process::Command;

use kiln_core::config::{GlobalConfig, ProjectConfig, Settings};
use kiln_core::identifier::{ProjectIdentifier, SourceKind};
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::Revision;
use kiln_resolver::resolver::Resolver;
use kiln_resolver::source::DependencySource;
use kiln_source::checkout::Checkout;
use kiln_source::session::ProjectSources;
use kiln_util::errors::KilnError;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "user.name=kiln", "-c", "user.email=kiln@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Commit `files` and optionally tag the result.
fn commit(repo: &Path, files: &[(&str, &str)], tag: Option<&str>) {
    for (name, content) in files {
        std::fs::write(repo.join(name), content).unwrap();
    }
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-q", "-m", "change"]);
    if let Some(tag) = tag {
        git(repo, &["tag", tag]);
    }
}

fn init_repo(parent: &Path, name: &str) -> PathBuf {
    let repo = parent.join(name);
    std::fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-q", "-b", "main"]);
    repo
}

fn settings(tmp: &Path, fetch: bool) -> Settings {
    let root = tmp.join("App");
    std::fs::create_dir_all(&root).unwrap();
    let mut settings = Settings::resolve(&root, &GlobalConfig::default(), &ProjectConfig::default());
    settings.cache_dir = tmp.join("cache");
    settings.fetch = fetch;
    settings
}

fn git_id(repo: &Path) -> ProjectIdentifier {
    ProjectIdentifier::new(SourceKind::Git, repo.to_string_lossy())
}

fn names(revisions: &[Revision]) -> Vec<&str> {
    revisions.iter().map(|r| r.name()).collect()
}

/// Lib: 1.0 without a Kilnfile, 1.1 depending on Core, a pre-release,
/// a non-version tag and a `develop` branch.
fn lib_fixture(tmp: &Path) -> PathBuf {
    let repo = init_repo(tmp, "Lib");
    commit(&repo, &[("README", "1.0")], Some("1.0"));
    commit(
        &repo,
        &[("README", "1.1"), ("Kilnfile", "github \"org/Core\" ~> 2.0\n")],
        Some("1.1"),
    );
    commit(&repo, &[("README", "beta")], Some("v2.0.0-beta"));
    git(&repo, &["tag", "notes"]);
    git(&repo, &["checkout", "-q", "-b", "develop"]);
    commit(&repo, &[("README", "develop")], None);
    git(&repo, &["checkout", "-q", "main"]);
    repo
}

#[test]
fn candidates_are_semantic_tags_newest_first() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = lib_fixture(tmp.path());
    let sources = ProjectSources::new(settings(tmp.path(), true));
    let id = git_id(&repo);

    let all = sources.candidate_revisions(&id, &VersionPredicate::Any).unwrap();
    assert_eq!(names(&all), ["v2.0.0-beta", "1.1", "1.0"]);

    let ranged = sources
        .candidate_revisions(&id, &VersionPredicate::parse(">= 1.0").unwrap())
        .unwrap();
    assert_eq!(names(&ranged), ["1.1", "1.0"]);
}

#[test]
fn manifests_are_read_at_each_revision() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = lib_fixture(tmp.path());
    let sources = ProjectSources::new(settings(tmp.path(), true));
    let id = git_id(&repo);

    let old = sources
        .specifications(&id, Some(&Revision::tag("1.0").unwrap()))
        .unwrap();
    assert!(old.is_empty());

    let new = sources
        .specifications(&id, Some(&Revision::tag("1.1").unwrap()))
        .unwrap();
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].identifier.project_name(), "Core");
    assert_eq!(new[0].predicate.to_string(), "~> 2.0");
}

#[test]
fn names_resolve_to_tags_or_commits() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = lib_fixture(tmp.path());
    let sources = ProjectSources::new(settings(tmp.path(), true));
    let id = git_id(&repo);

    assert_eq!(
        sources.revision_for_name(&id, "1.1").unwrap(),
        Revision::tag("1.1").unwrap()
    );

    let develop = git(&repo, &["rev-parse", "develop"]);
    assert_eq!(
        sources.revision_for_name(&id, "develop").unwrap(),
        Revision::commit(develop.clone())
    );
    assert_eq!(
        sources.revision_for_name(&id, &develop).unwrap(),
        Revision::commit(develop)
    );

    let err = sources.revision_for_name(&id, "missing").unwrap_err();
    assert!(matches!(err, KilnError::NoSuchRevision { revision, .. } if revision == "missing"));
}

#[test]
fn untagged_repository_offers_head() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = init_repo(tmp.path(), "Plain");
    commit(&repo, &[("README", "plain")], None);
    let head = git(&repo, &["rev-parse", "HEAD"]);

    let sources = ProjectSources::new(settings(tmp.path(), true));
    let candidates = sources
        .candidate_revisions(&git_id(&repo), &VersionPredicate::Any)
        .unwrap();
    assert_eq!(candidates, vec![Revision::commit(head)]);
}

#[test]
fn mirror_refresh_follows_fetch_setting() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = lib_fixture(tmp.path());
    let id = git_id(&repo);
    ProjectSources::new(settings(tmp.path(), true))
        .candidate_revisions(&id, &VersionPredicate::Any)
        .unwrap();

    commit(&repo, &[("README", "1.2")], Some("1.2"));

    let offline = ProjectSources::new(settings(tmp.path(), false));
    let stale = offline.candidate_revisions(&id, &VersionPredicate::Any).unwrap();
    assert!(!names(&stale).contains(&"1.2"));

    let online = ProjectSources::new(settings(tmp.path(), true));
    let fresh = online.candidate_revisions(&id, &VersionPredicate::Any).unwrap();
    assert!(names(&fresh).contains(&"1.2"));
}

#[test]
fn checkout_switches_revisions_and_links_build_dir() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let repo = lib_fixture(tmp.path());
    let settings = settings(tmp.path(), true);
    let sources = ProjectSources::new(settings.clone());
    let id = git_id(&repo);
    let provider = sources.provider(&id).unwrap();

    let first = Checkout::new(id.clone(), Revision::tag("1.0").unwrap(), false, &settings);
    first.prepare(&provider, &settings.build_path()).unwrap();
    let readme = first.path.join("README");
    assert_eq!(std::fs::read_to_string(&readme).unwrap(), "1.0");
    assert!(!first.path.join("Kiln").exists());

    let second = Checkout::new(id, Revision::tag("1.1").unwrap(), true, &settings);
    second.prepare(&provider, &settings.build_path()).unwrap();
    assert_eq!(std::fs::read_to_string(&readme).unwrap(), "1.1");
    let link = second.path.join("Kiln").join("Build");
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), settings.build_path());
}

#[test]
fn resolver_runs_against_git_sources() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let core = init_repo(tmp.path(), "Core");
    commit(&core, &[("README", "2.0")], Some("2.0.0"));
    commit(&core, &[("README", "2.3")], Some("2.3.1"));
    commit(&core, &[("README", "3.0")], Some("3.0.0"));

    let lib = init_repo(tmp.path(), "Lib");
    let lib_manifest = format!("git \"{}\" ~> 2.0\n", core.display());
    commit(&lib, &[("Kilnfile", lib_manifest.as_str())], Some("1.0.0"));

    let settings = settings(tmp.path(), true);
    std::fs::write(
        settings.root_path.join("Kilnfile"),
        format!("git \"{}\" >= 1.0\n", lib.display()),
    )
    .unwrap();

    let sources = ProjectSources::new(settings);
    let resolution = Resolver::new(&sources, sources.root().clone())
        .resolve_build_order()
        .unwrap();
    let order: Vec<String> = resolution.build_order.iter().map(|n| n.to_string()).collect();
    assert_eq!(order, ["Core 2.3.1", "Lib 1.0.0", "App"]);
}
