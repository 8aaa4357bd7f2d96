use kiln_core::identifier::SourceKind;
use kiln_core::manifest::{Manifest, ManifestOptions};
use kiln_core::predicate::{VersionOperator, VersionPredicate};
use kiln_util::errors::KilnError;

const KILNFILE: &str = r#"
# Networking stack
github "owner/Networking" ~> 4.2
git "https://example.com/team/Json.git" >= 1.0   # json
git "https://example.com/team/Logging.git" "develop"
github "owner/Pinned" == 2.0.1
local "../SharedKit"
"#;

#[test]
fn parses_every_line_kind() {
    let manifest = Manifest::parse(KILNFILE, "Kilnfile", &ManifestOptions::default()).unwrap();
    let specs = &manifest.specifications;
    assert_eq!(specs.len(), 5);

    assert_eq!(specs[0].identifier.kind(), SourceKind::GitHub);
    assert_eq!(specs[0].identifier.project_name(), "Networking");
    assert_eq!(specs[0].predicate.operator(), VersionOperator::Compatible);

    assert_eq!(specs[1].identifier.kind(), SourceKind::Git);
    assert_eq!(specs[1].identifier.link(), "https://example.com/team/Json.git");
    assert_eq!(specs[1].predicate.operator(), VersionOperator::AtLeast);

    assert_eq!(
        specs[2].predicate,
        VersionPredicate::Named("develop".to_string())
    );
    assert_eq!(specs[3].predicate.operator(), VersionOperator::Exact);

    assert_eq!(specs[4].identifier.kind(), SourceKind::Local);
    assert!(specs[4].predicate.is_any());
}

#[test]
fn display_is_canonical_manifest() {
    let manifest = Manifest::parse(KILNFILE, "Kilnfile", &ManifestOptions::default()).unwrap();
    let rendered = manifest.to_string();
    assert_eq!(
        rendered,
        "github \"owner/Networking\" ~> 4.2\n\
         git \"https://example.com/team/Json.git\" >= 1.0\n\
         git \"https://example.com/team/Logging.git\" \"develop\"\n\
         github \"owner/Pinned\" == 2.0.1\n\
         local \"../SharedKit\"\n"
    );
    let reparsed = Manifest::parse(&rendered, "Kilnfile", &ManifestOptions::default()).unwrap();
    assert_eq!(reparsed, manifest);
}

#[test]
fn unknown_source_kind_names_location() {
    let err = Manifest::parse(
        "github \"a/b\"\nbinary \"https://example.com/spec.json\"\n",
        "Kilnfile",
        &ManifestOptions::default(),
    )
    .unwrap_err();
    match err {
        KilnError::UnknownSourceKind { kind, location } => {
            assert_eq!(kind, "binary");
            assert_eq!(location, "Kilnfile:2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn bad_predicate_reports_line() {
    let err = Manifest::parse("github \"a/b\" ~> x.y\n", "Kilnfile", &ManifestOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("Kilnfile:1"), "got: {err}");
}

#[test]
fn missing_quotes_is_manifest_error() {
    let err =
        Manifest::parse("github owner/Repo\n", "Kilnfile", &ManifestOptions::default()).unwrap_err();
    assert!(matches!(err, KilnError::Manifest { .. }));
}

#[test]
fn empty_manifest_has_no_specifications() {
    let manifest =
        Manifest::parse("\n# nothing here\n\n", "Kilnfile", &ManifestOptions::default()).unwrap();
    assert!(manifest.specifications.is_empty());
}
