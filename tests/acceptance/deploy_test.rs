use kubegate::authz::DenyReason;
use kubegate::claims::StaticRoles;
use kubegate::deploy::{DeployOutcome, DeployPlan, DeployValidator, Environment, ProjectRoot};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn validator(root: &Path) -> DeployValidator {
    let roles = StaticRoles::new()
        .with("mia", "manager")
        .with("dan", "developer")
        .with("gus", "guest");
    DeployValidator::new(Arc::new(roles), Arc::new(ProjectRoot::new(root)))
}

fn project_root(projects: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for project in projects {
        fs::create_dir(dir.path().join(project)).unwrap();
    }
    dir
}

fn expect_denied(outcome: DeployOutcome, reason: DenyReason, subject: &str) {
    match outcome {
        DeployOutcome::Denied(verdict) => {
            assert_eq!(verdict.deny_reason(), Some(reason));
            assert_eq!(verdict.subject, subject);
        }
        other => panic!("expected {:?}, got {:?}", reason, other),
    }
}

#[test]
fn test_zero_arguments_show_help() {
    let root = project_root(&[]);
    let v = validator(root.path());
    for user in ["mia", "dan", "gus"] {
        assert!(matches!(v.validate(user, &[]), DeployOutcome::Help));
    }
}

#[test]
fn test_help_flags() {
    let root = project_root(&[]);
    let v = validator(root.path());
    assert!(matches!(v.validate("dan", &args(&["-h"])), DeployOutcome::Help));
    assert!(matches!(v.validate("gus", &args(&["--help"])), DeployOutcome::Help));
}

#[test]
fn test_unknown_user_is_unauthorized() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());
    expect_denied(v.validate("stranger", &[]), DenyReason::UnauthorizedUser, "");
    expect_denied(
        v.validate("stranger", &args(&["alpha", "prod"])),
        DenyReason::UnauthorizedUser,
        "alpha",
    );
}

#[test]
fn test_manager_is_forbidden() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());
    expect_denied(
        v.validate("mia", &args(&["alpha", "prod"])),
        DenyReason::RoleForbidden,
        "alpha",
    );
    expect_denied(v.validate("mia", &args(&["--show"])), DenyReason::RoleForbidden, "--show");
}

#[test]
fn test_show_lists_project_directories() {
    let root = project_root(&["beta", "alpha"]);
    fs::write(root.path().join("README"), "not a project").unwrap();
    let v = validator(root.path());

    match v.validate("dan", &args(&["-s"])) {
        DeployOutcome::Listing(projects) => assert_eq!(projects, ["alpha", "beta"]),
        other => panic!("expected listing, got {:?}", other),
    }
}

#[test]
fn test_show_with_missing_root_is_empty() {
    let root = TempDir::new().unwrap();
    let v = validator(&root.path().join("nope"));

    match v.validate("gus", &args(&["--show"])) {
        DeployOutcome::Listing(projects) => assert!(projects.is_empty()),
        other => panic!("expected listing, got {:?}", other),
    }
}

#[test]
fn test_single_argument_needs_environment() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());
    expect_denied(
        v.validate("dan", &args(&["alpha"])),
        DenyReason::MissingEnvironmentFlag,
        "alpha",
    );
}

#[test]
fn test_existing_project_with_prod_yields_plan() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());

    for flag in ["-p", "--prod", "--production", "prod", "production"] {
        match v.validate("dan", &args(&["alpha", flag])) {
            DeployOutcome::Plan { plan, verdict } => {
                assert_eq!(
                    plan,
                    DeployPlan {
                        project: "alpha".to_string(),
                        environment: Environment::Production,
                    }
                );
                assert!(verdict.allowed());
            }
            other => panic!("expected plan for {}, got {:?}", flag, other),
        }
    }
}

#[test]
fn test_missing_project_is_not_found() {
    let root = project_root(&["beta"]);
    let v = validator(root.path());
    expect_denied(
        v.validate("dan", &args(&["alpha", "prod"])),
        DenyReason::ProjectNotFound,
        "alpha",
    );
}

#[test]
fn test_unknown_environment_flag() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());
    expect_denied(
        v.validate("gus", &args(&["alpha", "staging"])),
        DenyReason::UnknownEnvironmentFlag,
        "staging",
    );
}

#[test]
fn test_project_is_checked_before_environment() {
    let root = project_root(&[]);
    let v = validator(root.path());
    expect_denied(
        v.validate("dan", &args(&["alpha", "staging"])),
        DenyReason::ProjectNotFound,
        "alpha",
    );
}

#[test]
fn test_three_arguments_are_too_many() {
    let root = project_root(&["alpha"]);
    let v = validator(root.path());
    expect_denied(
        v.validate("dan", &args(&["alpha", "prod", "--force"])),
        DenyReason::TooManyArguments,
        "--force",
    );
}
