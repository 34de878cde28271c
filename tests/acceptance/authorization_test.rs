use kubegate::authz::{AllowReason, AuthorizationEngine, Decision, DenyReason};
use kubegate::claims::{ClaimsFile, RoleResolver, StaticRoles};
use kubegate::permissions::{ManagedCommand, PermissionTable};
use kubegate::role::Role;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const UNMANAGED: &[&str] = &["get", "describe", "logs", "rollout", "top", ""];

fn engine() -> AuthorizationEngine {
    let roles = StaticRoles::new()
        .with("mia", "manager")
        .with("dan", "developer")
        .with("gus", "guest")
        .with("ursula", "sre");
    AuthorizationEngine::new(Arc::new(roles), PermissionTable::default())
}

#[test]
fn test_absent_users_are_unauthorized_for_every_command() {
    let engine = engine();
    for cmd in ManagedCommand::ALL.iter().map(|c| c.as_str()).chain(UNMANAGED.iter().copied()) {
        let verdict = engine.authorize("stranger", cmd);
        assert_eq!(verdict.deny_reason(), Some(DenyReason::UnauthorizedUser), "{}", cmd);
        assert_eq!(verdict.actor, "stranger");
    }
}

#[test]
fn test_manager_is_allowed_everything() {
    let engine = engine();
    for cmd in ManagedCommand::ALL.iter().map(|c| c.as_str()).chain(UNMANAGED.iter().copied()) {
        let verdict = engine.authorize("mia", cmd);
        assert_eq!(verdict.decision, Decision::Allowed(AllowReason::ManagerOverride));
        assert_eq!(verdict.role, Some(Role::Manager));
    }
}

#[test]
fn test_table_denials_are_role_forbidden() {
    let engine = engine();
    for cmd in ManagedCommand::ALL {
        for user in ["dan", "gus"] {
            let verdict = engine.authorize(user, cmd.as_str());
            assert!(!verdict.allowed());
            assert_eq!(verdict.deny_reason(), Some(DenyReason::RoleForbidden));
            assert_eq!(verdict.subject, cmd.as_str());
        }
    }
}

#[test]
fn test_unmanaged_commands_default_allow() {
    let engine = engine();
    for cmd in UNMANAGED {
        for user in ["dan", "gus"] {
            let verdict = engine.authorize(user, cmd);
            assert_eq!(
                verdict.decision,
                Decision::Allowed(AllowReason::UnmanagedCommandDefaultAllow)
            );
        }
    }
}

#[test]
fn test_unknown_role_is_denied() {
    let engine = engine();
    let verdict = engine.authorize("ursula", "get");
    assert_eq!(verdict.deny_reason(), Some(DenyReason::UnknownRole));
    assert_eq!(verdict.role.map(|r| r.to_string()), Some("sre".to_string()));
}

#[test]
fn test_authorize_is_repeatable() {
    let engine = engine();
    for (user, cmd) in [("dan", "delete"), ("gus", "get"), ("mia", "apply"), ("x", "get")] {
        let first = engine.authorize(user, cmd);
        let second = engine.authorize(user, cmd);
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.role, second.role);
        assert_eq!(first.subject, second.subject);
    }
}

#[test]
fn test_engine_sees_claims_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roles.json");
    fs::write(&path, r#"[{"username": "dan", "role": "guest"}]"#).unwrap();

    let claims = Arc::new(ClaimsFile::new(&path));
    let engine = AuthorizationEngine::new(claims.clone(), PermissionTable::default());
    assert!(engine.authorize("dan", "get").allowed());

    fs::write(&path, r#"[{"username": "dan", "role": "projectManager"}]"#).unwrap();
    assert_eq!(claims.resolve_role("dan"), Some(Role::Manager));
    assert!(engine.authorize("dan", "delete").allowed());

    fs::write(&path, "garbage").unwrap();
    assert_eq!(
        engine.authorize("dan", "get").deny_reason(),
        Some(DenyReason::UnauthorizedUser)
    );
}

#[test]
fn test_padded_or_recased_roles_are_unknown() {
    let roles = StaticRoles::new()
        .with("eve", " manager ")
        .with("max", "Manager")
        .with("dora", "developer ");
    let engine = AuthorizationEngine::new(Arc::new(roles), PermissionTable::default());

    for user in ["eve", "max", "dora"] {
        let verdict = engine.authorize(user, "delete");
        assert_eq!(verdict.deny_reason(), Some(DenyReason::UnknownRole), "{}", user);
        assert!(!verdict.role.unwrap().is_recognized());
    }
}
