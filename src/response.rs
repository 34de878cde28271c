use crate::authz::{DenyReason, Verdict};
use chrono::{DateTime, Local, TimeZone};

/// RFC 1123 with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

pub fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now() -> String {
    timestamp(&Local::now())
}

pub fn ok(ts: &str, output: &str) -> String {
    format!("[{}]\n{}\n", ts, output)
}

pub fn unauthorized(ts: &str) -> String {
    format!("[{}]\nUnauthorized user.\nCancel task.\n", ts)
}

pub fn not_allowed(ts: &str, role: &str, command: &str) -> String {
    format!(
        "[{}]\n[{}] Not allow to run \"{}\" command.\nPermission denied.\n",
        ts, role, command
    )
}

pub fn unknown_flag(ts: &str, flag: &str) -> String {
    format!("[{}]\nUnknown flag \"{}\".\nCancel task.\n", ts, flag)
}

pub fn project_not_found(ts: &str, project: &str) -> String {
    format!("[{}]\nProject \"{}\" not found.\nCancel task.\n", ts, project)
}

pub fn unknown_command(ts: &str, command: &str) -> String {
    format!("[{}]\nUnknown command \"{}\".\nCancel task.\n", ts, command)
}

pub fn deploy_help(ts: &str) -> String {
    format!(
        "[{}]
Usage: /deploy [OPTION]... [PROJECT NAME] [ENVIROMENT]
Deploy pod, service or deployment on production or other env.
Arguments support.
    -h, --help             show help using
    -s, --show             show list project
    [Project name] [ENV]   /deploy projectA prod",
        ts
    )
}

pub fn project_listing(projects: &[String]) -> String {
    let mut body = format!("All project list bellow [Total {}]:\n", projects.len());
    for project in projects {
        body.push_str(project);
        body.push('\n');
    }
    body
}

/// Renders a denied verdict. `program` prefixes the subject in
/// permission-denied messages (`kubectl delete`, `deploy alpha`).
pub fn denial(program: &str, verdict: &Verdict) -> String {
    let ts = timestamp(&verdict.timestamp);
    let role = verdict
        .role
        .as_ref()
        .map(|r| r.as_str())
        .unwrap_or_default();

    match verdict.deny_reason() {
        None => ok(&ts, ""),
        Some(DenyReason::UnauthorizedUser) => unauthorized(&ts),
        Some(DenyReason::RoleForbidden)
        | Some(DenyReason::UnknownRole)
        | Some(DenyReason::UnmanagedCommandDenied) => {
            let command = if verdict.subject.is_empty() {
                program.to_string()
            } else {
                format!("{} {}", program, verdict.subject)
            };
            not_allowed(&ts, role, &command)
        }
        Some(DenyReason::ProjectNotFound) => project_not_found(&ts, &verdict.subject),
        Some(DenyReason::ForbiddenFlag)
        | Some(DenyReason::MissingEnvironmentFlag)
        | Some(DenyReason::TooManyArguments)
        | Some(DenyReason::UnknownEnvironmentFlag) => unknown_flag(&ts, &verdict.subject),
    }
}
