//! Flags a chat relay cannot honour: local files, watches, attached terminals.

const FILENAME: &[&str] = &["-f", "--filename"];
const WATCH: &[&str] = &["-f", "--filename", "-w", "--watch", "--watch-only"];
const FOLLOW: &[&str] = &["-f", "--follow"];
const TERMINAL: &[&str] = &["-i", "--stdin", "-t", "--tty"];
const RUN_TERMINAL: &[&str] = &["--leave-stdin-open", "-i", "--stdin", "--tty"];

fn blocked_for(subcommand: &str) -> &'static [&'static str] {
    match subcommand {
        "get" => WATCH,
        "logs" => FOLLOW,
        "attach" | "exec" => TERMINAL,
        "run" => RUN_TERMINAL,
        "describe" | "create" | "replace" | "patch" | "delete" | "edit" | "apply"
        | "rolling-update" | "scale" | "expose" | "autoscale" | "label" | "annotate"
        | "convert" => FILENAME,
        _ => &[],
    }
}

/// Returns the first argument after the subcommand that is blocked for it.
pub fn first_blocked_flag(args: &[String]) -> Option<&str> {
    let (subcommand, rest) = args.split_first()?;
    let blocked = blocked_for(subcommand);
    rest.iter()
        .map(String::as_str)
        .find(|arg| blocked.contains(arg))
}
