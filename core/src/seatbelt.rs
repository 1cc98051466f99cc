use crate::config::SeatboxHome;
use crate::folders::load_folders;
use dirs::home_dir;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;

/// Preamble of every compiled profile: default-allow, blanket
/// file-write deny, and the parameterized project-directory allow. The
/// deny must precede every allow rule.
const PERMISSIVE_OPEN_BASE_POLICY: &str = include_str!("permissive_open_base.sbpl");

/// When working with `sandbox-exec`, only consider `sandbox-exec` in
/// `/usr/bin` to defend against an attacker trying to inject a
/// malicious version on the PATH. If /usr/bin/sandbox-exec has been
/// tampered with, then the attacker already has root access.
pub const MACOS_PATH_TO_SEATBELT_EXECUTABLE: &str = "/usr/bin/sandbox-exec";

/// Program launched by `run` when no command is given.
pub const DEFAULT_COMMAND: &str = "copilot";

/// Tool-state and cache directories under the user's home that stay
/// writable in every profile.
const HOME_RELATIVE_WRITABLE_PATHS: &[&str] =
    &[".copilot", ".agents", ".npm", ".cache", "Library/Caches"];

/// Fixed writable roots outside the home directory.
const FIXED_WRITABLE_PATHS: &[&str] = &["/private/tmp", "/tmp"];

fn builtin_writable_paths(user_home: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = HOME_RELATIVE_WRITABLE_PATHS
        .iter()
        .map(|suffix| user_home.join(suffix))
        .collect();
    paths.extend(FIXED_WRITABLE_PATHS.iter().copied().map(PathBuf::from));
    paths
}

/// Escapes a path for interpolation into a double-quoted SBPL string
/// literal.
fn escape_policy_literal(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Structural acceptance check for an operator-authored profile
/// fragment: parentheses must balance. Parens inside double-quoted
/// string literals and `;` line comments do not count. Semantic
/// validation stays with `sandbox-exec` at launch time.
fn validate_profile_fragment(fragment: &str) -> bool {
    let mut depth: i64 = 0;
    let mut chars = fragment.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            '"' => {
                // Consume the string literal, honoring backslash escapes.
                loop {
                    match chars.next() {
                        Some('\\') => {
                            chars.next();
                        }
                        Some('"') | None => break,
                        Some(_) => {}
                    }
                }
            }
            ';' => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Reads and structurally validates `custom.sb`. A missing file is not
/// an error; an unbalanced one is, so a truncated fragment is caught
/// here instead of as a cryptic `sandbox-exec` failure.
fn read_custom_fragment(home: &SeatboxHome) -> std::io::Result<Option<String>> {
    let custom_file = home.custom_profile_file();
    let fragment = match std::fs::read_to_string(&custom_file) {
        Ok(fragment) => fragment,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if !validate_profile_fragment(&fragment) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "unbalanced parentheses in {}",
                custom_file.display()
            ),
        ));
    }
    Ok(Some(fragment))
}

/// Compiles the SBPL profile: base preamble, one literal subpath allow
/// per builtin path then per allowlisted folder, then the custom
/// fragment (if any) verbatim after exactly one blank line.
pub fn compile_profile(
    user_home: &Path,
    extra_folders: &[PathBuf],
    custom_fragment: Option<&str>,
) -> String {
    let mut profile = String::from(PERMISSIVE_OPEN_BASE_POLICY);
    for path in builtin_writable_paths(user_home)
        .iter()
        .chain(extra_folders.iter())
    {
        let literal = escape_policy_literal(&path.to_string_lossy());
        profile.push_str(&format!("(allow file-write* (subpath \"{literal}\"))\n"));
    }
    if let Some(fragment) = custom_fragment {
        profile.push('\n');
        profile.push_str(fragment);
    }
    profile
}

/// Argument vector handed to `sandbox-exec`: the profile file, the two
/// named parameter bindings referenced from the profile, then the
/// untouched command vector after `--`.
pub fn create_seatbelt_command_args(
    profile_file: &Path,
    project_dir: &Path,
    user_home: &Path,
    command: &[String],
) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        profile_file.to_string_lossy().to_string(),
        format!("-DPROJECT_DIR={}", project_dir.display()),
        format!("-DHOME={}", user_home.display()),
        "--".to_string(),
    ];
    args.extend(command.iter().cloned());
    args
}

/// Compiles the profile, persists it to `permissive-open.sb`, and runs
/// `command` under `sandbox-exec` with stdio inherited from the parent,
/// blocking until the child exits.
pub fn run_command_under_seatbelt(
    home: &SeatboxHome,
    project_dir: &Path,
    command: &[String],
) -> std::io::Result<ExitStatus> {
    home.ensure()?;
    let user_home = home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not find home directory",
        )
    })?;
    let extra_folders = load_folders(home)?;
    let custom_fragment = read_custom_fragment(home)?;
    let profile = compile_profile(&user_home, &extra_folders, custom_fragment.as_deref());

    let profile_file = home.profile_file();
    std::fs::write(&profile_file, &profile)?;
    tracing::debug!(
        "running {:?} under seatbelt profile {}",
        command,
        profile_file.display()
    );

    Command::new(MACOS_PATH_TO_SEATBELT_EXECUTABLE)
        .args(create_seatbelt_command_args(
            &profile_file,
            project_dir,
            &user_home,
            command,
        ))
        .status()
}

/// Maps the confined child's exit status onto our own. A child that
/// reports no exit code never maps to success: signal deaths become
/// `128 + signal` and anything else becomes 1.
pub fn exit_code_from_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
