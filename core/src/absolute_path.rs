use dirs::home_dir;
use path_absolutize::Absolutize;
use std::path::Path;
use std::path::PathBuf;

/// Expands a leading `~` to the user's home directory. The shorthand is
/// anchored: only `~` alone or a `~/` prefix is rewritten, a `~`
/// appearing later in the path is left untouched.
fn maybe_expand_home_directory(path: &Path) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(home) = home_dir() {
        if path_str == "~" {
            return home;
        }
        if let Some(rest) = path_str.strip_prefix("~/") {
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                return home;
            }
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Resolves a user-supplied path to an absolute, lexically normalized
/// path: `~` is expanded, relative paths are resolved against the
/// current working directory, and `.`/`..` segments are collapsed.
///
/// No existence check is performed; the result may not exist on disk.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> std::io::Result<PathBuf> {
    let expanded = maybe_expand_home_directory(path.as_ref());
    let absolute = expanded.absolutize()?;
    Ok(absolute.into_owned())
}

/// Like [`normalize_path`], but relative paths resolve against an
/// explicit base directory instead of the process cwd.
pub fn normalize_path_against_base<P: AsRef<Path>, B: AsRef<Path>>(
    path: P,
    base: B,
) -> std::io::Result<PathBuf> {
    let expanded = maybe_expand_home_directory(path.as_ref());
    let absolute = expanded.absolutize_from(base.as_ref())?;
    Ok(absolute.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn home_shorthand_is_expanded() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(normalize_path("~").expect("normalize"), home);
        assert_eq!(normalize_path("~/code").expect("normalize"), home.join("code"));
    }

    #[test]
    fn home_shorthand_with_double_slash_is_expanded() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(normalize_path("~//code").expect("normalize"), home.join("code"));
    }

    #[test]
    fn mid_path_tilde_is_not_expanded() {
        let normalized = normalize_path_against_base("data/~backup", "/base").expect("normalize");
        assert_eq!(normalized, PathBuf::from("/base/data/~backup"));
    }

    #[test]
    fn tilde_prefix_without_slash_is_not_expanded() {
        let normalized = normalize_path_against_base("~user/code", "/base").expect("normalize");
        assert_eq!(normalized, PathBuf::from("/base/~user/code"));
    }

    #[test]
    fn relative_path_resolves_against_base() {
        let normalized = normalize_path_against_base("proj", "/srv/work").expect("normalize");
        assert_eq!(normalized, PathBuf::from("/srv/work/proj"));
    }

    #[test]
    fn dot_segments_are_collapsed() {
        let normalized =
            normalize_path_against_base("a/./b/../c", "/srv/work").expect("normalize");
        assert_eq!(normalized, PathBuf::from("/srv/work/a/c"));
    }

    #[test]
    fn absolute_path_ignores_base() {
        let normalized = normalize_path_against_base("/etc/hosts", "/srv/work").expect("normalize");
        assert_eq!(normalized, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn home_expansion_matches_manual_substitution() {
        let Some(home) = home_dir() else {
            return;
        };
        let normalized = normalize_path("~/a/../b").expect("normalize");
        let manual = normalize_path(home.join("a/../b")).expect("normalize");
        assert_eq!(normalized, manual);
        assert_eq!(normalized, home.join("b"));
    }
}
