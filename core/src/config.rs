use dirs::home_dir;
use std::path::Path;
use std::path::PathBuf;

const FOLDERS_FILE_NAME: &str = "folders";
const PROFILE_FILE_NAME: &str = "permissive-open.sb";
const CUSTOM_PROFILE_FILE_NAME: &str = "custom.sb";

/// Filesystem locations for one seatbox installation, resolved once at
/// startup and passed explicitly to every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatboxHome {
    config_dir: PathBuf,
}

impl SeatboxHome {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Newline-delimited allowlist of extra writable folders.
    pub fn folders_file(&self) -> PathBuf {
        self.config_dir.join(FOLDERS_FILE_NAME)
    }

    /// Compiled SBPL profile, rewritten on every `run`.
    pub fn profile_file(&self) -> PathBuf {
        self.config_dir.join(PROFILE_FILE_NAME)
    }

    /// Optional operator-authored profile fragment. Only ever read.
    pub fn custom_profile_file(&self) -> PathBuf {
        self.config_dir.join(CUSTOM_PROFILE_FILE_NAME)
    }

    /// Idempotently creates the config directory and an empty allowlist
    /// file if one does not exist yet.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let folders_file = self.folders_file();
        if !folders_file.exists() {
            std::fs::write(&folders_file, "")?;
        }
        Ok(())
    }
}

/// Returns the seatbox configuration directory. When `XDG_CONFIG_HOME`
/// is set and non-empty it re-bases the config root; otherwise the
/// default is `~/.config/seatbox`.
pub fn find_seatbox_home() -> std::io::Result<SeatboxHome> {
    let xdg_config_home = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|val| !val.is_empty());
    find_seatbox_home_from_env(xdg_config_home.as_deref())
}

fn find_seatbox_home_from_env(xdg_config_home: Option<&str>) -> std::io::Result<SeatboxHome> {
    let base = match xdg_config_home {
        Some(val) => PathBuf::from(val),
        None => {
            let home = home_dir().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not find home directory",
                )
            })?;
            home.join(".config")
        }
    };
    Ok(SeatboxHome::new(base.join("seatbox")))
}
