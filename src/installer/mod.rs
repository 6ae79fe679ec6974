//! Installer strategy selection.
//!
//! An item's `via` field is classified exactly once into an
//! [`InstallerStrategy`], in fixed priority order: package manager, then URL,
//! then raw shell command.
pub mod artifact;

use std::fmt;

use url::Url;

/// Package managers recognised in `via`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Homebrew formulae (`brew install <name>`).
    Brew,
    /// Homebrew casks (`brew cask install <name>`).
    BrewCask,
}

impl PackageManager {
    /// Match `via` case-insensitively against `brew` and `brew-cask`.
    #[must_use]
    pub fn parse(via: &str) -> Option<Self> {
        if via.eq_ignore_ascii_case("brew") {
            Some(Self::Brew)
        } else if via.eq_ignore_ascii_case("brew-cask") {
            Some(Self::BrewCask)
        } else {
            None
        }
    }

    /// Program that must be on PATH for this manager.
    #[must_use]
    pub const fn program(self) -> &'static str {
        "brew"
    }

    /// Argument vector installing `name`.
    #[must_use]
    pub fn install_argv(self, name: &str) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Brew => &["brew", "install"],
            Self::BrewCask => &["brew", "cask", "install"],
        };
        args.iter()
            .map(ToString::to_string)
            .chain(std::iter::once(name.to_string()))
            .collect()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brew => write!(f, "brew"),
            Self::BrewCask => write!(f, "brew-cask"),
        }
    }
}

/// How an item is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerStrategy {
    /// Install through a package manager, without a shell.
    PackageManager(PackageManager),
    /// Download an archive, extract it, and copy the application bundle.
    UrlArtifact(Url),
    /// Run `via` verbatim through the shell.
    ///
    /// The command is not inspected or sanitized; a manifest can run anything
    /// the invoking user can.
    RawCommand(String),
}

/// A command line ready for [`Executor::execute`](crate::exec::Executor::execute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Program and arguments.
    pub argv: Vec<String>,
    /// Whether the line is handed to the shell.
    pub use_shell: bool,
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

impl InstallerStrategy {
    /// Classify a `via` descriptor.
    ///
    /// A URL needs both a scheme and a host; anything else that is not a
    /// package manager is a raw command.
    #[must_use]
    pub fn classify(via: &str) -> Self {
        if let Some(pm) = PackageManager::parse(via) {
            return Self::PackageManager(pm);
        }
        if let Ok(url) = Url::parse(via)
            && url.host_str().is_some_and(|h| !h.is_empty())
        {
            return Self::UrlArtifact(url);
        }
        Self::RawCommand(via.to_string())
    }

    /// The command that installs `name`, or `None` for URL artifacts, which
    /// are installed in-process.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<InstallCommand> {
        match self {
            Self::PackageManager(pm) => Some(InstallCommand {
                argv: pm.install_argv(name),
                use_shell: false,
            }),
            Self::RawCommand(line) => Some(InstallCommand {
                argv: vec![line.clone()],
                use_shell: true,
            }),
            Self::UrlArtifact(_) => None,
        }
    }
}

impl fmt::Display for InstallerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageManager(pm) => write!(f, "{pm}"),
            Self::UrlArtifact(url) => write!(f, "{url}"),
            Self::RawCommand(line) => write!(f, "`{line}`"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn brew_is_case_insensitive() {
        for via in ["brew", "Brew", "BREW"] {
            assert_eq!(
                InstallerStrategy::classify(via),
                InstallerStrategy::PackageManager(PackageManager::Brew)
            );
        }
        assert_eq!(
            InstallerStrategy::classify("Brew-Cask"),
            InstallerStrategy::PackageManager(PackageManager::BrewCask)
        );
    }

    #[test]
    fn brew_pattern_is_anchored() {
        assert!(matches!(
            InstallerStrategy::classify("brew install wget"),
            InstallerStrategy::RawCommand(_)
        ));
        assert!(matches!(
            InstallerStrategy::classify("brewery"),
            InstallerStrategy::RawCommand(_)
        ));
    }

    #[test]
    fn brew_command_has_no_shell() {
        let cmd = InstallerStrategy::classify("brew").command("wget").unwrap();
        assert_eq!(cmd.argv, vec!["brew", "install", "wget"]);
        assert!(!cmd.use_shell);
    }

    #[test]
    fn brew_cask_command() {
        let cmd = InstallerStrategy::classify("brew-cask")
            .command("iterm2")
            .unwrap();
        assert_eq!(cmd.argv, vec!["brew", "cask", "install", "iterm2"]);
        assert!(!cmd.use_shell);
        assert_eq!(cmd.to_string(), "brew cask install iterm2");
    }

    #[test]
    fn url_needs_scheme_and_host() {
        let strategy = InstallerStrategy::classify("https://example.com/dl/Tool.zip");
        assert!(matches!(strategy, InstallerStrategy::UrlArtifact(_)));
        assert!(strategy.command("tool").is_none());

        assert!(matches!(
            InstallerStrategy::classify("mailto:someone@example.com"),
            InstallerStrategy::RawCommand(_)
        ));
        assert!(matches!(
            InstallerStrategy::classify("file:///tmp/Tool.zip"),
            InstallerStrategy::RawCommand(_)
        ));
    }

    #[test]
    fn anything_else_is_a_raw_shell_command() {
        let via = "curl -fsSL https://example.com/install.sh | sh";
        let strategy = InstallerStrategy::classify(via);
        let cmd = strategy.command("ignored").unwrap();
        assert_eq!(cmd.argv, vec![via]);
        assert!(cmd.use_shell);
    }

    #[test]
    fn display_names_the_strategy() {
        assert_eq!(InstallerStrategy::classify("brew").to_string(), "brew");
        assert_eq!(
            InstallerStrategy::classify("echo hi").to_string(),
            "`echo hi`"
        );
    }
}
