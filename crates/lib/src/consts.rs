/// Deb packages the build environment needs, installed in this order.
pub const PACKAGES: &[&str] = &[
  "build-essential",
  "libgettextpo-dev",
  "debhelper",
  "fakeroot",
  "python3-launchpadlib",
  "python3-apt",
  "dput",
  "git",
  "devscripts",
  "lintian",
];

pub const DEFAULT_HOME: &str = "/home/ubuntu";
pub const DEFAULT_USER: &str = "ubuntu";
pub const CHECKOUT_DIRNAME: &str = "langpack-o-matic";
pub const LOGS_DIRNAME: &str = "logs";

/// Where install places the agent binary the crontab invokes.
pub const AGENT_PATH: &str = "/usr/local/bin/langpacks-agent";

pub const REPOSITORY_URL: &str = "https://git.launchpad.net/langpack-o-matic";
pub const REPOSITORY_BRANCH: &str = "master";
pub const TRANSLATIONS_URL: &str = "https://translations.launchpad.net/ubuntu";
pub const LAUNCHPAD_API_URL: &str = "https://api.launchpad.net/devel";

pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Threshold handed to the import script, identical for base and delta builds.
pub const IMPORT_THRESHOLD: u32 = 10;

/// Build-cache subdirectories of a release directory, cleared on base builds.
pub const CACHE_DIRS: &[&str] = &["sources-base", "sources-update"];

pub const UPLOAD_LOG: &str = "upload.log";

/// Sentinel release name resolved to the current development series.
pub const DEVEL_SERIES: &str = "devel";

/// Platform option naming the secret that holds the signing key.
pub const GPG_SECRET_CONFIG: &str = "gpg-secret-id";
/// Field of the signing-key secret holding the armored key.
pub const GPG_SECRET_FIELD: &str = "key";
