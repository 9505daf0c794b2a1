//! Property-test run profile read from environment overrides.
//!
//! Every property suite in the workspace builds its proptest configuration
//! from this profile so CI can scale case counts and enable forking in one
//! place.

use std::env;

/// Environment variable controlling proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable controlling proptest process forking.
pub const DENDRO_PBT_FORK_ENV_KEY: &str = "DENDRO_PBT_FORK";

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Loads a profile from the process environment, falling back to the
    /// provided defaults for unset or invalid overrides.
    ///
    /// # Examples
    ///
    /// ```
    /// use dendro_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::from_lookup(default_cases, default_fork, |key| env::var(key).ok())
    }

    /// Loads a profile from an arbitrary key lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use dendro_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::from_lookup(64, false, |key| {
    ///     (key == "PROGTEST_CASES").then(|| "512".to_owned())
    /// });
    /// assert_eq!(profile.cases(), 512);
    /// assert!(!profile.fork());
    /// ```
    #[must_use]
    pub fn from_lookup(
        default_cases: u32,
        default_fork: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            cases: Override::new(PROGTEST_CASES_ENV_KEY, lookup(PROGTEST_CASES_ENV_KEY))
                .resolve(default_cases, parse_cases),
            fork: Override::new(DENDRO_PBT_FORK_ENV_KEY, lookup(DENDRO_PBT_FORK_ENV_KEY))
                .resolve(default_fork, parse_flag),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether to run proptest cases in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

struct Override {
    key: &'static str,
    raw: Option<String>,
}

impl Override {
    fn new(key: &'static str, raw: Option<String>) -> Self {
        Self { key, raw }
    }

    fn resolve<T>(self, default: T, parse: fn(&str) -> Result<T, &'static str>) -> T {
        let Some(raw) = self.raw else {
            return default;
        };
        parse(&raw).unwrap_or_else(|reason| {
            tracing::warn!(
                env = self.key,
                raw = %raw,
                reason,
                "ignoring invalid property-test override",
            );
            default
        })
    }
}

fn parse_cases(raw: &str) -> Result<u32, &'static str> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be positive"),
        Ok(cases) => Ok(cases),
        Err(_) => Err("cases must be an unsigned integer"),
    }
}

fn parse_flag(raw: &str) -> Result<bool, &'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected one of true/false/1/0/yes/no/on/off"),
    }
}
