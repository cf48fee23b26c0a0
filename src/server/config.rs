//! Spectator Configuration

/// Repositories game metadata may be served from by default.
pub const DEFAULT_REPOSITORIES: &[&str] = &["games.ggp.org", "ggp-repository.appspot.com"];

/// Spectator server configuration.
#[derive(Clone, Debug)]
pub struct SpectatorConfig {
    /// Hosts `gameMetaURL` may point at. Empty accepts any host.
    pub allowed_repositories: Vec<String>,
    /// Number of recently updated matches the activity feed keeps.
    pub feed_capacity: usize,
    /// Buffer size of the update notification channel.
    pub notify_capacity: usize,
}

impl Default for SpectatorConfig {
    fn default() -> Self {
        Self {
            allowed_repositories: DEFAULT_REPOSITORIES.iter().map(|s| s.to_string()).collect(),
            feed_capacity: 100,
            notify_capacity: 256,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl SpectatorConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allowed_repositories: std::env::var("SPECTATOR_ALLOWED_REPOSITORIES")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.allowed_repositories),
            feed_capacity: std::env::var("SPECTATOR_FEED_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.feed_capacity),
            notify_capacity: std::env::var("SPECTATOR_NOTIFY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.notify_capacity),
        }
    }

    /// Accept every repository.
    pub fn allow_any_repository(mut self) -> Self {
        self.allowed_repositories.clear();
        self
    }

    /// May a match be hosted against this repository host?
    pub fn is_repository_allowed(&self, host: &str) -> bool {
        self.allowed_repositories.is_empty()
            || self
                .allowed_repositories
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}
