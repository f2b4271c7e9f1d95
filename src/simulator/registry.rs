/// Shared registry of usernames claimed by simulated users.
use std::sync::Mutex;

const USERNAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Process-wide list of usernames that logged in successfully.
///
/// The membership check in `generate` and the later `claim` are separate
/// calls, so two sessions can still race to the same name. The registry only
/// attempts to avoid collisions; it does not guarantee uniqueness.
#[derive(Debug, Default)]
pub struct UsernameRegistry {
    claimed: Mutex<Vec<String>>,
}

impl UsernameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a random username not currently claimed.
    pub fn generate(&self, length: usize) -> String {
        let mut name = random_username(length);
        while self.contains(&name) {
            name = random_username(length);
        }
        name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|claimed| claimed == name)
    }

    /// Record a username that completed its login.
    pub fn claim(&self, name: String) {
        self.lock().push(name);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Pick a random claimed username, preferring one other than `exclude`.
    /// Falls back to any claimed name (possibly `exclude` itself) when no
    /// other user has logged in yet.
    pub fn random_peer(&self, exclude: &str) -> Option<String> {
        let claimed = self.lock();
        if claimed.is_empty() {
            return None;
        }

        let others: Vec<&String> = claimed.iter().filter(|name| *name != exclude).collect();
        if others.is_empty() {
            Some(claimed[fastrand::usize(..claimed.len())].clone())
        } else {
            Some(others[fastrand::usize(..others.len())].clone())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Generate a fixed-length lowercase-alphanumeric username.
pub fn random_username(length: usize) -> String {
    (0..length)
        .map(|_| USERNAME_CHARSET[fastrand::usize(..USERNAME_CHARSET.len())] as char)
        .collect()
}
