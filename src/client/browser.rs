//! Browser capabilities used by the locale context.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Current address bar contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    /// Split a relative URL into path and query. Fragments are dropped.
    pub fn parse(url: &str) -> Self {
        let url = url.split('#').next().unwrap_or_default();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string()).filter(|q| !q.is_empty())),
            None => (url, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self { path, query }
    }

    /// `path` with this location's query appended.
    pub fn with_path(&self, path: &str) -> String {
        match &self.query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        }
    }
}

/// What the locale context needs from the page it runs in.
pub trait Browser: Send + Sync {
    fn location(&self) -> Location;

    fn cookie(&self, name: &str) -> Option<String>;

    fn set_cookie(&self, name: &str, value: &str, max_age_days: i64);

    /// Navigate without adding a history entry.
    fn replace(&self, url: &str);

    /// Navigate, adding a history entry.
    fn push(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Replace(String),
    Push(String),
}

#[derive(Debug)]
struct MemoryState {
    location: Location,
    cookies: HashMap<String, String>,
    history: Vec<String>,
    navigations: Vec<Navigation>,
}

/// In-memory browser with a cookie store and history stack.
#[derive(Debug)]
pub struct MemoryBrowser {
    state: Mutex<MemoryState>,
}

impl MemoryBrowser {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                location: Location::parse(url),
                cookies: HashMap::new(),
                history: vec![url.to_string()],
                navigations: Vec::new(),
            }),
        }
    }

    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        self.lock().cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// Move the address bar without the context's involvement (typing a URL,
    /// back/forward).
    pub fn visit(&self, url: &str) {
        self.lock().location = Location::parse(url);
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.lock().navigations.clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Browser for MemoryBrowser {
    fn location(&self) -> Location {
        self.lock().location.clone()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.lock().cookies.get(name).cloned()
    }

    fn set_cookie(&self, name: &str, value: &str, _max_age_days: i64) {
        self.lock().cookies.insert(name.to_string(), value.to_string());
    }

    fn replace(&self, url: &str) {
        let mut state = self.lock();
        state.location = Location::parse(url);
        if let Some(last) = state.history.last_mut() {
            *last = url.to_string();
        }
        state.navigations.push(Navigation::Replace(url.to_string()));
    }

    fn push(&self, url: &str) {
        let mut state = self.lock();
        state.location = Location::parse(url);
        state.history.push(url.to_string());
        state.navigations.push(Navigation::Push(url.to_string()));
    }
}
