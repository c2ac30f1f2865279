//! Client locale context.
//!
//! # Responsibilities
//! - Re-derive the language after each page load from the URL and cookie
//! - Correct unprefixed URLs with a single history replace
//! - Switch languages on request, one switch at a time
//! - Build language-qualified links
//!
//! # Design Decisions
//! - Same precedence as the server resolver, minus the header it cannot see
//! - A URL that already carries a language is adopted, never navigated
//! - The in-flight guard is released by the next `mount`, i.e. once the
//!   switch navigation has landed

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::client::browser::{Browser, Location};
use crate::config::LocaleConfig;
use crate::locale::{resolve, LanguageCode, LanguageError, Languages, Resolution};
use crate::routing::classifier::{localize_path, split_language_prefix, ClassifiedPath};

/// What `mount` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// State already matched the page.
    InSync,
    /// State updated to the language in the URL; no navigation.
    Adopted(LanguageCode),
    /// URL lacked a language; replaced with this one.
    Corrected(String),
}

/// What `set_language` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched(String),
    /// Another switch has not landed yet.
    InFlight,
    AlreadyActive,
    Unsupported,
}

pub struct LocaleContext<B> {
    browser: B,
    languages: Languages,
    cookie_name: String,
    cookie_max_age_days: i64,
    current: RwLock<LanguageCode>,
    switching: AtomicBool,
}

impl<B: Browser> LocaleContext<B> {
    pub fn new(browser: B, config: &LocaleConfig) -> Result<Self, LanguageError> {
        let languages = Languages::from_config(config)?;
        let (_, resolution) = derive(&browser, &languages, &config.cookie_name);
        Ok(Self {
            browser,
            languages,
            cookie_name: config.cookie_name.clone(),
            cookie_max_age_days: config.cookie_max_age_days,
            current: RwLock::new(resolution.language),
            switching: AtomicBool::new(false),
        })
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn language(&self) -> LanguageCode {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_switching(&self) -> bool {
        self.switching.load(Ordering::SeqCst)
    }

    /// Reconcile state with the loaded page. Call once per navigation.
    pub fn mount(&self) -> Reconciliation {
        self.switching.store(false, Ordering::SeqCst);

        let location = self.browser.location();
        let (classified, resolution) = derive(&self.browser, &self.languages, &self.cookie_name);

        if classified.has_language_prefix || classified.resource_path == "/" {
            let previous = self.set_current(resolution.language.clone());
            if previous == resolution.language {
                Reconciliation::InSync
            } else {
                Reconciliation::Adopted(resolution.language)
            }
        } else {
            let url = location.with_path(&localize_path(
                &resolution.language,
                &classified.resource_path,
            ));
            tracing::debug!(url = %url, "Correcting unprefixed location");
            self.browser.replace(&url);
            self.set_current(resolution.language);
            Reconciliation::Corrected(url)
        }
    }

    /// Switch to `raw`, persisting it and replacing the current history entry.
    pub fn set_language(&self, raw: &str) -> SwitchOutcome {
        let Some(target) = self.languages.get(raw) else {
            return SwitchOutcome::Unsupported;
        };
        if self.is_switching() {
            return SwitchOutcome::InFlight;
        }
        if self.language() == target {
            return SwitchOutcome::AlreadyActive;
        }
        if self
            .switching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SwitchOutcome::InFlight;
        }

        self.browser
            .set_cookie(&self.cookie_name, target.as_str(), self.cookie_max_age_days);
        self.set_current(target.clone());

        let location = self.browser.location();
        let classified = split_language_prefix(&self.languages, &location.path);
        let url = location.with_path(&localize_path(&target, &classified.resource_path));
        self.browser.replace(&url);

        SwitchOutcome::Switched(url)
    }

    /// Language-qualified link for an in-app path (query allowed).
    pub fn href(&self, path: &str) -> String {
        let location = Location::parse(path);
        let classified = split_language_prefix(&self.languages, &location.path);
        location.with_path(&localize_path(&self.language(), &classified.resource_path))
    }

    /// Push a language-qualified path onto the history.
    pub fn navigate(&self, path: &str) -> String {
        let url = self.href(path);
        self.browser.push(&url);
        url
    }

    fn set_current(&self, language: LanguageCode) -> LanguageCode {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, language)
    }
}

fn derive<B: Browser>(
    browser: &B,
    languages: &Languages,
    cookie_name: &str,
) -> (ClassifiedPath, Resolution) {
    let location = browser.location();
    let classified = split_language_prefix(languages, &location.path);
    let stored = browser.cookie(cookie_name);
    let resolution = resolve(languages, &classified, stored.as_deref(), None);
    (classified, resolution)
}
