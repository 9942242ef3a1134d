//! Precache manifest.

use std::collections::HashSet;

use url::Url;
use zakatek_core::{AppConfig, Error, Request};

use crate::fetch::resolve;

/// Ordered list of locators fetched and stored at install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    locators: Vec<String>,
}

impl PrecacheManifest {
    pub fn new<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { locators: locators.into_iter().map(Into::into).collect() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.precache.iter().cloned())
    }

    pub fn locators(&self) -> &[String] {
        &self.locators
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Resolve every locator against `origin` into a `GET` request.
    ///
    /// Order is preserved. Fails on the first locator that does not resolve,
    /// or when two locators end up describing the same request.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<(String, Request)>, Error> {
        let mut seen = HashSet::with_capacity(self.locators.len());
        let mut requests = Vec::with_capacity(self.locators.len());

        for locator in &self.locators {
            let url = resolve(origin, locator)?;
            if !seen.insert(url.to_string()) {
                return Err(Error::DuplicateRequest(format!("{locator} resolves to {url} more than once")));
            }
            requests.push((locator.clone(), Request::get(url)));
        }

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    #[test]
    fn test_resolve_preserves_order() {
        let manifest = PrecacheManifest::new(["/", "/index.html", "https://fonts.googleapis.com/css2?family=Poppins"]);
        let resolved = manifest.resolve(&origin()).unwrap();
        let urls: Vec<_> = resolved.iter().map(|(_, r)| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:8080/",
                "http://localhost:8080/index.html",
                "https://fonts.googleapis.com/css2?family=Poppins",
            ]
        );
        assert!(resolved.iter().all(|(_, r)| r.is_get()));
    }

    #[test]
    fn test_default_manifest_resolves() {
        let manifest = PrecacheManifest::from_config(&AppConfig::default());
        assert_eq!(manifest.len(), 12);
        assert!(manifest.resolve(&origin()).is_ok());
    }

    #[test]
    fn test_resolve_rejects_duplicates() {
        let manifest = PrecacheManifest::new(["/index.html", "http://localhost:8080/index.html#top"]);
        assert!(matches!(manifest.resolve(&origin()), Err(Error::DuplicateRequest(_))));
    }

    #[test]
    fn test_resolve_rejects_bad_locator() {
        let manifest = PrecacheManifest::new(["/", "mailto:biuro@example.org"]);
        assert!(matches!(manifest.resolve(&origin()), Err(Error::InvalidUrl(_))));
    }
}
