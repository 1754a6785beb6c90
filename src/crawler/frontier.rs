//! The crawl frontier
//!
//! A FIFO of pending URLs plus the queued and visited sets. Every URL is
//! normalized before it is looked at, so the sets are keyed by the same
//! identity the index uses. The frontier does no I/O; the worker pool
//! serializes access to it behind the job's single lock.

use crate::locale::{LocaleClassifier, LocaleScope};
use crate::url::{DomainScope, UrlFilter, UrlNormalizer};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Added to the back of the queue
    Queued,
    /// Already queued or visited
    Duplicate,
    /// Host outside the job's domain scope
    OutOfScope,
    /// Path contains an excluded segment (admin, login, cart, ...)
    ExcludedPath,
    /// Points at a file type that is never crawled
    ExcludedExtension,
    /// Outside the job's locale scope
    LocaleFiltered,
    /// Could not be normalized
    Invalid,
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

/// Crawl queue with at-most-once enqueue and at-most-once visit per URL
#[derive(Debug)]
pub struct Frontier {
    normalizer: UrlNormalizer,
    filter: UrlFilter,
    scope: DomainScope,
    classifier: LocaleClassifier,
    locale_scope: LocaleScope,
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `scope` - Hosts the job may visit
    /// * `normalizer` - Produces the identity key of each URL
    /// * `filter` - Excluded path segments and extensions
    /// * `classifier` - Locale detection for the locale filter
    /// * `locale_scope` - Which locales the job covers
    pub fn new(
        scope: DomainScope,
        normalizer: UrlNormalizer,
        filter: UrlFilter,
        classifier: LocaleClassifier,
        locale_scope: LocaleScope,
    ) -> Self {
        Self {
            normalizer,
            filter,
            scope,
            classifier,
            locale_scope,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Offers a discovered link to the frontier
    ///
    /// Rejects, in order: unparsable input, other hosts, excluded paths,
    /// excluded extensions, and URLs outside the locale scope. Anything left
    /// is queued unless it was queued or visited before.
    pub fn enqueue(&mut self, href: &str) -> EnqueueOutcome {
        let url = match self.normalizer.normalize_absolute(href) {
            Ok(url) => url,
            Err(_) => return EnqueueOutcome::Invalid,
        };

        if !self.scope.contains(&url) {
            return EnqueueOutcome::OutOfScope;
        }
        if self.filter.is_excluded_path(&url) {
            return EnqueueOutcome::ExcludedPath;
        }
        if self.filter.has_excluded_extension(&url) {
            return EnqueueOutcome::ExcludedExtension;
        }
        let code = self.classifier.extract_locale(&url);
        if !self.locale_scope.accepts(code.as_deref()) {
            return EnqueueOutcome::LocaleFiltered;
        }

        self.push(url)
    }

    /// Queues a start URL, bypassing scope and exclusion checks
    ///
    /// Used for the job's root and for explicit incremental URL lists.
    pub fn seed(&mut self, href: &str) -> EnqueueOutcome {
        match self.normalizer.normalize_absolute(href) {
            Ok(url) => self.push(url),
            Err(_) => EnqueueOutcome::Invalid,
        }
    }

    fn push(&mut self, url: Url) -> EnqueueOutcome {
        let key = url.as_str();
        if self.queued.contains(key) || self.visited.contains(key) {
            return EnqueueOutcome::Duplicate;
        }
        self.queued.insert(key.to_string());
        self.queue.push_back(url);
        EnqueueOutcome::Queued
    }

    /// Pops the head of the queue
    pub fn dequeue(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    /// Moves a URL from the queued set to the visited set; idempotent
    pub fn mark_visited(&mut self, url: &Url) {
        let key = url.as_str();
        self.queued.remove(key);
        self.visited.insert(key.to_string());
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier(locale_scope: LocaleScope) -> Frontier {
        let start = Url::parse("https://example.com/").unwrap();
        Frontier::new(
            DomainScope::new(&start, None).unwrap(),
            UrlNormalizer::default(),
            UrlFilter::default(),
            LocaleClassifier::new(["de", "fr"], false, false),
            locale_scope,
        )
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut f = frontier(LocaleScope::All);
        assert_eq!(f.enqueue("https://example.com/about"), EnqueueOutcome::Queued);
        assert_eq!(f.enqueue("https://example.com/about"), EnqueueOutcome::Duplicate);
        assert_eq!(f.enqueue("https://example.com/about/#team"), EnqueueOutcome::Duplicate);
        assert_eq!(f.enqueue("https://example.com/about?utm_source=x"), EnqueueOutcome::Duplicate);
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_visited_urls_are_not_requeued() {
        let mut f = frontier(LocaleScope::All);
        f.enqueue("https://example.com/a");
        let url = f.dequeue().unwrap();
        f.mark_visited(&url);
        f.mark_visited(&url);

        assert!(f.is_visited(&url));
        assert_eq!(f.visited_count(), 1);
        assert_eq!(f.enqueue("https://example.com/a/"), EnqueueOutcome::Duplicate);
        assert!(f.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut f = frontier(LocaleScope::All);
        for path in ["a", "b", "c"] {
            f.enqueue(&format!("https://example.com/{}", path));
        }
        let order: Vec<_> = std::iter::from_fn(|| f.dequeue())
            .map(|u| u.path().to_string())
            .collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_rejections() {
        let mut f = frontier(LocaleScope::All);
        assert_eq!(f.enqueue("https://other.com/"), EnqueueOutcome::OutOfScope);
        assert_eq!(f.enqueue("https://example.com/wp-admin/x"), EnqueueOutcome::ExcludedPath);
        assert_eq!(f.enqueue("https://example.com/doc.pdf"), EnqueueOutcome::ExcludedExtension);
        assert_eq!(f.enqueue("mailto:x@example.com"), EnqueueOutcome::Invalid);
        assert!(f.is_empty());
    }

    #[test]
    fn test_locale_scope_code() {
        let mut f = frontier(LocaleScope::Code("de".into()));
        assert_eq!(f.enqueue("https://example.com/de/kontakt"), EnqueueOutcome::Queued);
        assert_eq!(f.enqueue("https://example.com/fr/contact"), EnqueueOutcome::LocaleFiltered);
        assert_eq!(f.enqueue("https://example.com/contact"), EnqueueOutcome::LocaleFiltered);
    }

    #[test]
    fn test_locale_scope_default() {
        let mut f = frontier(LocaleScope::Default);
        assert_eq!(f.enqueue("https://example.com/contact"), EnqueueOutcome::Queued);
        assert_eq!(f.enqueue("https://example.com/de/kontakt"), EnqueueOutcome::LocaleFiltered);
    }

    #[test]
    fn test_seed_bypasses_filters() {
        let mut f = frontier(LocaleScope::Code("de".into()));
        assert_eq!(f.seed("https://example.com/"), EnqueueOutcome::Queued);
        assert_eq!(f.seed("https://example.com"), EnqueueOutcome::Duplicate);
        assert_eq!(f.seed("::"), EnqueueOutcome::Invalid);
    }
}
