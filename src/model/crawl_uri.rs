use crate::model::attributes::{AttributeBag, AttributeRegistry};
use crate::model::fetch_status::FetchStatus;
use crate::model::hop::{Hop, SchedulingDirective};
use crate::{UriError, UriResult};
use chrono::{DateTime, Utc};
use url::Url;

/// A link discovered while processing a page, before scope filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Raw link target as found in the document
    pub target: String,

    /// Hop type relative to the discovering page
    pub hop: Hop,

    /// Context of the discovery (element/attribute, redirect header, ...)
    pub context: Option<String>,
}

/// One URI's crawl-attempt record: the frontier's unit of work
///
/// A CrawlURI is created at discovery, admitted at most once by the
/// already-seen filter, and then owned by exactly one place at a time: a
/// work queue, the outbound channel, or a fetch worker. The URI itself is
/// immutable for the object's lifetime; the class key and ordinal are each
/// assigned exactly once by the manager.
#[derive(Debug, Clone)]
pub struct CrawlURI {
    /// The absolute URI (immutable)
    uri: Url,

    /// One hop character per step from the seed that led here
    pub path_from_seed: String,

    /// The referring URI, if any
    pub via: Option<Url>,

    /// Context of the discovery within the referrer
    pub via_context: Option<String>,

    /// Coarse priority class
    pub scheduling_directive: SchedulingDirective,

    /// Queue assignment; set once by the manager
    class_key: Option<String>,

    /// Fine-grained priority within the directive class
    pub precedence: i32,

    /// Process-wide strictly increasing sequence number; assigned at first
    /// scheduling, 0 until then
    ordinal: u64,

    /// Outcome of the most recent attempt
    pub fetch_status: FetchStatus,

    /// Number of completed fetch attempts
    pub fetch_attempts: u32,

    /// Number of times the fetch was deferred
    pub deferrals: u32,

    /// When the most recent fetch began
    pub fetch_began: Option<DateTime<Utc>>,

    /// When the most recent fetch completed
    pub fetch_completed: Option<DateTime<Utc>>,

    /// Bytes transferred in the most recent fetch
    pub content_size: u64,

    /// Declared content length, when the server sent one
    pub content_length: Option<u64>,

    /// Digest of the fetched content
    pub content_digest: Option<String>,

    /// Set by the worker when a 401 response gained usable credential
    /// material, making one more attempt worthwhile
    pub retry_with_credentials: bool,

    /// Bypass the already-seen filter when scheduling
    pub force_fetch: bool,

    /// Whether link extraction ran for the current pass
    pub link_extraction_finished: bool,

    /// Open per-processor state
    pub attributes: AttributeBag,

    /// Outbound links found in the fetched content, pre-scope-filtering
    pub discovered: Vec<DiscoveredLink>,
}

impl CrawlURI {
    /// Creates a work item for an already-parsed URI
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            path_from_seed: String::new(),
            via: None,
            via_context: None,
            scheduling_directive: SchedulingDirective::Normal,
            class_key: None,
            precedence: 0,
            ordinal: 0,
            fetch_status: FetchStatus::Unattempted,
            fetch_attempts: 0,
            deferrals: 0,
            fetch_began: None,
            fetch_completed: None,
            content_size: 0,
            content_length: None,
            content_digest: None,
            retry_with_credentials: false,
            force_fetch: false,
            link_extraction_finished: false,
            attributes: AttributeBag::new(),
            discovered: Vec::new(),
        }
    }

    /// Parses and creates a work item, rejecting malformed URIs
    pub fn parse(uri: &str) -> UriResult<Self> {
        let url = Url::parse(uri).map_err(|e| UriError::Parse(format!("{uri}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UriError::InvalidScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(UriError::MissingAuthority);
        }
        Ok(Self::new(url))
    }

    /// Creates a seed work item (empty hop path, no via)
    pub fn seed(uri: Url) -> Self {
        Self::new(uri)
    }

    /// The URI this record is about
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The queue this URI was assigned to, once the manager has done so
    pub fn class_key(&self) -> Option<&str> {
        self.class_key.as_deref()
    }

    /// Assigns the class key. Called exactly once by the manager; the key
    /// must not change while the item is queued or in flight.
    pub(crate) fn set_class_key(&mut self, key: String) {
        debug_assert!(self.class_key.is_none(), "class key assigned twice");
        self.class_key = Some(key);
    }

    /// The breadth-first ordering sequence number (0 until scheduled)
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Assigns the ordinal. Called exactly once by the manager at first
    /// scheduling.
    pub(crate) fn assign_ordinal(&mut self, ordinal: u64) {
        debug_assert_eq!(self.ordinal, 0, "ordinal assigned twice");
        self.ordinal = ordinal;
    }

    /// Number of hops from the seed that led to this URI
    pub fn hop_count(&self) -> usize {
        self.path_from_seed.len()
    }

    /// Marks the beginning of a fetch attempt. Workers call this just before
    /// network activity starts.
    pub fn mark_fetch_began(&mut self) {
        self.fetch_began = Some(Utc::now());
        self.fetch_completed = None;
    }

    /// Marks the end of a fetch attempt
    pub fn mark_fetch_completed(&mut self) {
        self.fetch_completed = Some(Utc::now());
    }

    /// Duration of the most recent fetch in milliseconds, when both
    /// timestamps are present
    pub fn fetch_duration_ms(&self) -> Option<u64> {
        let began = self.fetch_began?;
        let completed = self.fetch_completed?;
        let ms = (completed - began).num_milliseconds();
        if ms < 0 {
            None
        } else {
            Some(ms as u64)
        }
    }

    /// Records an outbound link discovered in the fetched content
    pub fn add_discovered(&mut self, target: impl Into<String>, hop: Hop, context: Option<String>) {
        self.discovered.push(DiscoveredLink {
            target: target.into(),
            hop,
            context,
        });
    }

    /// Derives a child work item for a discovered URI
    ///
    /// The child's hop path extends this URI's path by one character, its
    /// `via` points back here, and heritable attributes are copied over.
    /// Embeds and preconditions are promoted to `Medium` so a page's
    /// resources are fetched near the page itself; redirects keep the
    /// parent's directive.
    pub fn make_child(
        &self,
        uri: Url,
        hop: Hop,
        context: Option<String>,
        registry: &AttributeRegistry,
    ) -> CrawlURI {
        let mut child = CrawlURI::new(uri);
        child.path_from_seed = format!("{}{}", self.path_from_seed, hop.as_char());
        child.via = Some(self.uri.clone());
        child.via_context = context;
        child.scheduling_directive = match hop {
            Hop::Embed | Hop::SpeculativeEmbed | Hop::Precondition => SchedulingDirective::Medium,
            Hop::Redirect => self.scheduling_directive,
            Hop::Link => SchedulingDirective::Normal,
        };
        self.attributes.inherit_into(&mut child.attributes, registry);
        child
    }

    /// Promotes a discovered link into a candidate child, rejecting
    /// malformed targets
    pub fn promote(&self, link: &DiscoveredLink, registry: &AttributeRegistry) -> UriResult<CrawlURI> {
        let url = self
            .uri
            .join(&link.target)
            .map_err(|e| UriError::Parse(format!("{}: {e}", link.target)))?;
        Ok(self.make_child(url, link.hop, link.context.clone(), registry))
    }

    /// Resets per-attempt state between processing-chain passes
    ///
    /// Scheduling identity (URI, class key, ordinal, hop path) and the
    /// attempt counters survive; fetch outcome, timing, content metadata,
    /// discoveries, and unregistered attributes do not.
    pub fn processing_cleanup(&mut self, registry: &AttributeRegistry) {
        self.fetch_status = FetchStatus::Unattempted;
        self.fetch_began = None;
        self.fetch_completed = None;
        self.content_size = 0;
        self.content_length = None;
        self.content_digest = None;
        self.retry_with_credentials = false;
        self.link_extraction_finished = false;
        self.discovered.clear();
        self.attributes.retain_registered(registry);
    }
}

impl std::fmt::Display for CrawlURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}
