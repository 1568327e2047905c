//! Rule code parsing and documentation URL resolution.
//!
//! A rule code such as `CA2210` splits into a category (`CA`) and a numeric
//! id (`2210`). URLs come from a [`ResolverChain`]: resolvers run in
//! descending priority, equal priorities in registration order, and the
//! first one returning a URL wins.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{require_text, Result};

/// Parsed rule code, handed to every resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescription {
    rule: String,
    category: String,
    rule_id: u32,
}

impl RuleDescription {
    /// Split a rule code at its first digit.
    ///
    /// The id is the digit run starting there; trailing text after the run
    /// is ignored. Returns `None` when the code has no digit or the run does
    /// not fit a `u32`.
    pub fn parse(rule: &str) -> Option<Self> {
        let digit_index = rule.find(|c: char| c.is_ascii_digit())?;
        let tail = &rule[digit_index..];
        let digits_end = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        let rule_id = tail[..digits_end].parse::<u32>().ok()?;

        Some(Self {
            rule: rule.to_string(),
            category: rule[..digit_index].to_string(),
            rule_id,
        })
    }

    /// Full rule code as logged.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn rule_id(&self) -> u32 {
        self.rule_id
    }
}

/// URL template bound to a rule category.
///
/// Placeholders: `{rule}` (full code), `{category}`, `{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlTemplate {
    pub category: String,
    pub template: String,
    #[serde(default)]
    pub priority: i32,
}

impl UrlTemplate {
    pub fn new(category: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            template: template.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_placeholder(&self) -> bool {
        ["{rule}", "{category}", "{id}"]
            .iter()
            .any(|p| self.template.contains(p))
    }

    /// URL for `rule` when its category matches (ASCII case-insensitive).
    pub fn expand(&self, rule: &RuleDescription) -> Option<Url> {
        if !rule.category().eq_ignore_ascii_case(&self.category) {
            return None;
        }

        let expanded = self
            .template
            .replace("{rule}", rule.rule())
            .replace("{category}", rule.category())
            .replace("{id}", &rule.rule_id().to_string());

        match Url::parse(&expanded) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(rule = %rule.rule(), url = %expanded, "Template produced an invalid URL: {}", e);
                None
            }
        }
    }
}

/// Built-in resolvers for code analysis (`CA`) and StyleCop (`SA`) rules.
pub fn default_templates() -> Vec<UrlTemplate> {
    vec![
        UrlTemplate::new(
            "CA",
            "https://www.google.im/search?q=%22{rule}:%22+site:msdn.microsoft.com",
        ),
        UrlTemplate::new(
            "SA",
            "https://github.com/DotNetAnalyzers/StyleCopAnalyzers/blob/master/documentation/{rule}.md",
        ),
    ]
}

type ResolverFn = dyn Fn(&RuleDescription) -> Option<Url> + Send + Sync;

#[derive(Clone)]
struct ResolverEntry {
    priority: i32,
    resolver: Arc<ResolverFn>,
}

/// Priority-ordered resolver list with a per-rule result cache.
///
/// Registration takes the write lock and bumps `generation`; lookups
/// iterate a snapshot taken under the read lock, so a resolver running
/// while another thread registers never sees a half-updated list.
pub struct ResolverChain {
    entries: RwLock<Vec<ResolverEntry>>,
    generation: AtomicU64,
    cache: DashMap<String, (u64, Option<Url>)>,
}

impl ResolverChain {
    /// Chain without any resolver.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            cache: DashMap::new(),
        }
    }

    /// Chain seeded with [`default_templates`].
    pub fn with_defaults() -> Self {
        let chain = Self::new();
        for template in default_templates() {
            chain.add_template(template);
        }
        chain
    }

    /// Register a resolver. Higher priorities run first; among equal
    /// priorities earlier registrations run first.
    pub fn add_resolver<F>(&self, resolver: F, priority: i32)
    where
        F: Fn(&RuleDescription) -> Option<Url> + Send + Sync + 'static,
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let index = entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(entries.len());
        entries.insert(
            index,
            ResolverEntry {
                priority,
                resolver: Arc::new(resolver),
            },
        );
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
    }

    pub fn add_template(&self, template: UrlTemplate) {
        let priority = template.priority;
        self.add_resolver(move |rule| template.expand(rule), priority);
    }

    /// Documentation URL for `rule`, `None` when the code is not rule-shaped
    /// or no resolver matches. Fails for empty or whitespace-only input.
    pub fn resolve_rule_url(&self, rule: &str) -> Result<Option<Url>> {
        let rule = require_text(rule, "rule")?;

        let (generation, snapshot) = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            (self.generation.load(Ordering::SeqCst), entries.clone())
        };

        if let Some(cached) = self.cache.get(rule) {
            if cached.0 == generation {
                return Ok(cached.1.clone());
            }
        }

        let resolved = match RuleDescription::parse(rule) {
            Some(description) => snapshot
                .iter()
                .find_map(|entry| (entry.resolver)(&description)),
            None => {
                tracing::debug!(rule = %rule, "Rule code has no numeric id, skipping URL lookup");
                None
            }
        };

        // A registration that raced this lookup already cleared the cache;
        // only store results computed against the current resolver set.
        if self.generation.load(Ordering::SeqCst) == generation {
            self.cache
                .insert(rule.to_string(), (generation, resolved.clone()));
        }

        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|e| e.priority)
            .collect();
        f.debug_struct("ResolverChain")
            .field("priorities", &priorities)
            .field("cached_rules", &self.cache.len())
            .finish()
    }
}
