//! Rate admission controller.
//!
//! Fixed-window counters keyed by `(identity, route class)`. The map is sharded
//! ([`DashMap`]); the entry guard makes check-and-increment atomic for one key while
//! unrelated keys proceed in parallel.
//!
//! Whitelisted addresses are not a bypass: they resolve to the shared [`Identity::Exempt`]
//! bucket, which counts like any other but has no ceiling.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::ConfigError;

/// Named bucket shared by routes of similar sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Read,
    Write,
    Delete,
    Search,
}

impl RouteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Read => "read",
            RouteClass::Write => "write",
            RouteClass::Delete => "delete",
            RouteClass::Search => "search",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `requests` admitted per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u64,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(requests: u64, window: Duration) -> Self {
        Self { requests, window }
    }

    pub fn per_minute(requests: u64) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }

    /// Compact form used in the `X-RateLimit-Limit` header, e.g. `50/1minute`.
    pub fn header_value(&self) -> String {
        let (n, unit) = self.window_parts();
        format!("{}/{}{}", self.requests, n, unit)
    }

    fn window_parts(&self) -> (u64, &'static str) {
        let secs = self.window.as_secs().max(1);
        for (unit, size) in [("day", 86_400), ("hour", 3_600), ("minute", 60)] {
            if secs % size == 0 {
                return (secs / size, unit);
            }
        }
        (secs, "second")
    }
}

/// Human form, e.g. `50 per 1 minute`.
impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = self.window_parts();
        write!(f, "{} per {} {}", self.requests, n, unit)
    }
}

/// Accepts `100/minute`, `100/2 minutes`, `100/2minutes` and `100 per minute`.
impl FromStr for RateLimit {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidRateLimit {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let text = raw.trim().to_ascii_lowercase();
        let (count, period) = text
            .split_once('/')
            .or_else(|| text.split_once(" per "))
            .ok_or_else(|| invalid("expected `<count>/<period>`"))?;

        let requests: u64 = count
            .trim()
            .parse()
            .map_err(|_| invalid("count is not a positive integer"))?;
        if requests == 0 {
            return Err(invalid("count must be at least 1"));
        }

        let period = period.trim();
        let split = period
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid("missing time unit"))?;
        let (multiplier, unit) = period.split_at(split);
        let multiplier: u64 = if multiplier.is_empty() {
            1
        } else {
            multiplier.parse().map_err(|_| invalid("bad period multiplier"))?
        };
        if multiplier == 0 {
            return Err(invalid("period must be at least 1"));
        }

        let unit_secs = match unit.trim() {
            "s" | "sec" | "second" | "seconds" => 1,
            "m" | "min" | "minute" | "minutes" => 60,
            "h" | "hour" | "hours" => 3_600,
            "d" | "day" | "days" => 86_400,
            _ => return Err(invalid("unknown time unit")),
        };

        Ok(Self::new(requests, Duration::from_secs(multiplier * unit_secs)))
    }
}

/// Per-class limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteLimits {
    pub read: RateLimit,
    pub write: RateLimit,
    pub delete: RateLimit,
    pub search: RateLimit,
}

impl RouteLimits {
    pub fn get(&self, class: RouteClass) -> RateLimit {
        match class {
            RouteClass::Read => self.read,
            RouteClass::Write => self.write,
            RouteClass::Delete => self.delete,
            RouteClass::Search => self.search,
        }
    }
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            read: RateLimit::per_minute(100),
            write: RateLimit::per_minute(20),
            delete: RateLimit::per_minute(10),
            search: RateLimit::per_minute(50),
        }
    }
}

/// Who a request is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Shared bucket for every whitelisted caller.
    Exempt,
    Address(IpAddr),
    /// Origin address not available.
    Unknown,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Exempt => f.write_str("whitelisted"),
            Identity::Address(addr) => write!(f, "{addr}"),
            Identity::Unknown => f.write_str("unknown"),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit { limit: u64, remaining: u64 },
    Reject { limit: u64, retry_after: Duration },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u64,
    duration: Duration,
}

impl Window {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// Injected, process-wide admission controller.
#[derive(Debug)]
pub struct RateAdmission {
    windows: DashMap<(Identity, RouteClass), Window>,
    limits: RouteLimits,
    whitelist: HashSet<IpAddr>,
    enabled: bool,
}

impl RateAdmission {
    pub fn new(limits: RouteLimits, whitelist: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            windows: DashMap::new(),
            limits,
            whitelist: whitelist.into_iter().map(|ip| ip.to_canonical()).collect(),
            enabled: true,
        }
    }

    /// A controller that admits everything and keeps no state.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(RouteLimits::default(), [])
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self, class: RouteClass) -> RateLimit {
        self.limits.get(class)
    }

    /// Map an origin address to its bucket identity.
    pub fn resolve_identity(&self, origin: Option<IpAddr>) -> Identity {
        match origin.map(|ip| ip.to_canonical()) {
            Some(ip) if self.whitelist.contains(&ip) => Identity::Exempt,
            Some(ip) => Identity::Address(ip),
            None => Identity::Unknown,
        }
    }

    /// Check `identity` against the configured limit for `class`.
    pub fn admit(&self, identity: &Identity, class: RouteClass) -> Decision {
        if !self.enabled {
            let limit = self.limits.get(class).requests;
            return Decision::Admit {
                limit,
                remaining: limit,
            };
        }
        let RateLimit { requests, window } = self.limits.get(class);
        self.check_and_increment(identity, class, requests, window)
    }

    pub fn check_and_increment(
        &self,
        identity: &Identity,
        class: RouteClass,
        limit: u64,
        window: Duration,
    ) -> Decision {
        self.check_and_increment_at(identity, class, limit, window, Instant::now())
    }

    /// Counting core with an explicit clock.
    ///
    /// Rejections leave the count untouched, so a throttled caller regains access exactly
    /// when the window it exhausted elapses.
    pub fn check_and_increment_at(
        &self,
        identity: &Identity,
        class: RouteClass,
        limit: u64,
        window: Duration,
        now: Instant,
    ) -> Decision {
        let ceiling = match identity {
            Identity::Exempt => u64::MAX,
            _ => limit,
        };

        let mut entry = self
            .windows
            .entry((identity.clone(), class))
            .or_insert_with(|| Window {
                started: now,
                count: 0,
                duration: window,
            });
        let counter = entry.value_mut();

        if counter.expired(now) {
            counter.started = now;
            counter.count = 0;
            counter.duration = window;
        }

        if counter.count >= ceiling {
            let elapsed = now.saturating_duration_since(counter.started);
            let reset_in = counter.duration.saturating_sub(elapsed);
            let secs = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);
            return Decision::Reject {
                limit,
                retry_after: Duration::from_secs(secs.max(1)),
            };
        }

        counter.count = counter.count.saturating_add(1);
        Decision::Admit {
            limit: ceiling,
            remaining: ceiling - counter.count,
        }
    }

    /// Drop windows that have elapsed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| !w.expired(now));
        before.saturating_sub(self.windows.len())
    }

    /// Number of live windows.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
