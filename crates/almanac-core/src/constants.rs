/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const EVENTS_ROUTE_COMPONENT: &str = "events";
pub const EVENTS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", EVENTS_ROUTE_COMPONENT);

pub const NOTIFICATIONS_ROUTE_COMPONENT: &str = "notifications";
pub const NOTIFICATIONS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", NOTIFICATIONS_ROUTE_COMPONENT);

/// Days past the query window that an unbounded series is expanded to.
pub const DEFAULT_RECURRENCE_HORIZON_DAYS: u32 = 90;

/// Longest listing window, in days, a single query may ask for.
pub const DEFAULT_MAX_QUERY_WINDOW_DAYS: u32 = 366;

/// Reminder notifications are not repeated for the same key within this window.
pub const REMINDER_DEDUP_WINDOW_HOURS: i64 = 48;

/// Headers trusted when `auth.method = "proxy"`.
pub mod proxy_headers {
    pub const REMOTE_USER: &str = "x-remote-user";
    pub const REMOTE_DEPARTMENT: &str = "x-remote-department";
    pub const REMOTE_OFFICE: &str = "x-remote-office";
    pub const REMOTE_DIVISION: &str = "x-remote-division";
}

/// Alert setting of events created without one.
pub const DEFAULT_ALERT: &str = "none";
