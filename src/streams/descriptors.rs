//! The static stream table
//!
//! One descriptor per Recharge resource; catalog order is table order.
//! Streams carry no custom control flow: everything the engine needs is a
//! descriptor field.

use crate::http::LEGACY_API_VERSION;
use crate::pagination::{
    CursorPaginator, NoPaginator, PageNumberPaginator, PaginationKind, Paginator, PAGE_SIZE,
};
use crate::types::{format_datetime, ReplicationMethod};
use chrono::{DateTime, Utc};

/// Static, compile-time-known description of one Recharge resource
#[derive(Debug, Clone, Copy)]
pub struct StreamDescriptor {
    /// Stream identifier
    pub tap_stream_id: &'static str,
    /// HTTP path relative to the API host
    pub path: &'static str,
    /// Primary key field(s)
    pub key_properties: &'static [&'static str],
    /// Replication method
    pub replication: ReplicationMethod,
    /// Datetime-valued bookmark field (incremental streams only)
    pub replication_key: Option<&'static str>,
    /// Fixed query parameters sent with every page
    pub params: &'static [(&'static str, &'static str)],
    /// Response field holding the record array (or object, for singletons)
    pub data_key: &'static str,
    /// Pagination strategy
    pub pagination: PaginationKind,
    /// Whether the endpoint accepts an `updated_at_min` filter
    pub supports_updated_at_min: bool,
    /// Pinned API version, if the endpoint only exists on an older revision
    pub api_version: Option<&'static str>,
    /// Operator-facing notice raised after a run that replicated this stream
    pub deprecation_notice: Option<&'static str>,
    /// The endpoint returns one object rather than an array
    pub singleton: bool,
}

impl StreamDescriptor {
    /// Whether this stream is slated for removal upstream
    pub fn is_deprecated(&self) -> bool {
        self.deprecation_notice.is_some()
    }

    /// Build the pagination strategy for one fetch loop, seeding the
    /// first-page filter from the watermark where the endpoint supports it.
    pub fn paginator(&self, watermark: Option<&DateTime<Utc>>) -> Box<dyn Paginator> {
        match self.pagination {
            PaginationKind::Cursor => {
                let sort_by = format!("{}-asc", self.replication_key.unwrap_or("updated_at"));
                let min_filter = if self.supports_updated_at_min {
                    watermark.map(|w| ("updated_at_min".to_string(), format_datetime(w)))
                } else {
                    None
                };
                Box::new(CursorPaginator::new(PAGE_SIZE, sort_by, min_filter))
            }
            PaginationKind::PageNumber => Box::new(PageNumberPaginator::new("page", PAGE_SIZE, 1)),
            PaginationKind::None => Box::new(NoPaginator),
        }
    }
}

const PRODUCTS_DEPRECATION: &str = "Recharge plans to deprecate `products` stream by June 30, \
    2025. It is recommended to use the `plans` stream instead to achieve equivalent functionality.";

/// All streams this tap can replicate, in catalog order
pub static STREAMS: &[StreamDescriptor] = &[
    StreamDescriptor {
        tap_stream_id: "addresses",
        path: "addresses",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "addresses",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "charges",
        path: "charges",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "charges",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "collections",
        path: "collections",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "collections",
        pagination: PaginationKind::Cursor,
        // Pseudo-incremental: no `updated_at_min` support on this endpoint
        supports_updated_at_min: false,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "customers",
        path: "customers",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "customers",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "discounts",
        path: "discounts",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "discounts",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "metafields_customer",
        path: "metafields",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[("owner_resource", "customer")],
        data_key: "metafields",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: false,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "metafields_store",
        path: "metafields",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[("owner_resource", "store")],
        data_key: "metafields",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: false,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "metafields_subscription",
        path: "metafields",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[("owner_resource", "subscription")],
        data_key: "metafields",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: false,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "onetimes",
        path: "onetimes",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "onetimes",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "orders",
        path: "orders",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "orders",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "products",
        path: "products",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "products",
        pagination: PaginationKind::PageNumber,
        supports_updated_at_min: false,
        // The products endpoint only exists on the 2021-01 revision
        api_version: Some(LEGACY_API_VERSION),
        deprecation_notice: Some(PRODUCTS_DEPRECATION),
        singleton: false,
    },
    StreamDescriptor {
        tap_stream_id: "shop",
        path: "shop",
        key_properties: &["id"],
        replication: ReplicationMethod::FullTable,
        replication_key: None,
        params: &[],
        data_key: "shop",
        pagination: PaginationKind::None,
        supports_updated_at_min: false,
        api_version: None,
        deprecation_notice: None,
        singleton: true,
    },
    StreamDescriptor {
        tap_stream_id: "subscriptions",
        path: "subscriptions",
        key_properties: &["id"],
        replication: ReplicationMethod::Incremental,
        replication_key: Some("updated_at"),
        params: &[],
        data_key: "subscriptions",
        pagination: PaginationKind::Cursor,
        supports_updated_at_min: true,
        api_version: None,
        deprecation_notice: None,
        singleton: false,
    },
];

/// Look up a stream descriptor by id
pub fn get_stream(tap_stream_id: &str) -> Option<&'static StreamDescriptor> {
    STREAMS
        .iter()
        .find(|descriptor| descriptor.tap_stream_id == tap_stream_id)
}
