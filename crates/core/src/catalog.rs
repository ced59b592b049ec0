//! Widget catalog: the closed set of dashboard widget types (PRD-14).
//!
//! Every widget type carries the display metadata shown in the
//! configuration dialog (title, icon, category) plus the defaults the
//! engine falls back to when a layout or its settings are silent: initial
//! grid width and data refresh interval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Refresh fallback for operational widgets (orders, rentals, stock).
const REFRESH_OPERATIONAL: Duration = Duration::from_secs(60);

/// Refresh fallback for financial widgets.
const REFRESH_FINANCIAL: Duration = Duration::from_secs(120);

/// Refresh fallback for analytics widgets (aggregations change slowly).
const REFRESH_ANALYTICS: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// WidgetCategory
// ---------------------------------------------------------------------------

/// Grouping used by the widget configuration dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Overview,
    Operations,
    Financial,
    Analytics,
}

// ---------------------------------------------------------------------------
// WidgetType
// ---------------------------------------------------------------------------

/// The closed set of widget types the dashboard can render.
///
/// The serde name doubles as the widget-data endpoint path segment, e.g.
/// `WidgetType::RecentOrders` fetches from `/widget-data/recent-orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    RecentOrders,
    ActiveRentals,
    OpenInvoices,
    OverdueRentals,
    MaintenanceDue,
    DepotStock,
    RevenueSummary,
    OutstandingPayments,
    FleetUtilization,
    CustomerGrowth,
}

/// All widget types, in configuration-dialog display order.
pub const ALL_WIDGET_TYPES: &[WidgetType] = &[
    WidgetType::RecentOrders,
    WidgetType::ActiveRentals,
    WidgetType::OpenInvoices,
    WidgetType::OverdueRentals,
    WidgetType::MaintenanceDue,
    WidgetType::DepotStock,
    WidgetType::RevenueSummary,
    WidgetType::OutstandingPayments,
    WidgetType::FleetUtilization,
    WidgetType::CustomerGrowth,
];

impl WidgetType {
    /// Endpoint path segment under `/widget-data/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            WidgetType::RecentOrders => "recent-orders",
            WidgetType::ActiveRentals => "active-rentals",
            WidgetType::OpenInvoices => "open-invoices",
            WidgetType::OverdueRentals => "overdue-rentals",
            WidgetType::MaintenanceDue => "maintenance-due",
            WidgetType::DepotStock => "depot-stock",
            WidgetType::RevenueSummary => "revenue-summary",
            WidgetType::OutstandingPayments => "outstanding-payments",
            WidgetType::FleetUtilization => "fleet-utilization",
            WidgetType::CustomerGrowth => "customer-growth",
        }
    }

    /// Title shown in the widget header and the configuration dialog.
    pub fn title(&self) -> &'static str {
        match self {
            WidgetType::RecentOrders => "Recent Orders",
            WidgetType::ActiveRentals => "Active Rentals",
            WidgetType::OpenInvoices => "Open Invoices",
            WidgetType::OverdueRentals => "Overdue Rentals",
            WidgetType::MaintenanceDue => "Maintenance Due",
            WidgetType::DepotStock => "Depot Stock",
            WidgetType::RevenueSummary => "Revenue Summary",
            WidgetType::OutstandingPayments => "Outstanding Payments",
            WidgetType::FleetUtilization => "Fleet Utilization",
            WidgetType::CustomerGrowth => "Customer Growth",
        }
    }

    /// Icon name from the console's icon set.
    pub fn icon(&self) -> &'static str {
        match self {
            WidgetType::RecentOrders => "shopping-cart",
            WidgetType::ActiveRentals => "calendar-clock",
            WidgetType::OpenInvoices => "file-text",
            WidgetType::OverdueRentals => "alert-triangle",
            WidgetType::MaintenanceDue => "wrench",
            WidgetType::DepotStock => "warehouse",
            WidgetType::RevenueSummary => "banknote",
            WidgetType::OutstandingPayments => "credit-card",
            WidgetType::FleetUtilization => "truck",
            WidgetType::CustomerGrowth => "trending-up",
        }
    }

    /// Configuration-dialog grouping.
    pub fn category(&self) -> WidgetCategory {
        match self {
            WidgetType::RecentOrders | WidgetType::ActiveRentals | WidgetType::OpenInvoices => {
                WidgetCategory::Overview
            }
            WidgetType::OverdueRentals | WidgetType::MaintenanceDue | WidgetType::DepotStock => {
                WidgetCategory::Operations
            }
            WidgetType::RevenueSummary | WidgetType::OutstandingPayments => {
                WidgetCategory::Financial
            }
            WidgetType::FleetUtilization | WidgetType::CustomerGrowth => {
                WidgetCategory::Analytics
            }
        }
    }

    /// Initial grid width (columns) when the widget is added to a layout.
    pub fn default_width(&self) -> u16 {
        match self {
            WidgetType::ActiveRentals | WidgetType::OpenInvoices => 3,
            _ => 6,
        }
    }

    /// Refresh interval used when a widget's settings carry no
    /// `refreshInterval` (or carry `0`).
    pub fn default_refresh_interval(&self) -> Duration {
        match self.category() {
            WidgetCategory::Overview | WidgetCategory::Operations => REFRESH_OPERATIONAL,
            WidgetCategory::Financial => REFRESH_FINANCIAL,
            WidgetCategory::Analytics => REFRESH_ANALYTICS,
        }
    }
}
