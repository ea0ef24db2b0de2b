pub mod pricing {

    /// Flat delivery surcharge for non-self-collection orders.
    pub const DELIVERY_FEE: f64 = 30.0;
}

pub mod scheduling {

    /// Orders must be scheduled at least this many hours out.
    pub const MIN_LEAD_HOURS: i64 = 1;

    /// ...and no more than this many hours out.
    pub const MAX_LEAD_HOURS: i64 = 6;
}

pub mod reports {

    pub const TOP_DISHES_LIMIT: u64 = 5;

    pub const TOP_CUSTOMERS_LIMIT: u64 = 5;

    /// Trailing window for the most-profitable-day report.
    pub const PROFIT_WINDOW_DAYS: i64 = 30;
}
