use serde::{Deserialize, Serialize};

/// Minimum number of separated fields a line needs to become a record.
pub const MIN_FIELDS: usize = 24;

/// Source column positions. Columns 1 and 2 (pickup/dropoff timestamps) are not extracted.
pub mod col {
    pub const VENDOR_NAME: usize = 0;
    pub const PICKUP_DATETIME: usize = 1;
    pub const DROPOFF_DATETIME: usize = 2;
    pub const PASSENGER_COUNT: usize = 3;
    pub const TRIP_DISTANCE: usize = 4;
    pub const PICKUP_LONGITUDE: usize = 5;
    pub const PICKUP_LATITUDE: usize = 6;
    pub const RATE_CODE: usize = 7;
    pub const STORE_AND_FWD: usize = 8;
    pub const DROPOFF_LONGITUDE: usize = 9;
    pub const DROPOFF_LATITUDE: usize = 10;
    pub const PAYMENT_TYPE: usize = 11;
    pub const FARE_AMOUNT: usize = 12;
    pub const EXTRA: usize = 13;
    pub const MTA_TAX: usize = 14;
    pub const TIP_AMOUNT: usize = 15;
    pub const TOLLS_AMOUNT: usize = 16;
    pub const TOTAL_AMOUNT: usize = 17;
    pub const IMPROVEMENT_SURCHARGE: usize = 18;
    pub const CONGESTION_SURCHARGE: usize = 19;
    pub const PICKUP_LOCATION_ID: usize = 20;
    pub const DROPOFF_LOCATION_ID: usize = 21;
    pub const YEAR: usize = 22;
    pub const MONTH: usize = 23;
}

/// One taxi-trip observation.
///
/// `year` and `month` keep the raw source text; backends that store them as
/// integers go through [`TripRecord::year_number`] and [`TripRecord::month_number`],
/// which ignore surrounding whitespace (a CRLF file leaves `'\r'` on `month`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripRecord {
    pub vendor_name: String,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub rate_code: String,
    pub store_and_fwd: String,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
    pub payment_type: String,
    pub fare_amount: f64,
    pub extra: f64,
    pub mta_tax: f64,
    pub tip_amount: f64,
    pub tolls_amount: f64,
    pub total_amount: f64,
    pub improvement_surcharge: f64,
    pub congestion_surcharge: f64,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub year: String,
    pub month: String,
}

impl TripRecord {
    pub fn year_number(&self) -> i64 {
        crate::ingest::coerce_int(self.year.trim())
    }

    pub fn month_number(&self) -> i64 {
        crate::ingest::coerce_int(self.month.trim())
    }
}
