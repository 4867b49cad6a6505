pub mod emi;
pub mod reconcile;
pub mod schedule;
pub mod summary;

/// Today's date in the local time zone, the default for `--as-of` and
/// `--creation-date`.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
