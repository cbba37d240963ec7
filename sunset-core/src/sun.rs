use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use sunrise::sunrise_sunset;

use crate::error::SunsetError;
use crate::model::Coordinates;

/// How long before sunset a photographer should be in place.
pub const ARRIVAL_LEAD_MINUTES: i64 = 30;

/// Sunset for `date` at `at`, expressed in `tz`.
///
/// The solar model works on the location's own solar day, so for zones far
/// from their solar longitude (Kiritimati, Apia) the event it returns can land
/// on a neighbouring local day. That drift is corrected with one recomputation.
pub fn sunset_on(at: Coordinates, date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, SunsetError> {
    let local = localized_sunset(at, date, tz)?;

    let drift = local.date_naive().signed_duration_since(date).num_days();
    if drift == 0 {
        return Ok(local);
    }

    let solar_date = date
        .checked_sub_signed(Duration::days(drift))
        .ok_or(SunsetError::NoSunset(date))?;
    localized_sunset(at, solar_date, tz)
}

fn localized_sunset(at: Coordinates, date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, SunsetError> {
    let (_, sunset_epoch) = sunrise_sunset(
        at.latitude,
        at.longitude,
        date.year(),
        date.month(),
        date.day(),
    );
    // Polar day or night: the hour angle is undefined and the epoch collapses to 0.
    if sunset_epoch == 0 {
        return Err(SunsetError::NoSunset(date));
    }

    tz.timestamp_opt(sunset_epoch, 0)
        .earliest()
        .ok_or(SunsetError::InvalidTimestamp(sunset_epoch))
}

pub fn arrival_time(sunset: DateTime<Tz>) -> DateTime<Tz> {
    sunset - Duration::minutes(ARRIVAL_LEAD_MINUTES)
}
