use futures::{future::try_join_all, stream, StreamExt, TryStreamExt};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use time::{macros::format_description, Date};
use utoipa::ToSchema;

use crate::{db, observations_of, wu_client, HistoryFetcher, NewObservation, ObservationStore};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Upstream(#[from] wu_client::Error),
    #[error("{0}")]
    Store(#[from] db::Error),
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

/// Observations for every day of a range, concatenated in date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RangeHistory {
    #[schema(value_type = Vec<Object>)]
    pub observations: Vec<Value>,
    pub station_id: String,
    pub start: String,
    pub end: String,
}

/// Parses an 8-digit `YYYYMMDD` string into a real calendar day.
pub fn parse_day(value: &str) -> Result<Date, Error> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidRange(format!("{} is not a YYYYMMDD date", value)));
    }
    Date::parse(value, format_description!("[year][month][day]"))
        .map_err(|e| Error::InvalidRange(format!("{} is not a calendar date: {}", value, e)))
}

pub fn format_day(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Every day from `start` to `end` inclusive, ascending, as `YYYYMMDD`.
pub fn expand_range(start: &str, end: &str) -> Result<Vec<String>, Error> {
    let first = parse_day(start)?;
    let last = parse_day(end)?;
    if first > last {
        return Err(Error::InvalidRange(format!("start {} is after end {}", start, end)));
    }

    let mut days = Vec::new();
    let mut current = Some(first);
    while let Some(day) = current.filter(|day| *day <= last) {
        days.push(format_day(day));
        current = day.next_day();
    }
    Ok(days)
}

/// Normalizes a payload's observations and writes them, returning the row count.
pub async fn save_observations(
    store: &dyn ObservationStore,
    station_id: &str,
    date: &str,
    payload: &Value,
) -> Result<usize, Error> {
    let rows: Vec<NewObservation> = observations_of(payload)
        .iter()
        .map(|raw| NewObservation::from_upstream(station_id, date, raw))
        .collect();
    if rows.is_empty() {
        return Ok(0);
    }
    Ok(store.insert_observations(rows).await?)
}

pub struct HistoryIngest {
    fetcher: Arc<dyn HistoryFetcher>,
    store: Arc<dyn ObservationStore>,
    max_concurrent_days: Option<usize>,
}

impl HistoryIngest {
    pub fn new(
        fetcher: Arc<dyn HistoryFetcher>,
        store: Arc<dyn ObservationStore>,
        max_concurrent_days: Option<usize>,
    ) -> Self {
        Self {
            fetcher,
            store,
            max_concurrent_days: max_concurrent_days.filter(|cap| *cap > 0),
        }
    }

    /// Fetches and stores one day, handing back the payload untouched.
    pub async fn ingest_day(&self, station_id: &str, date: &str) -> Result<Value, Error> {
        let payload = self.fetcher.fetch_day(station_id, date).await?;
        let saved = save_observations(self.store.as_ref(), station_id, date, &payload).await?;
        if saved > 0 {
            info!("saved {} observations for {} ({})", saved, station_id, date);
        }
        Ok(payload)
    }

    /// Ingests every day of the range concurrently. The first failing day
    /// fails the whole call.
    pub async fn ingest_range(
        &self,
        station_id: &str,
        start: &str,
        end: &str,
    ) -> Result<RangeHistory, Error> {
        let days = expand_range(start, end)?;
        info!(
            "ingesting {} days for {} ({} - {})",
            days.len(),
            station_id,
            start,
            end
        );

        let per_day: Vec<_> = days
            .iter()
            .map(|day| self.day_observations(station_id, day))
            .collect();
        let results: Vec<Vec<Value>> = match self.max_concurrent_days {
            Some(cap) => stream::iter(per_day).buffered(cap).try_collect().await?,
            None => try_join_all(per_day).await?,
        };

        Ok(RangeHistory {
            observations: results.into_iter().flatten().collect(),
            station_id: station_id.to_owned(),
            start: start.to_owned(),
            end: end.to_owned(),
        })
    }

    async fn day_observations(&self, station_id: &str, date: &str) -> Result<Vec<Value>, Error> {
        let payload = self.fetcher.fetch_day(station_id, date).await?;
        save_observations(self.store.as_ref(), station_id, date, &payload).await?;
        Ok(observations_of(&payload).to_vec())
    }
}
