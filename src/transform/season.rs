/// Seasonal aggregation of gridded climate readings.
///
/// Rows are grouped by meteorological season (from the month of the time
/// column) and grid cell (lon, lat). Each measurement column is averaged per
/// group, skipping missing values.

use crate::column::{canonical_bits, parse_datetime, Column, ColumnType, ColumnValue};
use crate::error::{Result, TableError};
use crate::table::Table;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Measurement columns of the land-surface forcing datasets.
pub const CLIMATE_COLUMNS: [&str; 6] = ["PSurf", "Qair", "Rainf", "Snowf", "Tair", "Wind"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Meteorological season of a calendar month (1-12).
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which columns drive the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalAggregation {
    pub time_column: String,
    pub lon_column: String,
    pub lat_column: String,
    pub measures: Vec<String>,
}

impl Default for SeasonalAggregation {
    fn default() -> Self {
        SeasonalAggregation {
            time_column: "time".to_string(),
            lon_column: "lon".to_string(),
            lat_column: "lat".to_string(),
            measures: CLIMATE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

struct Group {
    season: Season,
    lon: f64,
    lat: f64,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

impl SeasonalAggregation {
    /// Output columns: `season`, lon, lat, then one mean column per measure.
    /// Groups are ordered by season name, then lon, then lat.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        let time = table.column(&self.time_column)?;
        let lon = table.numeric(&self.lon_column)?;
        let lat = table.numeric(&self.lat_column)?;
        let measures = self
            .measures
            .iter()
            .map(|m| table.numeric(m))
            .collect::<Result<Vec<_>>>()?;

        let mut index: HashMap<(Season, u64, u64), usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for row in 0..table.len() {
            let when = match month_of(time.column_type(), &time.values()[row], &self.time_column)? {
                Some(month) => month,
                None => continue,
            };
            let (x, y) = match (lon.get(row), lat.get(row)) {
                (Some(x), Some(y)) => (x, y),
                _ => continue,
            };

            let season = Season::from_month(when);
            let slot = *index
                .entry((season, canonical_bits(x), canonical_bits(y)))
                .or_insert_with(|| {
                    groups.push(Group {
                        season,
                        lon: x,
                        lat: y,
                        sums: vec![0.0; measures.len()],
                        counts: vec![0; measures.len()],
                    });
                    groups.len() - 1
                });

            let group = &mut groups[slot];
            for (m, measure) in measures.iter().enumerate() {
                if let Some(v) = measure.get(row) {
                    group.sums[m] += v;
                    group.counts[m] += 1;
                }
            }
        }

        groups.sort_by(|a, b| {
            a.season
                .name()
                .cmp(b.season.name())
                .then_with(|| a.lon.total_cmp(&b.lon))
                .then_with(|| a.lat.total_cmp(&b.lat))
        });

        let mut columns = Vec::with_capacity(3 + measures.len());
        columns.push(Column::from_values(
            "season",
            ColumnType::String,
            groups
                .iter()
                .map(|g| ColumnValue::String(g.season.name().to_string()))
                .collect(),
        )?);
        columns.push(Column::float64(&self.lon_column, groups.iter().map(|g| Some(g.lon))));
        columns.push(Column::float64(&self.lat_column, groups.iter().map(|g| Some(g.lat))));
        for (m, name) in self.measures.iter().enumerate() {
            columns.push(Column::float64(
                name.as_str(),
                groups
                    .iter()
                    .map(|g| (g.counts[m] > 0).then(|| g.sums[m] / g.counts[m] as f64)),
            ));
        }

        let out = Table::from_columns(table.name(), columns)?;
        log::debug!(
            "seasonal aggregation: {} rows -> {} groups",
            table.len(),
            out.len()
        );
        Ok(out)
    }
}

/// Month of a time cell. Missing cells yield `None`; anything that is not a
/// timestamp is a type error.
fn month_of(column_type: ColumnType, value: &ColumnValue, column: &str) -> Result<Option<u32>> {
    let parsed: Option<NaiveDateTime> = match value {
        ColumnValue::Null => return Ok(None),
        ColumnValue::DateTime(dt) => Some(*dt),
        ColumnValue::String(s) => parse_datetime(s),
        _ => None,
    };
    parsed
        .map(|dt| Some(dt.month()))
        .ok_or_else(|| TableError::TypeMismatch {
            column: column.to_string(),
            expected: ColumnType::DateTime,
            found: format!("{:?} value {}", column_type, value),
        })
}

/// Aggregate with the default column layout (`time`, `lon`, `lat` and the
/// six forcing variables).
pub fn aggregate_by_season(table: &Table) -> Result<Table> {
    SeasonalAggregation::default().apply(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::LoadOptions;
    use crate::ErrorKind;

    const HEADER: &str = "time,lon,lat,PSurf,Qair,Rainf,Snowf,Tair,Wind\n";

    fn load(rows: &str) -> Table {
        Table::from_csv("forcing", &format!("{}{}", HEADER, rows), &LoadOptions::default())
            .unwrap()
    }

    #[test]
    fn test_two_march_rows_average_into_spring() {
        let table = load(
            "2001-03-01,10.5,45.5,100000,0.004,0,0,280,2\n\
             2001-03-02,10.5,45.5,101000,0.006,2,0,282,4\n",
        );
        let out = aggregate_by_season(&table).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out.column_names(),
            vec!["season", "lon", "lat", "PSurf", "Qair", "Rainf", "Snowf", "Tair", "Wind"]
        );
        assert_eq!(out.get_value(0, "season").unwrap().as_string(), Some("Spring"));
        assert_eq!(out.get_value(0, "lon").unwrap().as_f64(), Some(10.5));
        assert_eq!(out.get_value(0, "PSurf").unwrap().as_f64(), Some(100500.0));
        assert_eq!(out.get_value(0, "Tair").unwrap().as_f64(), Some(281.0));
        assert_eq!(out.get_value(0, "Wind").unwrap().as_f64(), Some(3.0));
    }

    #[test]
    fn test_grouping_and_order() {
        let table = load(
            "2001-12-15,2,1,1,1,1,1,1,1\n\
             2001-07-01,1,1,3,3,3,3,3,3\n\
             2001-01-15,2,1,3,3,3,3,3,3\n\
             2001-10-01,1,1,5,5,5,5,5,5\n\
             2001-07-02,0,1,7,7,7,7,7,7\n",
        );
        let out = aggregate_by_season(&table).unwrap();
        let seasons: Vec<String> = out.column("season").unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(seasons, vec!["Autumn", "Summer", "Summer", "Winter"]);
        // Summer groups sorted by lon
        assert_eq!(out.get_value(1, "lon").unwrap().as_f64(), Some(0.0));
        assert_eq!(out.get_value(2, "lon").unwrap().as_f64(), Some(1.0));
        // December and January share a winter group
        assert_eq!(out.get_value(3, "PSurf").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn test_missing_values() {
        let table = load(
            "2001-06-01,1,1,10,,1,1,1,1\n\
             ,1,1,99,99,99,99,99,99\n\
             2001-06-02,1,1,20,,1,1,1,1\n",
        );
        let out = aggregate_by_season(&table).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get_value(0, "PSurf").unwrap().as_f64(), Some(15.0));
        assert!(out.get_value(0, "Qair").unwrap().is_null());
    }

    #[test]
    fn test_signed_zero_coordinates_share_a_group() {
        let table = load(
            "2001-04-01,-0.0,0,1,1,1,1,1,1\n\
             2001-04-02,0.0,-0,3,3,3,3,3,3\n",
        );
        let out = aggregate_by_season(&table).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get_value(0, "PSurf").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn test_single_reading_exports_as_loaded() {
        let table = load("2001-04-01,2.3,36.1,1,0.1,0,0,280.2,2.1\n");
        let out = aggregate_by_season(&table).unwrap();
        assert_eq!(
            out.to_csv().unwrap(),
            "season,lon,lat,PSurf,Qair,Rainf,Snowf,Tair,Wind\n\
             Spring,2.3,36.1,1,0.1,0,0,280.2,2.1\n"
        );
    }

    #[test]
    fn test_custom_columns() {
        let csv = "date,x,y,temp\n2020-04-01 06:00:00,0,0,10\n2020-05-01 06:00:00,0,0,20\n";
        let table = Table::from_csv("t", csv, &LoadOptions::default()).unwrap();
        let config = SeasonalAggregation {
            time_column: "date".to_string(),
            lon_column: "x".to_string(),
            lat_column: "y".to_string(),
            measures: vec!["temp".to_string()],
        };
        let out = config.apply(&table).unwrap();
        assert_eq!(out.column_names(), vec!["season", "x", "y", "temp"]);
        assert_eq!(out.get_value(0, "temp").unwrap().as_f64(), Some(15.0));
    }

    #[test]
    fn test_errors() {
        let table = Table::from_csv("t", "time,lon\n2001-01-01,1\n", &LoadOptions::default()).unwrap();
        assert_eq!(aggregate_by_season(&table).unwrap_err().kind(), ErrorKind::Key);

        let table = load("soon,1,1,1,1,1,1,1,1\n");
        assert_eq!(aggregate_by_season(&table).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_season_from_month() {
        let seasons: Vec<Season> = (1..=12).map(Season::from_month).collect();
        assert_eq!(seasons[0], Season::Winter);
        assert_eq!(seasons[2], Season::Spring);
        assert_eq!(seasons[5], Season::Summer);
        assert_eq!(seasons[8], Season::Autumn);
        assert_eq!(seasons[11], Season::Winter);
    }
}
