use crate::error::TrainerError;
use chrono::NaiveDate;
use configuration::DatasetSettings;
use core_types::{Dataset, LabeledRow, Observation};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the epoch of polars' `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Reads a parquet file (by extension) or a headed CSV file into a DataFrame.
pub fn read_frame(path: &Path) -> Result<DataFrame, TrainerError> {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let df = if is_parquet {
        let file = File::open(path).map_err(|source| TrainerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ParquetReader::new(file).finish()?
    } else {
        CsvReader::from_path(path)?.has_header(true).finish()?
    };

    tracing::info!(path = %path.display(), shape = ?df.shape(), "Loaded table");
    Ok(df)
}

/// Fails with `MissingColumn` on the first required column the frame lacks.
pub fn validate_schema(df: &DataFrame, required: &[&str]) -> Result<(), TrainerError> {
    let present = df.get_column_names();
    match required.iter().find(|name| !present.contains(*name)) {
        Some(missing) => Err(TrainerError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

/// Loads the labelled table named by the settings.
pub fn load_dataset(settings: &DatasetSettings) -> Result<Dataset, TrainerError> {
    let df = read_frame(&settings.path)?;
    dataframe_to_dataset(&df, settings)
}

/// Converts a labelled frame into a chronologically ordered `Dataset`.
///
/// Feature, label and return values may be null or NaN; both become `None`.
/// A null date or asset is an error.
pub fn dataframe_to_dataset(df: &DataFrame, settings: &DatasetSettings) -> Result<Dataset, TrainerError> {
    let mut required = vec![
        settings.date_column.as_str(),
        settings.asset_column.as_str(),
        settings.label_column.as_str(),
        settings.return_column.as_str(),
    ];
    required.extend(settings.feature_columns.iter().map(String::as_str));
    validate_schema(df, &required)?;

    let dates = date_values(df, &settings.date_column)?;
    let assets = string_values(df, &settings.asset_column)?;
    let labels = label_values(df, &settings.label_column)?;
    let returns = float_values(df, &settings.return_column)?;
    let features = settings
        .feature_columns
        .iter()
        .map(|name| float_values(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..df.height())
        .map(|i| LabeledRow {
            date: dates[i],
            asset: assets[i].clone(),
            features: features.iter().map(|column| column[i]).collect(),
            label: labels[i],
            forward_return: returns[i],
        })
        .collect();

    Ok(Dataset::new(settings.feature_columns.clone(), rows)?)
}

/// Loads a pre-scored table for a standalone backtest.
pub fn load_scored_observations(settings: &DatasetSettings) -> Result<Vec<Observation>, TrainerError> {
    let df = read_frame(&settings.path)?;
    dataframe_to_observations(&df, settings)
}

/// Converts a scored frame into observations. A null score becomes NaN, which
/// the portfolio constructor never selects.
pub fn dataframe_to_observations(
    df: &DataFrame,
    settings: &DatasetSettings,
) -> Result<Vec<Observation>, TrainerError> {
    validate_schema(
        df,
        &[
            settings.date_column.as_str(),
            settings.asset_column.as_str(),
            settings.score_column.as_str(),
            settings.return_column.as_str(),
        ],
    )?;

    let dates = date_values(df, &settings.date_column)?;
    let assets = string_values(df, &settings.asset_column)?;
    let scores = float_values(df, &settings.score_column)?;
    let returns = float_values(df, &settings.return_column)?;

    Ok((0..df.height())
        .map(|i| Observation {
            period: dates[i],
            asset: assets[i].clone(),
            score: scores[i].unwrap_or(f64::NAN),
            forward_return: returns[i],
        })
        .collect())
}

fn invalid(column: &str, row: usize, reason: impl Into<String>) -> TrainerError {
    TrainerError::InvalidValue {
        column: column.to_string(),
        row,
        reason: reason.into(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Accept "YYYY-MM-DD" with or without a trailing time component.
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

fn date_values(df: &DataFrame, column: &str) -> Result<Vec<NaiveDate>, TrainerError> {
    let series = df.column(column)?;

    let dates: Vec<Option<NaiveDate>> = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Some(raw) => parse_date(raw)
                    .map(Some)
                    .ok_or_else(|| invalid(column, row, format!("'{raw}' is not a YYYY-MM-DD date"))),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, TrainerError>>()?,
        _ => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)))
                .collect()
        }
    };

    dates
        .into_iter()
        .enumerate()
        .map(|(row, date)| date.ok_or_else(|| invalid(column, row, "missing date")))
        .collect()
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>, TrainerError> {
    let series = df.column(column)?.cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .map(str::to_string)
                .ok_or_else(|| invalid(column, row, "missing value"))
        })
        .collect()
}

/// Numeric column as f64, with NaN folded into `None`.
fn float_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, TrainerError> {
    let series = df.column(column)?.cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn label_values(df: &DataFrame, column: &str) -> Result<Vec<Option<i32>>, TrainerError> {
    float_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.fract() == 0.0 => Ok(Some(v as i32)),
            Some(v) => Err(invalid(column, row, format!("label {v} is not an integer"))),
            None => Ok(None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatasetSettings {
        DatasetSettings {
            feature_columns: vec!["Mom".to_string(), "Vol".to_string()],
            ..DatasetSettings::default()
        }
    }

    fn labelled_frame() -> DataFrame {
        df!(
            "Date" => &["2021-01-08", "2020-01-03", "2020-01-03"],
            "Ticker" => &["A", "B", "SPY"],
            "Label" => &[Some(1.0), Some(0.0), None],
            "Return_1w" => &[Some(0.01), Some(f64::NAN), Some(-0.02)],
            "Mom" => &[Some(0.5), Some(0.1), None],
            "Vol" => &[0.2, f64::NAN, 0.3]
        )
        .unwrap()
    }

    #[test]
    fn test_frame_becomes_sorted_dataset() {
        let dataset = dataframe_to_dataset(&labelled_frame(), &settings()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.feature_names(), &["Mom".to_string(), "Vol".to_string()]);

        let rows = dataset.rows();
        assert_eq!(rows[0].asset, "B");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 1, 3).unwrap());
        assert_eq!(rows[0].features, vec![Some(0.1), None]);
        assert_eq!(rows[0].forward_return, None);
        assert_eq!(rows[1].asset, "SPY");
        assert_eq!(rows[1].label, None);
        assert_eq!(rows[2].label, Some(1));
        assert!(rows[2].is_complete());
        assert!(!rows[0].is_complete());
    }

    #[test]
    fn test_missing_feature_column_is_fatal() {
        let mut settings = settings();
        settings.feature_columns.push("RSI_14".to_string());

        let err = dataframe_to_dataset(&labelled_frame(), &settings).unwrap_err();
        assert!(matches!(err, TrainerError::MissingColumn(name) if name == "RSI_14"));
    }

    #[test]
    fn test_unparseable_date_is_reported_with_its_row() {
        let df = df!(
            "Date" => &["2020-01-03", "last friday"],
            "Ticker" => &["A", "B"],
            "Label" => &[1, 0],
            "Return_1w" => &[0.0, 0.0],
            "Mom" => &[0.0, 0.0],
            "Vol" => &[0.0, 0.0]
        )
        .unwrap();

        let err = dataframe_to_dataset(&df, &settings()).unwrap_err();
        assert!(matches!(err, TrainerError::InvalidValue { row: 1, .. }));
    }

    #[test]
    fn test_native_date_column() {
        let mut df = df!(
            "Date" => &["2022-03-04"],
            "Ticker" => &["A"],
            "Label" => &[1],
            "Return_1w" => &[0.0],
            "Mom" => &[0.0],
            "Vol" => &[0.0]
        )
        .unwrap();
        let dates = Series::new("Date", &[19_055i32]).cast(&DataType::Date).unwrap();
        df.with_column(dates).unwrap();

        let dataset = dataframe_to_dataset(&df, &settings()).unwrap();
        assert_eq!(dataset.rows()[0].date, NaiveDate::from_ymd_opt(2022, 3, 4).unwrap());
    }

    #[test]
    fn test_scored_frame_becomes_observations() {
        let df = df!(
            "Date" => &["2020-01-03", "2020-01-03"],
            "Ticker" => &["A", "B"],
            "PredProb" => &[Some(0.7), None],
            "Return_1w" => &[Some(0.01), None]
        )
        .unwrap();

        let observations = dataframe_to_observations(&df, &settings()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].score, 0.7);
        assert!(observations[1].score.is_nan());
        assert_eq!(observations[1].forward_return, None);
    }

    #[test]
    fn test_csv_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("meridian-loader-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "Date,Ticker,Label,Return_1w,Mom,Vol\n\
             2020-01-03,A,1,0.01,0.5,0.2\n\
             2020-01-10,A,0,,0.4,0.1\n",
        )
        .unwrap();

        let df = read_frame(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let dataset = dataframe_to_dataset(&df, &settings()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[1].forward_return, None);
        assert_eq!(dataset.rows()[1].label, Some(0));
    }
}
