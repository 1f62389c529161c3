//! Labelled series sharing one axis, written as columnar CSV with the axis as the
//! first column and one column per label (the layout read back with an index column),
//! or as JSON through serde.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use serde::{Deserialize, Serialize};
use crate::error::DataError;


/// An axis (time or frequency) and the series sampled on it, keyed by label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    /// Column name of the axis, for example `t` or `f`
    pub axis_name: String,
    pub axis: Vec<f64>,
    series: Vec<(String, Vec<f64>)>,
}

impl LabeledSeries {
    pub fn new(axis_name: &str, axis: Vec<f64>) -> Self {
        LabeledSeries {
            axis_name: String::from(axis_name),
            axis,
            series: Vec::new(),
        }
    }

    /// Adds a series, it must match the axis length and use a new label
    pub fn push(&mut self, label: &str, values: Vec<f64>) -> Result<(), DataError> {
        if values.len() != self.axis.len() {
            return Err(DataError::MismatchedLengths {
                label: String::from(label),
                expected: self.axis.len(),
                found: values.len(),
            });
        }
        if self.get(label).is_some() || label == self.axis_name {
            return Err(DataError::DuplicateLabel(String::from(label)));
        }

        self.series.push((String::from(label), values));

        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.series.iter()
            .find(|(name, _)| name == label)
            .map(|(_, values)| values.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn num_series(&self) -> usize {
        self.series.len()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DataError> {
        let mut writer = csv::Writer::from_writer(writer);

        writer.write_record(
            std::iter::once(self.axis_name.as_str()).chain(self.labels())
        )?;
        for (i, axis_value) in self.axis.iter().enumerate() {
            writer.write_record(
                std::iter::once(axis_value.to_string())
                    .chain(self.series.iter().map(|(_, values)| values[i].to_string()))
            )?;
        }
        writer.flush()?;

        Ok(())
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::Reader::from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut columns = headers.iter();
        let axis_name = columns.next()
            .ok_or_else(|| DataError::EmptyData(String::from("CSV header")))?;
        let labels: Vec<String> = columns.map(String::from).collect();

        let mut axis = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (column, field) in record.iter().enumerate() {
                let parsed = field.trim().parse::<f64>().map_err(|_| DataError::Parse {
                    context: format!("row {}, column {}", row + 1, column),
                    value: String::from(field),
                })?;

                match column {
                    0 => axis.push(parsed),
                    n => values[n - 1].push(parsed),
                }
            }
        }

        let mut series = LabeledSeries::new(axis_name, axis);
        for (label, column) in labels.iter().zip(values) {
            series.push(label, column)?;
        }

        Ok(series)
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DataError> {
        let file = BufWriter::new(File::create(path)?);

        self.write_csv(file)
    }

    pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let file = BufReader::new(File::open(path)?);

        LabeledSeries::read_csv(file)
    }

    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, DataError> {
        let series: LabeledSeries = serde_json::from_str(content)?;
        for (label, values) in series.iter() {
            if values.len() != series.axis.len() {
                return Err(DataError::MismatchedLengths {
                    label: String::from(label),
                    expected: series.axis.len(),
                    found: values.len(),
                });
            }
        }

        Ok(series)
    }
}
