//! Parquet corpus archives.
//!
//! The archive is flat: one row per detection, with the parent file's fields
//! repeated and a `file_index` column tying rows to their file. A file without
//! detections is stored as one row whose `common_name` is null.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::detections::{FileDetectionRecord, RawDetection};
use crate::error::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("file_index", DataType::UInt64, false),
        Field::new("site", DataType::Utf8, false),
        Field::new("start", DataType::Utf8, false),
        Field::new("lat", DataType::Float64, true),
        Field::new("lon", DataType::Float64, true),
        Field::new("duration_minutes", DataType::Float64, false),
        Field::new("common_name", DataType::Utf8, true),
        Field::new("confidence", DataType::Float64, true),
        Field::new("offset_seconds", DataType::Float64, true),
    ]))
}

/// Read a Parquet corpus archive.
pub fn read_parquet(path: &Path) -> Result<Vec<FileDetectionRecord>> {
    let read_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::CorpusRead {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(|e| read_err(Box::new(e)))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| read_err(Box::new(e)))?
        .build()
        .map_err(|e| read_err(Box::new(e)))?;

    let mut corpus = Vec::new();
    let mut current: Option<(u64, FileDetectionRecord)> = None;

    for batch in reader {
        let batch = batch.map_err(|e| read_err(Box::new(e)))?;
        let columns = BatchColumns::from_batch(&batch, path)?;

        for row in 0..batch.num_rows() {
            let file_index = columns.file_index.value(row);
            let starts_new_file = current.as_ref().is_none_or(|(idx, _)| *idx != file_index);
            if starts_new_file {
                if let Some((_, finished)) = current.take() {
                    corpus.push(finished);
                }
                current = Some((file_index, columns.file_record(row, path)?));
            }

            if let Some(detection) = columns.detection(row, path)?
                && let Some((_, record)) = current.as_mut()
            {
                record.detections.push(detection);
            }
        }
    }

    if let Some((_, finished)) = current {
        corpus.push(finished);
    }

    Ok(corpus)
}

/// Typed views of one record batch.
struct BatchColumns<'a> {
    file_index: &'a UInt64Array,
    site: &'a StringArray,
    start: &'a StringArray,
    lat: &'a Float64Array,
    lon: &'a Float64Array,
    duration_minutes: &'a Float64Array,
    common_name: &'a StringArray,
    confidence: &'a Float64Array,
    offset_seconds: &'a Float64Array,
}

impl<'a> BatchColumns<'a> {
    fn from_batch(batch: &'a RecordBatch, path: &Path) -> Result<Self> {
        Ok(Self {
            file_index: column(batch, "file_index", path)?,
            site: column(batch, "site", path)?,
            start: column(batch, "start", path)?,
            lat: column(batch, "lat", path)?,
            lon: column(batch, "lon", path)?,
            duration_minutes: column(batch, "duration_minutes", path)?,
            common_name: column(batch, "common_name", path)?,
            confidence: column(batch, "confidence", path)?,
            offset_seconds: column(batch, "offset_seconds", path)?,
        })
    }

    fn file_record(&self, row: usize, path: &Path) -> Result<FileDetectionRecord> {
        let start_text = self.start.value(row);
        let start = NaiveDateTime::parse_from_str(start_text, TIMESTAMP_FORMAT).map_err(|e| {
            Error::InvalidCorpus {
                path: path.to_path_buf(),
                message: format!("row {row}: bad start time '{start_text}': {e}"),
            }
        })?;

        Ok(FileDetectionRecord {
            site: self.site.value(row).to_string(),
            start,
            lat: optional(self.lat, row),
            lon: optional(self.lon, row),
            duration_minutes: self.duration_minutes.value(row),
            detections: Vec::new(),
        })
    }

    fn detection(&self, row: usize, path: &Path) -> Result<Option<RawDetection>> {
        if self.common_name.is_null(row) {
            return Ok(None);
        }

        let (Some(confidence), Some(offset_seconds)) = (
            optional(self.confidence, row),
            optional(self.offset_seconds, row),
        ) else {
            return Err(Error::InvalidCorpus {
                path: path.to_path_buf(),
                message: format!("row {row}: detection without confidence or offset"),
            });
        };

        Ok(Some(RawDetection {
            common_name: self.common_name.value(row).to_string(),
            confidence,
            offset_seconds,
        }))
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|array| array.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::InvalidCorpus {
            path: path.to_path_buf(),
            message: format!("missing or mistyped column '{name}'"),
        })
}

fn optional(array: &Float64Array, row: usize) -> Option<f64> {
    (!array.is_null(row)).then(|| array.value(row))
}

/// Write a corpus as a flat Parquet archive.
pub fn write_parquet(corpus: &[FileDetectionRecord], path: &Path) -> Result<()> {
    let write_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::CorpusWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file_index = Vec::new();
    let mut site = Vec::new();
    let mut start = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let mut duration_minutes = Vec::new();
    let mut common_name: Vec<Option<&str>> = Vec::new();
    let mut confidence = Vec::new();
    let mut offset_seconds = Vec::new();

    for (idx, record) in corpus.iter().enumerate() {
        let start_text = record.start.format(TIMESTAMP_FORMAT).to_string();
        let rows = record.detections.len().max(1);
        for row in 0..rows {
            file_index.push(idx as u64);
            site.push(record.site.as_str());
            start.push(start_text.clone());
            lat.push(record.lat);
            lon.push(record.lon);
            duration_minutes.push(record.duration_minutes);

            let detection = record.detections.get(row);
            common_name.push(detection.map(|d| d.common_name.as_str()));
            confidence.push(detection.map(|d| d.confidence));
            offset_seconds.push(detection.map(|d| d.offset_seconds));
        }
    }

    let schema = schema();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(file_index)),
        Arc::new(StringArray::from(site)),
        Arc::new(StringArray::from(start)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(Float64Array::from(duration_minutes)),
        Arc::new(StringArray::from(common_name)),
        Arc::new(Float64Array::from(confidence)),
        Arc::new(Float64Array::from(offset_seconds)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).map_err(|e| write_err(Box::new(e)))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(path).map_err(|e| write_err(Box::new(e)))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| write_err(Box::new(e)))?;
    writer.write(&batch).map_err(|e| write_err(Box::new(e)))?;
    writer.close().map_err(|e| write_err(Box::new(e)))?;

    Ok(())
}
