use std::path::PathBuf;
use std::sync::Arc;

use crate::presentation::cli::{DataTypeArg, TimeOpArg};
use tsfile_core::batch_reader::IBatchReader;
use tsfile_core::catalogue::{EndTimeResourceFilter, InMemoryCatalogue};
use tsfile_core::chunk_meta::ChunkMetaData;
use tsfile_core::error::Result;
use tsfile_core::file::index_file;
use tsfile_core::file::resource::FileResource;
use tsfile_core::file::{ChunkLoader, FileReaderCache, FileSeriesReader};
use tsfile_core::filter::{And, Filter, TimeFilter, TimeOp, ValueFilter};
use tsfile_core::merge::UnseqResourceMergeReader;
use tsfile_core::modification::InMemoryModificationStore;
use tsfile_core::series::SeriesReader;
use tsfile_core::types::{DataType, Value};

fn to_data_type(arg: DataTypeArg) -> DataType {
    match arg {
        DataTypeArg::Bool => DataType::Bool,
        DataTypeArg::I32 => DataType::I32,
        DataTypeArg::I64 => DataType::I64,
        DataTypeArg::F32 => DataType::F32,
        DataTypeArg::F64 => DataType::F64,
        DataTypeArg::Text => DataType::Text,
    }
}

fn to_time_op(arg: TimeOpArg) -> TimeOp {
    match arg {
        TimeOpArg::Gt => TimeOp::Gt,
        TimeOpArg::Ge => TimeOp::Ge,
        TimeOpArg::Lt => TimeOp::Lt,
        TimeOpArg::Le => TimeOp::Le,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn build_filter(
    time_op: Option<TimeOpArg>,
    time_bound: Option<i64>,
    value_lo: Option<f64>,
    value_hi: Option<f64>,
) -> Option<Arc<dyn Filter>> {
    let time: Option<Box<dyn Filter>> = match (time_op, time_bound) {
        (Some(op), Some(bound)) => Some(Box::new(TimeFilter::new(to_time_op(op), bound))),
        _ => None,
    };
    let value: Option<Box<dyn Filter>> = match (value_lo, value_hi) {
        (Some(lo), Some(hi)) => Some(Box::new(ValueFilter::new(lo, hi))),
        _ => None,
    };
    match (time, value) {
        (Some(t), Some(v)) => Some(Arc::new(And::new(t, v)) as Arc<dyn Filter>),
        (Some(t), None) => Some(Arc::from(t)),
        (None, Some(v)) => Some(Arc::from(v)),
        (None, None) => None,
    }
}

/// Indexes every sequential file, keeps only chunks for `series`, and
/// returns them in one globally ascending list — multiple closed
/// sequential files form a single chunk sequence, not separate sources.
fn index_sequential(seq: &[PathBuf], series: &str, loader: &ChunkLoader) -> Result<Vec<ChunkMetaData>> {
    let mut metas = Vec::new();
    for (i, path) in seq.iter().enumerate() {
        let version = i as u64 + 1;
        let handle = loader.register_file(path, true);
        for mut meta in index_file(path, version)? {
            if meta.measurement_uid != series {
                continue;
            }
            meta.loader = handle;
            metas.push(meta);
        }
    }
    metas.sort_by_key(|m| m.start_time);
    Ok(metas)
}

/// Indexes every unsequential file into an `InMemoryCatalogue` plus the
/// `FileResource` list `UnseqResourceMergeReader::build` expects; loader
/// handles are assigned by `build` itself.
fn index_unsequential(unseq: &[PathBuf], series: &str) -> Result<(InMemoryCatalogue, Vec<FileResource>)> {
    let mut catalogue = InMemoryCatalogue::new();
    let mut resources = Vec::new();
    for (i, path) in unseq.iter().enumerate() {
        let version = i as u64 + 1;
        let metas: Vec<ChunkMetaData> = index_file(path, version)?
            .into_iter()
            .filter(|m| m.measurement_uid == series)
            .collect();
        catalogue.insert(path, series, metas);
        resources.push(FileResource::closed(path, version));
    }
    Ok((catalogue, resources))
}

#[allow(clippy::too_many_arguments)]
pub fn handle_scan(
    series: String,
    data_type: DataTypeArg,
    seq: Vec<PathBuf>,
    unseq: Vec<PathBuf>,
    time_op: Option<TimeOpArg>,
    time_bound: Option<i64>,
    value_lo: Option<f64>,
    value_hi: Option<f64>,
    batch_size: usize,
    cache_capacity: usize,
) -> Result<()> {
    let data_type = to_data_type(data_type);
    let filter = build_filter(time_op, time_bound, value_lo, value_hi);

    let cache = Arc::new(FileReaderCache::new(cache_capacity));
    let loader = Arc::new(ChunkLoader::new(cache));

    let seq_metas = index_sequential(&seq, &series, &loader)?;
    let seq_reader: Box<dyn IBatchReader> = Box::new(FileSeriesReader::new(
        data_type,
        seq_metas,
        filter.clone(),
        loader.clone(),
    ));

    let (catalogue, resources) = index_unsequential(&unseq, &series)?;
    let modifications = InMemoryModificationStore::new();
    let unseq_reader: Box<dyn IBatchReader> = Box::new(UnseqResourceMergeReader::build(
        &series,
        data_type,
        &resources,
        &catalogue,
        &EndTimeResourceFilter,
        &modifications,
        filter,
        loader,
        batch_size,
    )?);

    let mut reader = SeriesReader::new(data_type, seq_reader, unseq_reader, batch_size);
    while reader.has_next_batch()? {
        let mut batch = reader.next_batch()?;
        while batch.has_next() {
            println!("{}\t{}", batch.current_time(), format_value(batch.current_value()));
            batch.advance();
        }
    }
    reader.close();
    Ok(())
}

pub fn handle_lookup(
    series: String,
    data_type: DataTypeArg,
    seq: Vec<PathBuf>,
    at: i64,
    cache_capacity: usize,
) -> Result<()> {
    let data_type = to_data_type(data_type);
    let cache = Arc::new(FileReaderCache::new(cache_capacity));
    let loader = Arc::new(ChunkLoader::new(cache));

    let metas = index_sequential(&seq, &series, &loader)?;
    let mut reader = FileSeriesReader::new(data_type, metas, None, loader);

    match reader.value_at(at)? {
        Some(value) => println!("{}\t{}", at, format_value(&value)),
        None => println!("{at}\t(null)"),
    }
    Ok(())
}
