//! Hand-assembles real `.tsf`-shaped files byte-for-byte (per the wire
//! layout in `container::{chunk_header,page_header}`) and drives the
//! full read path — `FileSeriesReader`, `UnseqResourceMergeReader` and
//! the `SeriesReader` facade together — through the six scenarios.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use tsfile_core::batch_reader::IBatchReader;
use tsfile_core::catalogue::{EndTimeResourceFilter, InMemoryCatalogue, MetadataCatalogue, ResourceFilter};
use tsfile_core::chunk_meta::{ChunkMetaData, LoaderHandle};
use tsfile_core::container::chunk_header::ChunkHeader;
use tsfile_core::container::page_header::PageHeader;
use tsfile_core::decode::EncodingId;
use tsfile_core::file::{index_file, ChunkLoader, FileReaderCache, FileSeriesReader};
use tsfile_core::filter::{And, Filter, TimeFilter, TimeOp, ValueFilter};
use tsfile_core::merge::UnseqResourceMergeReader;
use tsfile_core::modification::{InMemoryModificationStore, Modification};
use tsfile_core::series::SeriesReader;
use tsfile_core::stats::Statistics;
use tsfile_core::types::{DataType, Endianness, Value};

const PATH: &str = "root.g.dev.sensor";

/// Appends one single-page, `Store`-compressed, `Plain`-encoded chunk for
/// `PATH` to `file`, returning its (offset, start_time, end_time).
fn write_chunk(file: &mut File, times: &[i64], values: &[f64]) -> (u64, i64, i64) {
    let mut time_bytes = Vec::new();
    for t in times {
        time_bytes.extend_from_slice(&t.to_le_bytes());
    }
    let mut value_bytes = Vec::new();
    for v in values {
        value_bytes.extend_from_slice(&v.to_le_bytes());
    }
    let mut page_body = Vec::new();
    page_body.extend_from_slice(&(time_bytes.len() as i32).to_le_bytes());
    page_body.extend_from_slice(&time_bytes);
    page_body.extend_from_slice(&value_bytes);

    let mut stats = Statistics::empty(DataType::F64);
    for v in values {
        stats.update(&Value::F64(*v)).unwrap();
    }
    let page_header = PageHeader {
        uncompressed_size: page_body.len() as i32,
        compressed_size: page_body.len() as i32,
        statistics: stats,
        num_points: times.len() as i32,
        max_timestamp: *times.last().unwrap(),
        min_timestamp: times[0],
    };
    let mut body = Vec::new();
    page_header.write_to(&mut body).unwrap();
    body.extend_from_slice(&page_body);

    let offset = file.metadata().unwrap().len();
    let chunk_header = ChunkHeader {
        measurement_uid: PATH.to_string(),
        body_size: body.len() as i32,
        num_pages: 1,
        compression: 0,
        encoding: EncodingId::Plain as u8,
        data_type: DataType::F64,
        endianness: Endianness::Little,
    };
    chunk_header.write_to(&mut *file).unwrap();
    file.write_all(&body).unwrap();
    (offset, times[0], *times.last().unwrap())
}

struct AllowAll;
impl ResourceFilter for AllowAll {
    fn satisfies(&self, _r: &tsfile_core::file::FileResource, _f: Option<&dyn Filter>, _p: &str) -> bool {
        true
    }
}

/// Builds a `FileSeriesReader` over one freshly-written sequential file.
fn sequential_reader(
    path: &std::path::Path,
    filter: Option<Arc<dyn Filter>>,
    loader: Arc<ChunkLoader>,
) -> FileSeriesReader {
    let metas = index_file(path, 1).unwrap();
    let handle = loader.register_file(path, true);
    let metas: Vec<ChunkMetaData> = metas
        .into_iter()
        .map(|mut m| {
            m.loader = handle;
            m
        })
        .collect();
    FileSeriesReader::new(DataType::F64, metas, filter, loader)
}

fn empty_unseq(loader: Arc<ChunkLoader>) -> UnseqResourceMergeReader {
    let catalogue = InMemoryCatalogue::new();
    let mods = InMemoryModificationStore::new();
    UnseqResourceMergeReader::build(
        PATH,
        DataType::F64,
        &[],
        &catalogue,
        &AllowAll,
        &mods,
        None,
        loader,
        10_000,
    )
    .unwrap()
}

fn drain(mut reader: SeriesReader) -> Vec<(i64, Value)> {
    let mut out = Vec::new();
    while reader.has_next_batch().unwrap() {
        let mut batch = reader.next_batch().unwrap();
        while batch.has_next() {
            out.push((batch.current_time(), batch.current_value().clone()));
            batch.advance();
        }
    }
    reader.close();
    out
}

/// Scenario 1 (§8): point lookup, single file, single chunk.
#[test]
fn point_lookup_single_file_single_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.tsf");
    let mut file = File::create(&path).unwrap();
    write_chunk(&mut file, &[1, 2, 3], &[1.1, 2.2, 3.3]);
    drop(file);

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));
    let mut reader = sequential_reader(&path, None, loader);

    assert_eq!(reader.value_at(2).unwrap(), Some(Value::F64(2.2)));
    assert_eq!(reader.value_at(4).unwrap(), None);
    assert_eq!(reader.value_at(5).unwrap(), None);
}

/// Scenario 2 (§8): point lookup across chunks, with a gap between them.
#[test]
fn point_lookup_across_chunks_with_a_gap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.tsf");
    let mut file = File::create(&path).unwrap();
    write_chunk(&mut file, &[1, 5], &[1.0, 5.0]);
    write_chunk(&mut file, &[10, 20], &[10.0, 20.0]);
    drop(file);

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));
    let mut reader = sequential_reader(&path, None, loader);

    assert_eq!(reader.value_at(7).unwrap(), None);
    assert_eq!(reader.value_at(10).unwrap(), Some(Value::F64(10.0)));
}

/// Scenario 3 (§8): scan with a time+value filter; only points with
/// `51 <= t <= 79` survive (values equal their timestamp here).
#[test]
fn scan_with_time_and_value_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.tsf");
    let mut file = File::create(&path).unwrap();
    let times: Vec<i64> = (1..=100).collect();
    let values: Vec<f64> = times.iter().map(|t| *t as f64).collect();
    write_chunk(&mut file, &times[0..50], &values[0..50]);
    write_chunk(&mut file, &times[50..100], &values[50..100]);
    drop(file);

    let filter: Arc<dyn Filter> = Arc::new(And::new(
        Box::new(TimeFilter::new(TimeOp::Gt, 50)),
        Box::new(ValueFilter::new(f64::MIN, 79.0)),
    ));

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));
    let mut seq = sequential_reader(&path, Some(filter), loader.clone());

    let mut out = Vec::new();
    while seq.has_next_batch().unwrap() {
        let mut batch = seq.next_batch().unwrap();
        while batch.has_next() {
            out.push(batch.current_time());
            batch.advance();
        }
    }
    assert_eq!(out, (51..=79).collect::<Vec<_>>());
}

/// Scenario 4 (§8): sequential file S has (10,a),(20,a),(30,a); an
/// unsequential file U with higher priority has (20,b); the facade must
/// emit (10,a),(20,b),(30,a).
#[test]
fn unseq_merge_with_overlap_through_the_series_facade() {
    let dir = tempfile::tempdir().unwrap();
    let seq_path = dir.path().join("seq.tsf");
    let mut seq_file = File::create(&seq_path).unwrap();
    write_chunk(&mut seq_file, &[10, 20, 30], &[10.0, 20.0, 30.0]);
    drop(seq_file);

    let unseq_path = dir.path().join("unseq.tsf");
    let mut unseq_file = File::create(&unseq_path).unwrap();
    let (off, start, end) = write_chunk(&mut unseq_file, &[20], &[20.5]);
    drop(unseq_file);

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));
    let seq_reader = sequential_reader(&seq_path, None, loader.clone());

    let mut catalogue = InMemoryCatalogue::new();
    let mut stats = Statistics::empty(DataType::F64);
    stats.update(&Value::F64(20.5)).unwrap();
    catalogue.insert(
        &unseq_path,
        PATH,
        vec![ChunkMetaData {
            measurement_uid: PATH.to_string(),
            offset: off,
            num_points: 1,
            start_time: start,
            end_time: end,
            data_type: DataType::F64,
            version: 1,
            deleted_at: -1,
            statistics: stats,
            loader: LoaderHandle(0),
            priority: 0,
        }],
    );
    let resources = vec![tsfile_core::file::FileResource::closed(&unseq_path, 1)];
    let mods = InMemoryModificationStore::new();
    let unseq_reader = UnseqResourceMergeReader::build(
        PATH,
        DataType::F64,
        &resources,
        &catalogue,
        &EndTimeResourceFilter,
        &mods,
        None,
        loader,
        10_000,
    )
    .unwrap();

    let series = SeriesReader::new(DataType::F64, Box::new(seq_reader), Box::new(unseq_reader), 10_000);
    let out = drain(series);
    assert_eq!(
        out,
        vec![
            (10, Value::F64(10.0)),
            (20, Value::F64(20.5)),
            (30, Value::F64(30.0)),
        ]
    );
}

/// Scenario 5 (§8): same setup as scenario 4, but a modification deletes
/// `t <= 20` on the sequential file's own version; the point at 10 is
/// gone and the point at 20 on the sequential side is shadowed anyway.
#[test]
fn tombstone_hides_deleted_points_from_the_sequential_side() {
    let dir = tempfile::tempdir().unwrap();
    let seq_path = dir.path().join("seq.tsf");
    let mut seq_file = File::create(&seq_path).unwrap();
    write_chunk(&mut seq_file, &[10, 20, 30], &[10.0, 20.0, 30.0]);
    drop(seq_file);

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));

    // Apply the tombstone to the sequential chunk metadata directly,
    // mirroring "sequential files apply theirs at chunk-metadata load
    // time through the same rule" (§4.9).
    let mut metas = index_file(&seq_path, 1).unwrap();
    let handle = loader.register_file(&seq_path, true);
    let modification = Modification {
        series_path: PATH.to_string(),
        version: 1,
        timestamp_upper_bound: 20,
    };
    tsfile_core::modification::apply_modifications(&mut metas, std::slice::from_ref(&modification));
    for m in &mut metas {
        m.loader = handle;
    }
    let seq_reader = FileSeriesReader::new(DataType::F64, metas, None, loader.clone());

    let unseq_path = dir.path().join("unseq.tsf");
    let mut unseq_file = File::create(&unseq_path).unwrap();
    let (off, start, end) = write_chunk(&mut unseq_file, &[20], &[20.5]);
    drop(unseq_file);

    let mut catalogue = InMemoryCatalogue::new();
    let mut stats = Statistics::empty(DataType::F64);
    stats.update(&Value::F64(20.5)).unwrap();
    catalogue.insert(
        &unseq_path,
        PATH,
        vec![ChunkMetaData {
            measurement_uid: PATH.to_string(),
            offset: off,
            num_points: 1,
            start_time: start,
            end_time: end,
            data_type: DataType::F64,
            version: 1,
            deleted_at: -1,
            statistics: stats,
            loader: LoaderHandle(0),
            priority: 0,
        }],
    );
    let resources = vec![tsfile_core::file::FileResource::closed(&unseq_path, 1)];
    let mods = InMemoryModificationStore::new();
    let unseq_reader = UnseqResourceMergeReader::build(
        PATH,
        DataType::F64,
        &resources,
        &catalogue,
        &EndTimeResourceFilter,
        &mods,
        None,
        loader,
        10_000,
    )
    .unwrap();

    let series = SeriesReader::new(DataType::F64, Box::new(seq_reader), Box::new(unseq_reader), 10_000);
    let out = drain(series);
    assert_eq!(out, vec![(20, Value::F64(20.5)), (30, Value::F64(30.0))]);
}

/// Scenario 6 (§8): a page header whose `Statistics` were serialized
/// using the legacy named-key layout loads with the same min/max/first/
/// last/sum/count as the slot-id encoding of identical content.
#[test]
fn legacy_statistics_layout_decodes_to_the_same_values() {
    let mut slot_id_stats = Statistics::empty(DataType::F64);
    slot_id_stats.update_batch(&[Value::F64(1.0), Value::F64(5.0), Value::F64(3.0)]).unwrap();
    let mut slot_id_bytes = Vec::new();
    slot_id_stats.serialize(&mut slot_id_bytes).unwrap();

    // Legacy layout: count-prefixed (name, length, bytes) entries keyed
    // by "min_value"/"max_value"/"first"/"last"/"sum" instead of slot ids.
    fn legacy_entry(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(name.len() as i32).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }
    let mut legacy_bytes = Vec::new();
    legacy_bytes.extend_from_slice(&5i32.to_le_bytes());
    legacy_bytes.extend_from_slice(&legacy_entry("min_value", &1.0f64.to_le_bytes()));
    legacy_bytes.extend_from_slice(&legacy_entry("max_value", &5.0f64.to_le_bytes()));
    legacy_bytes.extend_from_slice(&legacy_entry("first", &1.0f64.to_le_bytes()));
    legacy_bytes.extend_from_slice(&legacy_entry("last", &3.0f64.to_le_bytes()));
    legacy_bytes.extend_from_slice(&legacy_entry("sum", &9.0f64.to_le_bytes()));
    legacy_bytes.extend_from_slice(&3i32.to_le_bytes()); // count

    let mut slot_id_slice = &slot_id_bytes[..];
    let from_slot_id = Statistics::deserialize(&mut slot_id_slice, DataType::F64).unwrap();
    let mut legacy_slice = &legacy_bytes[..];
    let from_legacy = Statistics::deserialize(&mut legacy_slice, DataType::F64).unwrap();

    assert_eq!(from_slot_id.min(), from_legacy.min());
    assert_eq!(from_slot_id.max(), from_legacy.max());
    assert_eq!(from_slot_id.first(), from_legacy.first());
    assert_eq!(from_slot_id.last(), from_legacy.last());
    assert_eq!(from_slot_id.count(), from_legacy.count());
}

/// Closing an iterator twice is a no-op; calling again after EOF returns
/// an empty batch rather than erroring.
#[test]
fn idempotent_close_and_post_eof_behaviour() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.tsf");
    let mut file = File::create(&path).unwrap();
    write_chunk(&mut file, &[1, 2], &[1.0, 2.0]);
    drop(file);

    let cache = Arc::new(FileReaderCache::new(8));
    let loader = Arc::new(ChunkLoader::new(cache));
    let seq_reader = sequential_reader(&path, None, loader.clone());
    let unseq_reader = empty_unseq(loader);
    let mut series = SeriesReader::new(DataType::F64, Box::new(seq_reader), Box::new(unseq_reader), 10_000);

    assert!(series.has_next_batch().unwrap());
    let batch = series.next_batch().unwrap();
    assert_eq!(batch.len(), 2);

    assert!(!series.has_next_batch().unwrap());
    let empty = series.next_batch().unwrap();
    assert_eq!(empty.len(), 0);

    series.close();
    series.close();
    assert!(matches!(
        series.has_next_batch(),
        Err(tsfile_core::error::TsReadError::Cancelled)
    ));
}
