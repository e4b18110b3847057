//! Tests for the page codec

use std::sync::Arc;

use serde_json::json;

use crate::memory::{HeapBufferAllocator, PooledBufferAllocator};
use crate::output::PageCollector;
use crate::page::layout::{PageLayout, PAGE_HEADER_SIZE};
use crate::page::{PageBuilder, PageReader};
use crate::types::{Column, ColumnType, Schema, Timestamp, Value};

fn mixed_schema() -> Schema {
    Schema::builder()
        .add("flag", ColumnType::Boolean)
        .add("count", ColumnType::Long)
        .add("ratio", ColumnType::Double)
        .add("label", ColumnType::String)
        .add("payload", ColumnType::Json)
        .add("seen_at", ColumnType::Timestamp)
        .build()
}

fn builder_for(schema: &Schema, page_size: usize) -> (PageBuilder, PageCollector) {
    let collector = PageCollector::new();
    let builder = PageBuilder::new(
        Arc::new(HeapBufferAllocator::with_page_size(page_size)),
        schema.clone(),
        Box::new(collector.clone()),
    );
    (builder, collector)
}

#[test]
fn layout_places_slots_after_record_header() {
    let schema = Schema::builder()
        .add("a", ColumnType::Boolean)
        .add("b", ColumnType::String)
        .add("c", ColumnType::Long)
        .build();
    let layout = PageLayout::new(&schema);

    // 4-byte length + 1-byte bitmap, then 1 + 4 + 8 bytes of slots.
    assert_eq!(layout.record_header_size(), 5);
    assert_eq!(layout.column_offset(0), 5);
    assert_eq!(layout.column_offset(1), 6);
    assert_eq!(layout.column_offset(2), 10);
    assert_eq!(layout.fixed_record_size(), 18);
}

#[test]
fn layout_slot_sizes_match_wire_shape() {
    assert_eq!(ColumnType::Boolean.slot_size(), 1);
    assert_eq!(ColumnType::Long.slot_size(), 8);
    assert_eq!(ColumnType::Double.slot_size(), 8);
    assert_eq!(ColumnType::String.slot_size(), 4);
    assert_eq!(ColumnType::Json.slot_size(), 4);
    assert_eq!(ColumnType::Timestamp.slot_size(), 12);
}

#[test]
fn layout_null_bitmap_rounds_up_to_whole_bytes() {
    assert_eq!(PageLayout::null_bitmap_size_for(1), 1);
    assert_eq!(PageLayout::null_bitmap_size_for(8), 1);
    assert_eq!(PageLayout::null_bitmap_size_for(9), 2);
    assert_eq!(PageLayout::null_bitmap_size_for(16), 2);
    assert_eq!(PageLayout::null_bitmap_size_for(17), 3);
}

#[test]
fn schema_rejects_mismatched_ordinals() {
    let result = Schema::new(vec![Column::new(1, "a", ColumnType::Long)]);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("index"));
}

#[test]
fn schema_builder_assigns_ordinals_in_order() {
    let schema = mixed_schema();
    assert_eq!(schema.column_count(), 6);
    for (position, column) in schema.columns().iter().enumerate() {
        assert_eq!(column.index(), position);
    }
    assert_eq!(schema.column(3).unwrap().name(), "label");
    assert_eq!(
        schema.column(3).unwrap().column_type(),
        ColumnType::String
    );
}

#[test]
fn round_trip_preserves_all_six_types() {
    let schema = mixed_schema();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_boolean(0, true).unwrap();
    builder.set_long(1, -7_000_000_000).unwrap();
    builder.set_double(2, 2.5).unwrap();
    builder.set_string(3, "widgets").unwrap();
    builder
        .set_json(4, json!({"size": 3, "tags": ["a", "b"]}))
        .unwrap();
    builder
        .set_timestamp(5, Timestamp::new(1_700_000_000, 123_456_789))
        .unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.record_count(), 1);

    let mut reader = PageReader::new(&schema, page).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.get_boolean(0).unwrap(), Some(true));
    assert_eq!(record.get_long(1).unwrap(), Some(-7_000_000_000));
    assert_eq!(record.get_double(2).unwrap(), Some(2.5));
    assert_eq!(record.get_string(3).unwrap(), Some("widgets"));
    assert_eq!(
        record.get_json(4).unwrap(),
        Some(&json!({"size": 3, "tags": ["a", "b"]}))
    );
    assert_eq!(
        record.get_timestamp(5).unwrap(),
        Some(Timestamp::new(1_700_000_000, 123_456_789))
    );
    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn unset_columns_read_back_null() {
    let schema = mixed_schema();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(1, 9).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.get_boolean(0).unwrap(), None);
    assert_eq!(record.get_long(1).unwrap(), Some(9));
    assert_eq!(record.get_double(2).unwrap(), None);
    assert_eq!(record.get_string(3).unwrap(), None);
    assert_eq!(record.get_json(4).unwrap(), None);
    assert_eq!(record.get_timestamp(5).unwrap(), None);
}

#[test]
fn commit_resets_staging_for_next_record() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    // Nothing staged for the second record.
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    assert_eq!(
        reader.next_record().unwrap().unwrap().get_long(0).unwrap(),
        Some(1)
    );
    assert_eq!(
        reader.next_record().unwrap().unwrap().get_long(0).unwrap(),
        None
    );
}

#[test]
fn last_write_wins_before_commit() {
    let schema = Schema::builder()
        .add("n", ColumnType::Long)
        .add("s", ColumnType::String)
        .build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(0, 1).unwrap();
    builder.set_long(0, 2).unwrap();
    builder.set_string(1, "first").unwrap();
    builder.set_string(1, "second").unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let page = &pages[0];
    // Only the committed value reaches the reference list.
    assert_eq!(page.string_reference_count(), 1);

    let mut reader = PageReader::new(&schema, page).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.get_long(0).unwrap(), Some(2));
    assert_eq!(record.get_string(1).unwrap(), Some("second"));
}

#[test]
fn set_null_overrides_staged_value() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(0, 5).unwrap();
    builder.set_null(0).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.get_long(0).unwrap(), None);
}

#[test]
fn setter_faults_on_out_of_range_column() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, _collector) = builder_for(&schema, 4096);

    let err = builder.set_long(1, 0).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    let err = builder.set_null(7).unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn setter_faults_on_declared_type_mismatch() {
    let schema = Schema::builder().add("s", ColumnType::String).build();
    let (mut builder, _collector) = builder_for(&schema, 4096);

    let err = builder.set_long(0, 1).unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
    let err = builder.set_value(0, Value::Boolean(true)).unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
}

#[test]
fn getter_faults_on_type_mismatch_and_range() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);
    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert!(record
        .get_string(0)
        .unwrap_err()
        .to_string()
        .contains("type mismatch"));
    assert!(record
        .get_long(1)
        .unwrap_err()
        .to_string()
        .contains("out of range"));
    assert!(record.is_null(3).is_err());
}

#[test]
fn empty_flush_emits_no_page() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.flush().unwrap();
    builder.flush().unwrap();
    assert_eq!(collector.page_count(), 0);

    builder.finish().unwrap();
    assert_eq!(collector.page_count(), 0);
    assert!(collector.is_finished());
}

#[test]
fn finish_emits_pending_records_then_signals_completion() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    for n in 0..3 {
        builder.set_long(0, n).unwrap();
        builder.add_record().unwrap();
    }
    assert_eq!(collector.page_count(), 0);
    builder.finish().unwrap();

    assert!(collector.is_finished());
    let pages = collector.take_pages();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].record_count(), 3);
}

#[test]
fn close_discards_unflushed_records() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    builder.close().unwrap();

    assert_eq!(collector.page_count(), 0);
    assert!(collector.is_closed());
    assert!(!collector.is_finished());
}

#[test]
fn close_after_finish_is_safe() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();
    builder.close().unwrap();
    builder.close().unwrap();

    assert_eq!(collector.page_count(), 1);
    assert!(collector.is_finished());
    assert!(collector.is_closed());
}

#[test]
fn writes_after_finish_fault() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, _collector) = builder_for(&schema, 4096);

    builder.finish().unwrap();
    assert!(builder.set_long(0, 1).is_err());
    assert!(builder.set_null(0).is_err());
    assert!(builder.add_record().is_err());
    assert!(builder.flush().is_err());
    assert!(builder.finish().is_err());
}

#[test]
fn capacity_rotation_splits_records_across_pages() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    // Record is 4 + 1 + 8 = 13 bytes; a 64-byte buffer fits 4 records
    // (4 + 4*13 = 56) before the rotation check trips.
    let (mut builder, collector) = builder_for(&schema, 64);

    for n in 0..10 {
        builder.set_long(0, n).unwrap();
        builder.add_record().unwrap();
    }
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let counts: Vec<usize> = pages.iter().map(|p| p.record_count()).collect();
    assert_eq!(counts, vec![4, 4, 2]);

    let mut seen = Vec::new();
    for page in &pages {
        assert!(page.bytes().len() <= 64);
        let mut reader = PageReader::new(&schema, page).unwrap();
        while let Some(record) = reader.next_record().unwrap() {
            seen.push(record.get_long(0).unwrap().unwrap());
        }
    }
    assert_eq!(seen, (0..10).collect::<Vec<i64>>());
}

#[test]
fn rotation_counts_reference_estimate_against_capacity() {
    let schema = Schema::builder().add("s", ColumnType::String).build();
    // Record is 4 + 1 + 4 = 9 bytes. Without the reference estimate a
    // 128-byte buffer would fit 13 records; the staged string payloads
    // must force rotation much earlier.
    let (mut builder, collector) = builder_for(&schema, 128);

    for _ in 0..12 {
        builder.set_string(0, "a".repeat(16)).unwrap();
        builder.add_record().unwrap();
    }
    builder.finish().unwrap();

    let pages = collector.take_pages();
    assert!(pages.len() > 1);
    let total: usize = pages.iter().map(|p| p.record_count()).sum();
    assert_eq!(total, 12);
}

#[test]
fn reference_indices_are_scoped_per_page() {
    let schema = Schema::builder().add("s", ColumnType::String).build();
    let (mut builder, collector) = builder_for(&schema, 64);

    for n in 0..8 {
        builder.set_string(0, format!("value-{n}")).unwrap();
        builder.add_record().unwrap();
    }
    builder.finish().unwrap();

    let pages = collector.take_pages();
    assert!(pages.len() > 1);
    let mut n = 0;
    for page in &pages {
        // Each page carries exactly the strings its own records committed.
        assert_eq!(page.string_reference_count(), page.record_count());
        let mut reader = PageReader::new(&schema, page).unwrap();
        while let Some(record) = reader.next_record().unwrap() {
            assert_eq!(record.get_string(0).unwrap(), Some(&*format!("value-{n}")));
            n += 1;
        }
    }
    assert_eq!(n, 8);
}

#[test]
fn boolean_string_long_scenario() {
    let schema = Schema::builder()
        .add("a", ColumnType::Boolean)
        .add("b", ColumnType::String)
        .add("c", ColumnType::Long)
        .build();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_boolean(0, true).unwrap();
    builder.set_string(1, "x").unwrap();
    builder.set_long(2, 42).unwrap();
    builder.add_record().unwrap();

    builder.set_long(2, -1).unwrap();
    builder.add_record().unwrap();

    builder.finish().unwrap();

    let pages = collector.take_pages();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.string_reference_count(), 1);

    let mut reader = PageReader::new(&schema, page).unwrap();
    let row1 = reader.next_record().unwrap().unwrap();
    assert_eq!(row1.get_boolean(0).unwrap(), Some(true));
    assert_eq!(row1.get_string(1).unwrap(), Some("x"));
    assert_eq!(row1.get_long(2).unwrap(), Some(42));

    let row2 = reader.next_record().unwrap().unwrap();
    assert_eq!(row2.get_boolean(0).unwrap(), None);
    assert_eq!(row2.get_string(1).unwrap(), None);
    assert_eq!(row2.get_long(2).unwrap(), Some(-1));

    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn reader_faults_on_mismatched_schema() {
    let built_with = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&built_with, 4096);
    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let other = Schema::builder()
        .add("a", ColumnType::Boolean)
        .add("n", ColumnType::Long)
        .build();
    assert!(PageReader::new(&other, &pages[0]).is_err());
}

#[test]
fn set_value_dispatches_and_accepts_null_everywhere() {
    let schema = mixed_schema();
    let (mut builder, collector) = builder_for(&schema, 4096);

    builder.set_value(0, Value::Null).unwrap();
    builder.set_value(1, Value::Long(10)).unwrap();
    builder.set_value(2, Value::Null).unwrap();
    builder.set_value(3, Value::from("moved")).unwrap();
    builder.set_value(4, Value::from(json!([1, 2]))).unwrap();
    builder
        .set_value(5, Value::Timestamp(Timestamp::from_epoch_seconds(77)))
        .unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.get_value(0).unwrap(), Value::Null);
    assert_eq!(record.get_value(1).unwrap(), Value::Long(10));
    assert_eq!(record.get_value(2).unwrap(), Value::Null);
    assert_eq!(record.get_value(3).unwrap(), Value::from("moved"));
    assert_eq!(record.get_value(4).unwrap(), Value::from(json!([1, 2])));
    assert_eq!(
        record.get_value(5).unwrap(),
        Value::Timestamp(Timestamp::from_epoch_seconds(77))
    );
}

#[test]
fn pooled_allocator_recycles_page_buffers() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let allocator = Arc::new(PooledBufferAllocator::new(256, 2));
    let collector = PageCollector::new();
    let mut builder = PageBuilder::new(
        allocator.clone(),
        schema.clone(),
        Box::new(collector.clone()),
    );
    // One buffer accumulating inside the builder.
    assert_eq!(allocator.available(), 1);

    builder.set_long(0, 1).unwrap();
    builder.add_record().unwrap();
    builder.finish().unwrap();

    // Flushed page still owns its buffer; the builder allocated no
    // replacement after finish.
    assert_eq!(allocator.available(), 1);
    let pages = collector.take_pages();
    drop(pages);
    assert_eq!(allocator.available(), 2);

    builder.close().unwrap();
    assert_eq!(allocator.available(), 2);
}

#[test]
fn page_header_record_count_matches_committed_rows() {
    let schema = Schema::builder().add("n", ColumnType::Long).build();
    let (mut builder, collector) = builder_for(&schema, 4096);
    for n in 0..5 {
        builder.set_long(0, n).unwrap();
        builder.add_record().unwrap();
    }
    builder.flush().unwrap();
    builder.finish().unwrap();

    let pages = collector.take_pages();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.record_count(), 5);
    // Truncated to header + 5 committed records of 13 bytes.
    assert_eq!(page.bytes().len(), PAGE_HEADER_SIZE + 5 * 13);
}

#[test]
fn negative_and_fractional_doubles_round_trip() {
    let schema = Schema::builder().add("x", ColumnType::Double).build();
    let (mut builder, collector) = builder_for(&schema, 4096);
    let samples = [-0.0, f64::MIN, f64::MAX, 1.0e-300, 3.125];
    for &x in &samples {
        builder.set_double(0, x).unwrap();
        builder.add_record().unwrap();
    }
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    for &x in &samples {
        let record = reader.next_record().unwrap().unwrap();
        let read = record.get_double(0).unwrap().unwrap();
        assert_eq!(read.to_bits(), x.to_bits());
    }
}

#[test]
fn timestamp_epoch_edges_round_trip() {
    let schema = Schema::builder().add("t", ColumnType::Timestamp).build();
    let (mut builder, collector) = builder_for(&schema, 4096);
    let samples = [
        Timestamp::from_epoch_seconds(0),
        Timestamp::new(-1, 999_999_999),
        Timestamp::new(i64::MAX / 2, 1),
    ];
    for &t in &samples {
        builder.set_timestamp(0, t).unwrap();
        builder.add_record().unwrap();
    }
    builder.finish().unwrap();

    let pages = collector.take_pages();
    let mut reader = PageReader::new(&schema, &pages[0]).unwrap();
    for &t in &samples {
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.get_timestamp(0).unwrap(), Some(t));
    }
}
