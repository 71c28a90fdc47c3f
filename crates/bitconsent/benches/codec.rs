use bitconsent::{Codec, CodecConfig, Field, Record, Schema, Value, VersionMap};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_codec(field_count: usize) -> Codec {
    let mut fields = Vec::with_capacity(field_count + 1);
    fields.push(Field::int("version", 6));

    for i in 0..field_count {
        fields.push(Field::int(format!("f{}", i), 16));
    }

    let schema = Schema::new(fields).unwrap();
    let versions = VersionMap::new().with_schema(1, schema).unwrap();
    Codec::new(versions, CodecConfig::default()).unwrap()
}

fn gen_record(field_count: usize) -> Record {
    let mut record = Record::new();
    record.insert("version".to_string(), Value::Int(1));

    // Values spread across the 16-bit field range.
    for i in 0..field_count {
        record.insert(format!("f{}", i), Value::Int((i * 31 % 65536) as u64));
    }

    record
}

fn bench_codec(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let codec = gen_codec(field_count);
        let record = gen_record(field_count);
        let token = codec.encode(&record).unwrap();

        c.bench_function(&format!("encode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = codec.encode(&record).unwrap();
            })
        });

        c.bench_function(&format!("decode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = codec.decode(&token).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
