#![no_main]
use libfuzzer_sys::fuzz_target;
use tripbench::ingest::parse_str;
use tripbench::record::MIN_FIELDS;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16384 { return; }
    let Ok(text) = std::str::from_utf8(data) else { return };
    let records = parse_str(text, ",");
    // one record per leading line with enough fields
    let leading = text
        .split('\n')
        .take_while(|l| l.split(',').count() >= MIN_FIELDS)
        .count();
    assert_eq!(records.len(), leading);
});
