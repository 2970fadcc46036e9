#![no_main]
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use rpl_engine::wire::{Dao, DaoAck, Dco, Dio, Dis};

fuzz_target!(|data: &[u8]| {
    let buf = Bytes::copy_from_slice(data);
    let _ = Dis::parse(buf.clone());
    let _ = Dio::parse(buf.clone());
    let _ = Dao::parse(buf.clone());
    let _ = DaoAck::parse(buf.clone());
    let _ = Dco::parse(buf);
});
