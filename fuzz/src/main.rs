extern crate afl;
extern crate rpl_engine;

use afl::fuzz;
use bytes::Bytes;
use rpl_engine::wire::{Dao, DaoAck, Dco, Dio, Dis};

fn main() {
    fuzz!(|data: &[u8]| {
        let buf = Bytes::copy_from_slice(data);
        match Dio::parse(buf.clone()) {
            Ok(_) => println!("ok"),
            Err(e) => eprintln!("{:?}", e),
        }
        let _ = Dis::parse(buf.clone());
        let _ = Dao::parse(buf.clone());
        let _ = DaoAck::parse(buf.clone());
        let _ = Dco::parse(buf);
    });
}
