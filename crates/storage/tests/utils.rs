use iptag_primitives::{Marker, Position};
use iptag_storage::{Database, DatabaseSettings, MarkerRead, MarkerStore, MarkerWrite};
use tempfile::TempDir;


pub fn setup_db() -> (Database, TempDir) {
    let db_dir = tempfile::tempdir().unwrap();
    let db = DatabaseSettings::default()
        .with_rocksdb_stats(true)
        .open(db_dir.path())
        .unwrap();
    (db, db_dir)
}


pub fn put_all<S: MarkerStore>(store: &S, markers: &[Marker]) {
    let mut tx = store.transaction();
    for marker in markers {
        tx.put(marker).unwrap();
    }
    tx.commit().unwrap();
}


pub fn positions<R: MarkerRead>(reader: &R) -> Vec<Position> {
    reader.scan(Position::NegInf, Position::PosInf)
        .map(|marker| marker.unwrap().position)
        .collect()
}
