use weft_app::library::{Dac, DacRate};
use weft_bank::{StreamDirection, StreamManager};
use weft_config::load_config;
use weft_flow::{DataflowGraph, FlowError, Route};
use weft_ir::SignalDb;
use weft_platform::PinBundle;

mod common;

fn dac(db: &mut SignalDb) -> Dac {
    let pins = PinBundle::Compound(vec![
        ("dat_i".into(), db.alloc("dac_dat_i", 16)),
        ("dat_q".into(), db.alloc("dac_dat_q", 16)),
    ]);
    Dac::new(db, &pins, "dac", DacRate::Single).unwrap()
}

#[test]
fn one_writer_per_sink_field() {
    let mut db = SignalDb::new();
    let mut streams = StreamManager::new(16, 4);
    let a = streams.request(&mut db, "a", StreamDirection::FromExternal).unwrap();
    let b = streams.request(&mut db, "b", StreamDirection::FromExternal).unwrap();

    let mut g = DataflowGraph::new();
    let a = g.add_actor(a);
    let b = g.add_actor(b);
    let d = g.add_actor(dac(&mut db));
    g.connect(a, d, Route::new().sink_fields(["i"])).unwrap();
    let err = g.connect(b, d, Route::new().sink_fields(["i"])).unwrap_err();
    assert!(matches!(err, FlowError::PortConflict { ref field, .. } if field == "i"));
    assert_eq!(g.connection_count(), 1);
    g.connect(b, d, Route::new().sink_fields(["q"])).unwrap();
}

#[test]
fn sub_field_width_mismatch() {
    let mut db = SignalDb::new();
    let mut streams = StreamManager::new(8, 4);
    let a = streams.request(&mut db, "a", StreamDirection::FromExternal).unwrap();
    let mut g = DataflowGraph::new();
    let a = g.add_actor(a);
    let d = g.add_actor(dac(&mut db));
    let err = g.connect(a, d, Route::new().sink_fields(["q"])).unwrap_err();
    assert!(matches!(err, FlowError::LayoutMismatch { .. }));
}

#[test]
fn config_loaded_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!("{}{}", common::PLATFORM, common::COLLECTOR_AND_PLAYER);
    std::fs::write(dir.path().join(weft_config::CONFIG_FILE_NAME), text).unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.app.name, "rhino_demo");
    assert_eq!(config.components.len(), 2);
    let app = weft_app::BaseApp::new(config, &weft_app::ComponentRegistry::with_library()).unwrap();
    assert_eq!(app.components().count(), 2);
}
