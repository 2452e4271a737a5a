use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// One property value as it appears in `block_states.json`. Mirrors
/// `relic_types::PropertyValue`'s variants but stays a build-time-only
/// shape so this script doesn't need the crate it's building for.
enum RawProp {
    Bool(bool),
    Byte(i8),
    Int(i32),
    Str(String),
}

fn parse_prop(v: &Value) -> RawProp {
    let obj = v.as_object().expect("property value must be an object");
    if let Some(b) = obj.get("bool") {
        RawProp::Bool(b.as_bool().expect("bool property"))
    } else if let Some(b) = obj.get("byte") {
        RawProp::Byte(b.as_i64().expect("byte property") as i8)
    } else if let Some(i) = obj.get("int") {
        RawProp::Int(i.as_i64().expect("int property") as i32)
    } else if let Some(s) = obj.get("string") {
        RawProp::Str(s.as_str().expect("string property").to_owned())
    } else {
        panic!("unrecognized property value shape: {v:?}");
    }
}

fn emit_prop_literal(p: &RawProp) -> String {
    match p {
        RawProp::Bool(b) => format!("RawProp::Bool({b})"),
        RawProp::Byte(b) => format!("RawProp::Byte({b})"),
        RawProp::Int(i) => format!("RawProp::Int({i})"),
        RawProp::Str(s) => format!("RawProp::Str({s:?})"),
    }
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let resources_dir = Path::new(&manifest_dir).join("resources");
    let out_dir = std::env::var("OUT_DIR").unwrap();

    let block_states_path = resources_dir.join("block_states.json");
    let block_id_map_path = resources_dir.join("block_id_map.json");
    let block_state_meta_path = resources_dir.join("block_state_meta_map.json");
    let block_aliases_path = resources_dir.join("block_aliases.json");
    let item_runtime_ids_path = resources_dir.join("item_runtime_ids.json");
    let item_id_map_path = resources_dir.join("item_id_map.json");
    let item_aliases_path = resources_dir.join("item_aliases.json");

    let block_states: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(&block_states_path)
            .unwrap_or_else(|e| panic!("reading {block_states_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {block_states_path:?}: {e}"));

    let block_id_map: BTreeMap<String, i64> = serde_json::from_str(
        &fs::read_to_string(&block_id_map_path)
            .unwrap_or_else(|e| panic!("reading {block_id_map_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {block_id_map_path:?}: {e}"));

    let block_state_meta: Vec<i64> = serde_json::from_str(
        &fs::read_to_string(&block_state_meta_path)
            .unwrap_or_else(|e| panic!("reading {block_state_meta_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {block_state_meta_path:?}: {e}"));

    assert_eq!(
        block_states.len(),
        block_state_meta.len(),
        "block_states.json and block_state_meta_map.json must have the same length \
         (metadata is indexed by modern state position)"
    );

    let block_aliases: BTreeMap<String, String> = serde_json::from_str(
        &fs::read_to_string(&block_aliases_path)
            .unwrap_or_else(|e| panic!("reading {block_aliases_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {block_aliases_path:?}: {e}"));

    let item_runtime_ids: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(&item_runtime_ids_path)
            .unwrap_or_else(|e| panic!("reading {item_runtime_ids_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {item_runtime_ids_path:?}: {e}"));

    let item_id_map: BTreeMap<String, i64> = serde_json::from_str(
        &fs::read_to_string(&item_id_map_path)
            .unwrap_or_else(|e| panic!("reading {item_id_map_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {item_id_map_path:?}: {e}"));

    let item_aliases: BTreeMap<String, String> = serde_json::from_str(
        &fs::read_to_string(&item_aliases_path)
            .unwrap_or_else(|e| panic!("reading {item_aliases_path:?}: {e}")),
    )
    .unwrap_or_else(|e| panic!("parsing {item_aliases_path:?}: {e}"));

    let mut out = fs::File::create(Path::new(&out_dir).join("generated.rs")).unwrap();

    writeln!(out, "// Generated by build.rs from resources/*.json. Do not edit by hand.").unwrap();
    writeln!(out).unwrap();

    // Modern block states, in the order that defines their base runtime ID
    // (before any per-connection custom-block adjustment is applied).
    writeln!(
        out,
        "pub static MODERN_BLOCK_STATES: &[RawState] = &["
    )
    .unwrap();
    for state in &block_states {
        let name = state["name"].as_str().expect("state name");
        let props = state["properties"].as_object().expect("state properties");
        let mut keys: Vec<&String> = props.keys().collect();
        keys.sort();
        write!(out, "    RawState {{ name: {name:?}, properties: &[").unwrap();
        for k in &keys {
            let prop = parse_prop(&props[*k]);
            write!(out, "({k:?}, {}), ", emit_prop_literal(&prop)).unwrap();
        }
        writeln!(out, "] }},").unwrap();
    }
    writeln!(out, "];").unwrap();
    writeln!(out).unwrap();

    // Legacy metadata nibble for each entry in MODERN_BLOCK_STATES, by index.
    writeln!(
        out,
        "pub static LEGACY_META_BY_MODERN_INDEX: &[u8] = &[{}];",
        block_state_meta
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
    .unwrap();
    writeln!(out).unwrap();

    // name -> legacy numeric block ID (0..255). Names absent here have no
    // legacy representation and are dropped when the legacy runtime-ID
    // table is derived.
    writeln!(out, "pub static BLOCK_ID_MAP: &[(&str, i16)] = &[").unwrap();
    for (name, id) in &block_id_map {
        writeln!(out, "    ({name:?}, {id}),").unwrap();
    }
    writeln!(out, "];").unwrap();
    writeln!(out).unwrap();

    // legacy alias name -> updated (modern) name.
    writeln!(out, "pub static BLOCK_ALIASES: &[(&str, &str)] = &[").unwrap();
    for (alias, updated) in &block_aliases {
        writeln!(out, "    ({alias:?}, {updated:?}),").unwrap();
    }
    writeln!(out, "];").unwrap();
    writeln!(out).unwrap();

    // Modern item table: name, runtime ID, whether it's component-based
    // (post-1.16.100 items with no legacy numeric equivalent at all).
    writeln!(
        out,
        "pub static MODERN_ITEMS: &[(&str, i32, bool)] = &["
    )
    .unwrap();
    for item in &item_runtime_ids {
        let name = item["name"].as_str().expect("item name");
        let rid = item["runtime_id"].as_i64().expect("item runtime_id");
        let component_based = item["component_based"]
            .as_bool()
            .expect("item component_based");
        writeln!(out, "    ({name:?}, {rid}, {component_based}),").unwrap();
    }
    writeln!(out, "];").unwrap();
    writeln!(out).unwrap();

    // legacy item name (as carried on the 1.12.x wire) -> legacy numeric ID.
    writeln!(out, "pub static ITEM_ID_MAP: &[(&str, i16)] = &[").unwrap();
    for (name, id) in &item_id_map {
        writeln!(out, "    ({name:?}, {id}),").unwrap();
    }
    writeln!(out, "];").unwrap();
    writeln!(out).unwrap();

    // updated (modern) item name -> legacy-era name, for the handful of
    // items that were renamed between the legacy and modern eras.
    writeln!(out, "pub static ITEM_ALIASES: &[(&str, &str)] = &[").unwrap();
    for (updated, legacy) in &item_aliases {
        writeln!(out, "    ({updated:?}, {legacy:?}),").unwrap();
    }
    writeln!(out, "];").unwrap();

    for path in [
        &block_states_path,
        &block_id_map_path,
        &block_state_meta_path,
        &block_aliases_path,
        &item_runtime_ids_path,
        &item_id_map_path,
        &item_aliases_path,
    ] {
        println!("cargo:rerun-if-changed={}", path.display());
    }
}
