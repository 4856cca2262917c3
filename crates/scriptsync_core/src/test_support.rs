//! Shared test-only helpers for scriptsync_core.

use crate::history::RedbChangeStore;
use tempfile::TempDir;

/// Creates an isolated on-disk change store and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing file.
///
/// # Panics
/// Panics if temp-dir creation or store initialization fails.
pub(crate) fn setup_temp_store() -> (RedbChangeStore, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let store = RedbChangeStore::new(temp_dir.path().join("history.redb")).expect("store");
    (store, temp_dir)
}

/// A short two-scene script in canonical form.
pub(crate) const TWO_SCENES_XML: &str = r#"<?xml version="1.0"?>
<scenario version="1.0">
<scene_heading uuid="11111111-1111-4111-8111-111111111111"><v><![CDATA[INT. KITCHEN - NIGHT]]></v></scene_heading>
<action><v><![CDATA[The kettle screams.]]></v></action>
<character><v><![CDATA[MAYA]]></v></character>
<dialogue><v><![CDATA[Not again.]]></v></dialogue>
<scene_heading uuid="22222222-2222-4222-8222-222222222222"><v><![CDATA[EXT. GARDEN - DAWN]]></v></scene_heading>
<action><v><![CDATA[Frost on the grass.]]></v></action>
</scenario>
"#;
