//! End-to-end tests: bytes in, resolved scenes out

mod roundtrip;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::assets::AssetStore;
use crate::core::config::SceneConfig;
use crate::ecs::component_store::ComponentStore;
use crate::scene::{LoadError, LoadSummary, SceneLoader};
use crate::serialization::SerializationContext;

static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fresh directory for one test's files
fn temp_test_dir() -> PathBuf {
    let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("scene_engine_test_{pid}_{nonce}_{seq}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Hand-assembled scene stream
#[derive(Default)]
struct ByteBuilder {
    bytes: Vec<u8>,
}

impl ByteBuilder {
    fn with_header() -> Self {
        let mut builder = Self::default();
        builder.bytes.extend_from_slice(b"SSD");
        builder.bytes.push(1);
        builder
    }

    fn node_begin(mut self, id: u16, parent: u16, name: &str, attributes: u8, children: u8) -> Self {
        self.bytes.push(0xAA);
        self.bytes.extend_from_slice(&id.to_be_bytes());
        self.bytes.extend_from_slice(&parent.to_be_bytes());
        self.bytes.push(1);
        self.name(name);
        self.bytes.push(attributes);
        self.bytes.push(children);
        self
    }

    fn node_end(mut self) -> Self {
        self.bytes.push(0xAB);
        self
    }

    fn floats(mut self, name: &str, values: &[f32]) -> Self {
        self.attribute_begin(name, 3, values.len());
        for value in values {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
        self.bytes.push(0xBB);
        self
    }

    fn uid(mut self, name: &str, value: u32) -> Self {
        self.attribute_begin(name, 8, 1);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.bytes.push(0xBB);
        self
    }

    fn byte(mut self, name: &str, value: u8) -> Self {
        self.attribute_begin(name, 1, 1);
        self.bytes.push(value);
        self.bytes.push(0xBB);
        self
    }

    fn string(mut self, name: &str, value: &str) -> Self {
        self.attribute_begin(name, 7, 1);
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
        self.bytes.push(0xBB);
        self
    }

    fn attribute_begin(&mut self, name: &str, kind: u8, count: usize) {
        self.bytes.push(0xBA);
        self.name(name);
        self.bytes.push(kind);
        self.bytes.extend_from_slice(&u32::try_from(count).unwrap().to_be_bytes());
    }

    fn name(&mut self, name: &str) {
        self.bytes.push(u8::try_from(name.len() + 1).unwrap());
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Stores filled by one in-memory load
struct Loaded {
    summary: LoadSummary,
    components: ComponentStore,
    assets: AssetStore,
}

fn load_bytes(context: &SerializationContext, bytes: &[u8]) -> Result<Loaded, LoadError> {
    let loader = SceneLoader::new(context, SceneConfig::default());
    let mut components = ComponentStore::new();
    let mut assets = AssetStore::new();
    let summary = loader.load_scene_from_reader(bytes, "memory.ssd", &mut components, &mut assets)?;
    Ok(Loaded {
        summary,
        components,
        assets,
    })
}
