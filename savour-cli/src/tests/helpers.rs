//! Fixture databases and output parsing for CLI tests.

use camino::{Utf8Path, Utf8PathBuf};
use savour_data::test_support::{FixtureRestaurant, FixtureReview, write_fixture_database};
use serde_json::Value;
use tempfile::TempDir;

const FIXTURE_EPOCH: i64 = 1_714_000_000;

/// Temporary directory holding a two-restaurant database.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let mut taco = FixtureRestaurant::new("taco", "Taco Shack", 4.5, Some(1));
        taco.tags = "mexican tacos".to_owned();
        let mut ramen = FixtureRestaurant::new("ramen", "Ramen House", 4.7, Some(3));
        ramen.tags = "japanese noodles".to_owned();
        write_fixture_database(
            &root.join("restaurants.db"),
            &[taco, ramen],
            &[
                FixtureReview::new("taco", 5.0, "Great taco al pastor", FIXTURE_EPOCH),
                FixtureReview::new("ramen", 4.0, "Rich ramen broth", FIXTURE_EPOCH),
            ],
        )
        .expect("write fixture database");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("restaurants.db")
    }

    pub(super) fn store(&self) -> Utf8PathBuf {
        self.root.join("embeddings.svem")
    }
}

pub(super) fn parse_output(bytes: &[u8]) -> Value {
    assert!(bytes.ends_with(b"\n"), "output should end with a newline");
    serde_json::from_slice(bytes).expect("output is JSON")
}

pub(super) fn result_ids(output: &Value) -> Vec<String> {
    output
        .as_array()
        .expect("output is a JSON array")
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}
