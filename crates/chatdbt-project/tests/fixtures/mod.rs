//! Test fixtures for project loading
//!
//! Builds a small compiled dbt project in a temporary directory:
//! - two compiled models, one of them generated by the elementary package
//! - one schema file declaring a model with two columns
//! - a manifest with one project model, one elementary model, one generic
//!   test node and one source

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ORDERS_SQL: &str = "select order_id, customer_id, status\nfrom \"analytics\".\"raw\".\"payments\"\n";

pub const SCHEMA_YML: &str = r#"version: 2

models:
  - name: orders
    description: One row per order.
    columns:
      - name: order_id
        description: Primary key of the order.
      - name: status
        description: Current order status.
"#;

pub const MANIFEST_JSON: &str = r#"{
  "metadata": {
    "dbt_version": "1.7.4",
    "project_name": "shop",
    "adapter_type": "postgres"
  },
  "nodes": {
    "model.shop.orders": {
      "name": "orders",
      "alias": "fct_orders",
      "description": "One row per order.",
      "resource_type": "model",
      "compiled_code": "select order_id, customer_id, status from raw.payments",
      "original_file_path": "models/orders.sql",
      "columns": {
        "order_id": {"name": "order_id", "description": "Primary key of the order.", "data_type": "integer"},
        "customer_id": {"name": "customer_id", "description": null, "data_type": null},
        "status": {"name": "status", "description": "Current order status.", "data_type": "varchar"}
      },
      "depends_on": {
        "nodes": ["model.elementary.edr_runs", "model.shop.deleted_model"],
        "macros": ["macro.dbt.test_not_null", "macro.dbt.is_incremental"]
      }
    },
    "model.elementary.edr_runs": {
      "name": "edr_runs",
      "resource_type": "model",
      "original_file_path": "models/edr/edr_runs.sql",
      "columns": {},
      "depends_on": {"nodes": [], "macros": []}
    },
    "test.shop.not_null_orders_order_id.5c3b1f": {
      "name": "not_null_orders_order_id",
      "resource_type": "test",
      "columns": {},
      "depends_on": {"nodes": ["model.shop.orders"], "macros": ["macro.dbt.test_not_null"]}
    }
  },
  "sources": {
    "source.shop.raw.payments": {
      "name": "payments",
      "source_name": "raw",
      "description": "Stripe payments export.",
      "relation_name": "\"analytics\".\"raw\".\"payments\"",
      "original_file_path": "models/sources.yml",
      "resource_type": "source",
      "columns": {
        "amount": {"name": "amount", "description": "Amount in cents."}
      }
    }
  },
  "macros": {
    "macro.dbt.test_not_null": {"name": "test_not_null"},
    "macro.dbt.is_incremental": {"name": "is_incremental"}
  }
}"#;

/// A compiled dbt project on disk
pub struct ShopProject {
    dir: TempDir,
}

impl ShopProject {
    /// The full fixture project
    pub fn new() -> Self {
        let project = Self::empty();
        project.write("target/compiled/shop/models/orders.sql", ORDERS_SQL);
        project.write("target/compiled/elementary/models/edr/alerts/alerts_dbt_models.sql", "select 1");
        project.write("models/schema.yml", SCHEMA_YML);
        project.write("target/manifest.json", MANIFEST_JSON);
        project
    }

    /// An existing but empty project directory
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, contents).expect("write fixture file");
    }
}
